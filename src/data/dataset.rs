//! Historical feature table
//!
//! One chronological pass over the match history. Every row carries only
//! information from matches dated strictly before it: form windows exclude the
//! row's own date, and Elo updates for a date are applied after every row of
//! that date has read its pre-match ratings.

use std::io::Write;
use std::path::Path;

use crate::features::{
    EloConfig, EloFeatures, EloRatings, FeatureVector, FormWindowEngine, TeamEncoder,
    FEATURE_COLUMNS,
};
use crate::{sort_chronologically, FeatureConfig, MatchRecord, RecordStatus, Result};

/// Leading identity columns written before the features
const RECORD_COLUMNS: [&str; 7] = [
    "date",
    "season",
    "home_team",
    "away_team",
    "home_goals",
    "away_goals",
    "result",
];

/// A match and the features known before kickoff
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub record: MatchRecord,
    pub features: FeatureVector,
}

/// Output of a table build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    /// Records excluded for malformed data or a missing team code
    pub skipped: usize,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for played matches only (training targets)
    pub fn played(&self) -> impl Iterator<Item = &FeatureRow> {
        self.rows.iter().filter(|r| r.record.is_played())
    }

    /// Write the table as CSV, record columns first then features
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let header: Vec<&str> = RECORD_COLUMNS
            .iter()
            .chain(FEATURE_COLUMNS.iter())
            .copied()
            .collect();
        csv.write_record(&header)?;

        for row in &self.rows {
            let r = &row.record;
            let mut fields = vec![
                r.date.format("%Y-%m-%d").to_string(),
                r.season.clone().unwrap_or_default(),
                r.home_team.clone(),
                r.away_team.clone(),
                r.home_goals.map(|g| g.to_string()).unwrap_or_default(),
                r.away_goals.map(|g| g.to_string()).unwrap_or_default(),
                r.result.map(|res| res.code().to_string()).unwrap_or_default(),
            ];
            fields.extend(row.features.to_vec().iter().map(|v| v.to_string()));
            csv.write_record(&fields)?;
        }

        csv.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }
}

/// Builds the augmented historical table
pub struct FeatureTableBuilder<'e> {
    features: FeatureConfig,
    elo: EloConfig,
    encoder: &'e TeamEncoder,
}

impl<'e> FeatureTableBuilder<'e> {
    pub fn new(features: FeatureConfig, elo: EloConfig, encoder: &'e TeamEncoder) -> Self {
        FeatureTableBuilder {
            features,
            elo,
            encoder,
        }
    }

    /// Build one row per well-formed record, in chronological order.
    ///
    /// Scheduled fixtures get a row but never update ratings. Malformed
    /// records are logged and counted, then ignored entirely.
    pub fn build(&self, matches: &[MatchRecord]) -> FeatureTable {
        let mut skipped = 0;
        let mut valid: Vec<&MatchRecord> = Vec::with_capacity(matches.len());
        for record in sort_chronologically(matches) {
            if let RecordStatus::Malformed(reason) = record.status() {
                log::warn!(
                    "Skipping {} vs {} on {}: {}",
                    record.home_team,
                    record.away_team,
                    record.date,
                    reason
                );
                skipped += 1;
                continue;
            }
            valid.push(record);
        }

        let form = FormWindowEngine::new(valid.iter().copied(), self.features.missing_stats);
        let mut elo = EloRatings::new(self.elo);
        let mut rows = Vec::with_capacity(valid.len());

        let mut start = 0;
        while start < valid.len() {
            let date = valid[start].date;
            let end = start + valid[start..].iter().take_while(|m| m.date == date).count();
            let group = &valid[start..end];

            for record in group {
                match self.row_for(record, &elo, &form) {
                    Some(row) => rows.push(row),
                    None => skipped += 1,
                }
            }
            for record in group {
                elo.update(record);
            }

            start = end;
        }

        log::info!(
            "Built feature table: {} rows, {} skipped, {} teams rated",
            rows.len(),
            skipped,
            elo.len()
        );

        FeatureTable { rows, skipped }
    }

    fn codes(&self, record: &MatchRecord) -> Result<(u32, u32)> {
        Ok((
            self.encoder.code(&record.home_team)?,
            self.encoder.code(&record.away_team)?,
        ))
    }

    fn row_for(
        &self,
        record: &MatchRecord,
        elo: &EloRatings,
        form: &FormWindowEngine,
    ) -> Option<FeatureRow> {
        let (home_code, away_code) = match self.codes(record) {
            Ok(codes) => codes,
            Err(e) => {
                log::warn!(
                    "Skipping {} vs {} on {}: {}",
                    record.home_team,
                    record.away_team,
                    record.date,
                    e
                );
                return None;
            }
        };

        let window = self.features.form_window;
        let home = form.stats_for(&record.home_team, record.date, window);
        let away = form.stats_for(&record.away_team, record.date, window);
        let elo_features = EloFeatures::from_ratings(elo, &record.home_team, &record.away_team);

        Some(FeatureRow {
            record: record.clone(),
            features: FeatureVector::new(home_code, away_code, elo_features, &home, &away),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchResult;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    fn make_match(day: u32, home: &str, away: &str, hg: u8, ag: u8) -> MatchRecord {
        MatchRecord::played(date(day), home, away, hg, ag)
    }

    fn build(matches: &[MatchRecord]) -> FeatureTable {
        let encoder = TeamEncoder::fit(matches);
        FeatureTableBuilder::new(FeatureConfig::default(), EloConfig::default(), &encoder)
            .build(matches)
    }

    fn scenario() -> Vec<MatchRecord> {
        vec![
            make_match(1, "T1", "T2", 3, 0),
            make_match(2, "T2", "T3", 1, 1),
            make_match(3, "T1", "T3", 0, 2),
        ]
    }

    #[test]
    fn test_scenario_rows() {
        let table = build(&scenario());
        assert_eq!(table.len(), 3);
        assert_eq!(table.skipped, 0);

        let first = &table.rows[0].features;
        assert_eq!(first.home_elo, 1500.0);
        assert_eq!(first.away_elo, 1500.0);
        assert_eq!(first.home_wins, 0.0);

        let second = &table.rows[1].features;
        assert!((second.home_elo - 1490.0).abs() < 1e-9);
        assert_eq!(second.away_elo, 1500.0);
        assert_eq!(second.home_losses, 1.0);
        assert_eq!(second.home_goals_conceded_avg, 3.0);

        let third = &table.rows[2].features;
        assert!((third.home_elo - 1510.0).abs() < 1e-9);
        assert_eq!(third.home_wins, 1.0);
        assert_eq!(third.home_points, 3.0);
        assert_eq!(third.away_draws, 1.0);
        assert_eq!(third.away_points, 1.0);
        assert_eq!(third.points_difference, 2.0);
        assert_eq!(third.home_team_code, 0.0);
        assert_eq!(third.away_team_code, 2.0);
    }

    #[test]
    fn test_same_date_rows_do_not_see_each_other() {
        let matches = vec![
            make_match(1, "A", "B", 2, 0),
            make_match(1, "C", "A", 0, 1),
            make_match(2, "A", "D", 1, 1),
        ];
        let table = build(&matches);

        let a_then_c = table.rows.iter().find(|r| r.record.home_team == "C").unwrap();
        assert_eq!(a_then_c.features.away_elo, 1500.0);
        assert_eq!(a_then_c.features.away_wins, 0.0);

        let day_two = &table.rows[2].features;
        assert_eq!(day_two.home_wins, 2.0);
        assert!(day_two.home_elo > 1510.0);
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let matches = scenario();
        let mut reversed = matches.clone();
        reversed.reverse();
        assert_eq!(build(&matches), build(&reversed));
    }

    #[test]
    fn test_scheduled_fixture_gets_row_without_update() {
        let mut matches = scenario();
        matches.push(MatchRecord::scheduled(date(10), "T2", "T1"));
        matches.push(make_match(11, "T2", "T1", 1, 0));
        let table = build(&matches);

        assert_eq!(table.len(), 5);
        let fixture = &table.rows[3];
        assert!(!fixture.record.is_played());
        let next = &table.rows[4];
        assert_eq!(fixture.features.home_elo, next.features.home_elo);
        assert_eq!(fixture.features.away_points, next.features.away_points);
        assert_eq!(table.played().count(), 4);
    }

    #[test]
    fn test_malformed_records_skipped() {
        let mut matches = scenario();
        let mut bad = make_match(2, "T1", "T4", 2, 0);
        bad.result = Some(MatchResult::AwayWin);
        matches.push(bad);
        matches.push(make_match(2, "T5", "T5", 1, 0));

        let table = build(&matches);
        assert_eq!(table.skipped, 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table, FeatureTable { skipped: 2, ..build(&scenario()) });
    }

    #[test]
    fn test_unencoded_team_skips_row_but_still_rates() {
        let matches = scenario();
        let encoder = TeamEncoder::from_names(["T1", "T3"]);
        let table_builder =
            FeatureTableBuilder::new(FeatureConfig::default(), EloConfig::default(), &encoder);
        let table = table_builder.build(&matches);

        assert_eq!(table.len(), 1);
        assert_eq!(table.skipped, 2);
        assert!((table.rows[0].features.home_elo - 1510.0).abs() < 1e-9);
    }

    #[test]
    fn test_later_results_do_not_change_earlier_rows() {
        let base = scenario();
        let mut changed = base.clone();
        changed[2] = make_match(3, "T1", "T3", 5, 0);
        changed.push(make_match(4, "T2", "T1", 4, 0));

        let a = build(&base);
        let b = build(&changed);
        for (before, after) in a.rows.iter().zip(&b.rows).take(3) {
            assert_eq!(before.features, after.features);
        }
    }

    #[test]
    fn test_write_csv() {
        let mut matches = scenario();
        matches[0].season = Some("2425".to_string());
        matches.push(MatchRecord::scheduled(date(9), "T3", "T2"));
        let table = build(&matches);

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with(
            "date,season,home_team,away_team,home_goals,away_goals,result,home_wins_last_5"
        ));
        assert!(lines[0].ends_with("away_corners_avg"));
        assert!(lines[1].starts_with("2024-08-01,2425,T1,T2,3,0,H,0,"));
        assert!(lines[4].starts_with("2024-08-09,,T3,T2,,,,"));
        assert_eq!(lines[1].split(',').count(), RECORD_COLUMNS.len() + FeatureVector::DIM);
    }
}
