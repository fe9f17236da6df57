//! Live feature vectors for upcoming fixtures

use chrono::NaiveDate;

use crate::data::teams::TeamNameNormalizer;
use crate::features::{
    EloConfig, EloFeatures, EloRatings, FeatureVector, FormWindowEngine, TeamEncoder,
};
use crate::{Config, FeatureConfig, FootballError, MatchRecord, Result};

/// Feature vector for one fixture, with the names it was resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct LiveFeatures {
    pub home_team: String,
    pub away_team: String,
    pub as_of: NaiveDate,
    pub features: FeatureVector,
}

/// Builds the feature vector for a match that has not been played yet.
///
/// Uses the same form window, missing-stat policy and Elo parameters as the
/// historical table, so a live vector equals the row the table would hold for
/// the same fixture.
pub struct LiveFeatureBuilder {
    normalizer: TeamNameNormalizer,
    encoder: TeamEncoder,
    features: FeatureConfig,
    elo: EloConfig,
}

impl LiveFeatureBuilder {
    pub fn new(
        normalizer: TeamNameNormalizer,
        encoder: TeamEncoder,
        features: FeatureConfig,
        elo: EloConfig,
    ) -> Self {
        LiveFeatureBuilder {
            normalizer,
            encoder,
            features,
            elo,
        }
    }

    /// Builder using the configured alias table and feature parameters
    pub fn from_config(config: &Config, encoder: TeamEncoder) -> Result<Self> {
        let normalizer = TeamNameNormalizer::from_config(config)?;
        Ok(Self::new(normalizer, encoder, config.features, config.elo))
    }

    /// Resolve both teams and compute their features from matches strictly
    /// before `as_of`
    pub fn build(
        &self,
        home_raw: &str,
        away_raw: &str,
        history: &[MatchRecord],
        as_of: NaiveDate,
    ) -> Result<LiveFeatures> {
        let home_team = self.normalizer.normalize(home_raw);
        let away_team = self.normalizer.normalize(away_raw);
        if home_team == away_team {
            return Err(FootballError::MalformedRecord {
                date: as_of,
                home: home_team,
                away: away_team,
                reason: "home and away team are the same".to_string(),
            });
        }

        let home_code = self.encoder.code(&home_team)?;
        let away_code = self.encoder.code(&away_team)?;

        let form = FormWindowEngine::new(history, self.features.missing_stats);
        for team in [&home_team, &away_team] {
            let matches = form.matches_before(team, as_of);
            if matches == 0 {
                return Err(FootballError::InsufficientHistory {
                    team: team.clone(),
                    matches,
                });
            }
        }

        let elo = EloRatings::replay(history, as_of, self.elo);
        let elo_features = EloFeatures::from_ratings(&elo, &home_team, &away_team);

        let window = self.features.form_window;
        let home = form.stats_for(&home_team, as_of, window);
        let away = form.stats_for(&away_team, as_of, window);

        log::debug!(
            "{} ({:.1}) vs {} ({:.1}) as of {}: form over {} and {} matches",
            home_team,
            elo_features.home_elo,
            away_team,
            elo_features.away_elo,
            as_of,
            home.matches,
            away.matches
        );

        Ok(LiveFeatures {
            features: FeatureVector::new(home_code, away_code, elo_features, &home, &away),
            home_team,
            away_team,
            as_of,
        })
    }

    /// Feature vector for `home_raw` vs `away_raw` as of `as_of`
    pub fn build_vector(
        &self,
        home_raw: &str,
        away_raw: &str,
        history: &[MatchRecord],
        as_of: NaiveDate,
    ) -> Result<FeatureVector> {
        self.build(home_raw, away_raw, history, as_of)
            .map(|live| live.features)
    }
}

/// Format live features for display
pub fn format_features(live: &LiveFeatures) -> String {
    let f = &live.features;
    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}  (as of {})
├─────────────────────────────────────────────────┤
│  Elo:          {:.1} - {:.1}  (diff {:+.1})
│  Form (W-D-L): {}-{}-{} / {}-{}-{}
│  Points:       {} - {}  (diff {:+})
│  Goals for:    {:.2} - {:.2}
│  Goals agst:   {:.2} - {:.2}
│  Shots on tgt: {:.2} - {:.2}
│  Corners:      {:.2} - {:.2}
│  Team codes:   {} - {}
└─────────────────────────────────────────────────┘
"#,
        live.home_team,
        live.away_team,
        live.as_of,
        f.home_elo,
        f.away_elo,
        f.elo_difference,
        f.home_wins,
        f.home_draws,
        f.home_losses,
        f.away_wins,
        f.away_draws,
        f.away_losses,
        f.home_points,
        f.away_points,
        f.points_difference,
        f.home_goals_scored_avg,
        f.away_goals_scored_avg,
        f.home_goals_conceded_avg,
        f.away_goals_conceded_avg,
        f.home_sot_avg,
        f.away_sot_avg,
        f.home_corners_avg,
        f.away_corners_avg,
        f.home_team_code,
        f.away_team_code,
    )
}
