//! SQLite storage for match records

use crate::{MatchRecord, MatchResult, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const MATCH_COLUMNS: &str = "date, season, home_team, away_team, home_goals, away_goals, result,
     home_shots_on_target, away_shots_on_target, home_corners, away_corners";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                season TEXT,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                home_goals INTEGER,
                away_goals INTEGER,
                result TEXT,
                home_shots_on_target INTEGER,
                away_shots_on_target INTEGER,
                home_corners INTEGER,
                away_corners INTEGER,
                UNIQUE(date, home_team, away_team)
            );

            CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
            CREATE INDEX IF NOT EXISTS idx_matches_teams ON matches(home_team, away_team);
            "#,
        )?;
        Ok(())
    }

    // ==================== Match Operations ====================

    /// Insert or update a match record.
    ///
    /// Score and result always take the incoming values, so a fixture that has
    /// since been played is completed in place. Optional stats are only
    /// overwritten when the incoming row carries them.
    pub fn upsert_match(&self, record: &MatchRecord) -> Result<()> {
        Self::upsert_on(&self.conn, record)
    }

    fn upsert_on(conn: &Connection, record: &MatchRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO matches (date, season, home_team, away_team,
                                 home_goals, away_goals, result,
                                 home_shots_on_target, away_shots_on_target,
                                 home_corners, away_corners)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(date, home_team, away_team) DO UPDATE SET
                season = COALESCE(excluded.season, season),
                home_goals = excluded.home_goals,
                away_goals = excluded.away_goals,
                result = excluded.result,
                home_shots_on_target =
                    COALESCE(excluded.home_shots_on_target, home_shots_on_target),
                away_shots_on_target =
                    COALESCE(excluded.away_shots_on_target, away_shots_on_target),
                home_corners = COALESCE(excluded.home_corners, home_corners),
                away_corners = COALESCE(excluded.away_corners, away_corners)
            "#,
            params![
                record.date.format("%Y-%m-%d").to_string(),
                record.season,
                record.home_team,
                record.away_team,
                record.home_goals,
                record.away_goals,
                record.result.map(|r| r.code()),
                record.home_shots_on_target,
                record.away_shots_on_target,
                record.home_corners,
                record.away_corners,
            ],
        )?;
        Ok(())
    }

    /// Insert multiple match records in one transaction
    pub fn upsert_matches(&self, records: &[MatchRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        for record in records {
            Self::upsert_on(&tx, record)?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    /// Get all matches, chronologically
    pub fn get_all_matches(&self) -> Result<Vec<MatchRecord>> {
        let sql = format!(
            "SELECT {} FROM matches ORDER BY date, home_team, away_team",
            MATCH_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let matches = stmt
            .query_map([], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// Get matches for a team
    pub fn get_team_matches(&self, team: &str) -> Result<Vec<MatchRecord>> {
        let sql = format!(
            "SELECT {} FROM matches
             WHERE home_team = ?1 OR away_team = ?1
             ORDER BY date, home_team, away_team",
            MATCH_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let matches = stmt
            .query_map(params![team], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// Get matches before a given date
    pub fn get_matches_before(&self, date: NaiveDate) -> Result<Vec<MatchRecord>> {
        let sql = format!(
            "SELECT {} FROM matches
             WHERE date < ?1
             ORDER BY date, home_team, away_team",
            MATCH_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let matches = stmt
            .query_map(
                params![date.format("%Y-%m-%d").to_string()],
                Self::row_to_match,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        // An unrecognized result code reads back as None; the record is then
        // malformed and the feature builders skip it.
        let result: Option<String> = row.get(6)?;

        Ok(MatchRecord {
            date,
            season: row.get(1)?,
            home_team: row.get(2)?,
            away_team: row.get(3)?,
            home_goals: row.get(4)?,
            away_goals: row.get(5)?,
            result: result.as_deref().and_then(MatchResult::from_code),
            home_shots_on_target: row.get(7)?,
            away_shots_on_target: row.get(8)?,
            home_corners: row.get(9)?,
            away_corners: row.get(10)?,
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let match_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

        let played_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE result IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let team_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM
             (SELECT home_team FROM matches UNION SELECT away_team FROM matches)",
            [],
            |row| row.get(0),
        )?;

        let min_date: Option<String> = self
            .conn
            .query_row("SELECT MIN(date) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_date: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(date) FROM matches WHERE result IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            team_count: team_count as usize,
            match_count: match_count as usize,
            played_count: played_count as usize,
            earliest_match: min_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            latest_result: max_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub match_count: usize,
    pub played_count: usize,
    pub earliest_match: Option<NaiveDate>,
    /// Date of the most recent played match
    pub latest_result: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.team_count, 0);
        assert_eq!(stats.match_count, 0);
        assert!(stats.latest_result.is_none());
    }

    #[test]
    fn test_insert_and_read_back() {
        let db = Database::in_memory().unwrap();
        let mut record =
            MatchRecord::played(date(17), "Man United", "Fulham", 1, 0).with_stats((5, 2), (7, 8));
        record.season = Some("2425".to_string());

        db.upsert_match(&record).unwrap();

        let all = db.get_all_matches().unwrap();
        assert_eq!(all, vec![record]);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.match_count, 1);
        assert_eq!(stats.played_count, 1);
        assert_eq!(stats.team_count, 2);
        assert_eq!(stats.latest_result, Some(date(17)));
    }

    #[test]
    fn test_fixture_completed_in_place() {
        let db = Database::in_memory().unwrap();
        db.upsert_match(&MatchRecord::scheduled(date(24), "Brighton", "Man United"))
            .unwrap();
        assert_eq!(db.get_stats().unwrap().played_count, 0);

        db.upsert_match(&MatchRecord::played(date(24), "Brighton", "Man United", 2, 1))
            .unwrap();

        let all = db.get_all_matches().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].result, Some(MatchResult::HomeWin));
        assert_eq!(all[0].home_goals, Some(2));
    }

    #[test]
    fn test_upsert_keeps_existing_stats() {
        let db = Database::in_memory().unwrap();
        let with_stats =
            MatchRecord::played(date(17), "Arsenal", "Wolves", 2, 0).with_stats((6, 1), (9, 2));
        db.upsert_match(&with_stats).unwrap();
        db.upsert_match(&MatchRecord::played(date(17), "Arsenal", "Wolves", 2, 0))
            .unwrap();

        let all = db.get_all_matches().unwrap();
        assert_eq!(all[0].home_shots_on_target, Some(6));
        assert_eq!(all[0].away_corners, Some(2));
    }

    #[test]
    fn test_bulk_upsert_and_queries() {
        let db = Database::in_memory().unwrap();
        let records = vec![
            MatchRecord::played(date(17), "Arsenal", "Wolves", 2, 0),
            MatchRecord::played(date(24), "Aston Villa", "Arsenal", 0, 2),
            MatchRecord::played(date(31), "Brighton", "Arsenal", 1, 1),
            MatchRecord::played(date(31), "Chelsea", "Wolves", 3, 0),
        ];
        assert_eq!(db.upsert_matches(&records).unwrap(), 4);

        assert_eq!(db.get_team_matches("Arsenal").unwrap().len(), 3);
        assert_eq!(db.get_team_matches("Wolves").unwrap().len(), 2);
        assert_eq!(db.get_matches_before(date(31)).unwrap().len(), 2);

        let all = db.get_all_matches().unwrap();
        assert_eq!(all[2].home_team, "Brighton");
        assert_eq!(all[3].home_team, "Chelsea");
    }
}
