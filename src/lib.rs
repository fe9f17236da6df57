//! Football match features
//!
//! Point-in-time Elo ratings and rolling match-form statistics computed from a
//! chronological sequence of football results, for training a match outcome
//! classifier and for featurizing upcoming fixtures.

pub mod data;
pub mod features;
pub mod predict;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::features::elo::EloConfig;
use crate::features::team_stats::{MissingStatPolicy, DEFAULT_FORM_WINDOW};

/// Full-time result of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchResult {
    /// Result code as used by football-data.co.uk (`H`, `D`, `A`)
    pub fn code(&self) -> &'static str {
        match self {
            MatchResult::HomeWin => "H",
            MatchResult::Draw => "D",
            MatchResult::AwayWin => "A",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "H" => Some(MatchResult::HomeWin),
            "D" => Some(MatchResult::Draw),
            "A" => Some(MatchResult::AwayWin),
            _ => None,
        }
    }

    /// Result implied by a final score
    pub fn from_goals(home_goals: u8, away_goals: u8) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchResult::HomeWin,
            std::cmp::Ordering::Less => MatchResult::AwayWin,
            std::cmp::Ordering::Equal => MatchResult::Draw,
        }
    }

    /// Actual score for the home side: 1 = win, 0.5 = draw, 0 = loss
    pub fn home_score(&self) -> f64 {
        match self {
            MatchResult::HomeWin => 1.0,
            MatchResult::Draw => 0.5,
            MatchResult::AwayWin => 0.0,
        }
    }

    /// Outcome from one side's perspective
    pub fn outcome_for(&self, is_home: bool) -> Outcome {
        match (self, is_home) {
            (MatchResult::Draw, _) => Outcome::Draw,
            (MatchResult::HomeWin, true) | (MatchResult::AwayWin, false) => Outcome::Win,
            _ => Outcome::Loss,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::HomeWin => write!(f, "Home Win"),
            MatchResult::Draw => write!(f, "Draw"),
            MatchResult::AwayWin => write!(f, "Away Win"),
        }
    }
}

/// Result of a match from one team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    /// League points: 3 for a win, 1 for a draw
    pub fn points(&self) -> u32 {
        match self {
            Outcome::Win => 3,
            Outcome::Draw => 1,
            Outcome::Loss => 0,
        }
    }
}

/// Role a record can play in feature computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// Has a result and a final score that agree
    Played,
    /// Upcoming fixture: no result and no score
    Scheduled,
    /// Partial or contradictory data; never used
    Malformed(&'static str),
}

/// A single played or scheduled fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub season: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<u8>,
    pub away_goals: Option<u8>,
    pub result: Option<MatchResult>,
    pub home_shots_on_target: Option<u8>,
    pub away_shots_on_target: Option<u8>,
    pub home_corners: Option<u8>,
    pub away_corners: Option<u8>,
}

impl MatchRecord {
    /// A played match with a final score and no optional stats
    pub fn played(
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u8,
        away_goals: u8,
    ) -> Self {
        MatchRecord {
            date,
            season: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals: Some(home_goals),
            away_goals: Some(away_goals),
            result: Some(MatchResult::from_goals(home_goals, away_goals)),
            home_shots_on_target: None,
            away_shots_on_target: None,
            home_corners: None,
            away_corners: None,
        }
    }

    /// An unplayed fixture
    pub fn scheduled(
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        MatchRecord {
            date,
            season: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals: None,
            away_goals: None,
            result: None,
            home_shots_on_target: None,
            away_shots_on_target: None,
            home_corners: None,
            away_corners: None,
        }
    }

    /// Attach shots-on-target and corners
    pub fn with_stats(mut self, shots_on_target: (u8, u8), corners: (u8, u8)) -> Self {
        self.home_shots_on_target = Some(shots_on_target.0);
        self.away_shots_on_target = Some(shots_on_target.1);
        self.home_corners = Some(corners.0);
        self.away_corners = Some(corners.1);
        self
    }

    pub fn status(&self) -> RecordStatus {
        if self.home_team == self.away_team {
            return RecordStatus::Malformed("home and away team are the same");
        }
        match (self.result, self.home_goals, self.away_goals) {
            (Some(result), Some(hg), Some(ag)) => {
                if MatchResult::from_goals(hg, ag) == result {
                    RecordStatus::Played
                } else {
                    RecordStatus::Malformed("result disagrees with score")
                }
            }
            (None, None, None) => RecordStatus::Scheduled,
            (Some(_), _, _) => RecordStatus::Malformed("result without a final score"),
            (None, _, _) => RecordStatus::Malformed("score without a result"),
        }
    }

    pub fn is_played(&self) -> bool {
        self.status() == RecordStatus::Played
    }

    /// Order by date, then home team, then away team.
    ///
    /// This is the tie-break used everywhere matches are replayed, so a table
    /// build, a form window and a live rating replay all see results in the
    /// same order.
    pub fn replay_order(&self, other: &MatchRecord) -> std::cmp::Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.home_team.cmp(&other.home_team))
            .then_with(|| self.away_team.cmp(&other.away_team))
    }

    /// Check if a team was playing at home
    pub fn is_home(&self, team: &str) -> Option<bool> {
        if team == self.home_team {
            Some(true)
        } else if team == self.away_team {
            Some(false)
        } else {
            None
        }
    }

    /// Get the opponent for a given team
    pub fn opponent(&self, team: &str) -> Option<&str> {
        match self.is_home(team)? {
            true => Some(self.away_team.as_str()),
            false => Some(self.home_team.as_str()),
        }
    }

    /// Outcome for a given team, if the match was played and the team took part
    pub fn outcome_for(&self, team: &str) -> Option<Outcome> {
        let is_home = self.is_home(team)?;
        self.result.map(|r| r.outcome_for(is_home))
    }

    /// Goals scored by a specific team
    pub fn goals_for(&self, team: &str) -> Option<u8> {
        if self.is_home(team)? {
            self.home_goals
        } else {
            self.away_goals
        }
    }

    /// Goals conceded by a specific team
    pub fn goals_against(&self, team: &str) -> Option<u8> {
        if self.is_home(team)? {
            self.away_goals
        } else {
            self.home_goals
        }
    }

    pub fn shots_on_target_for(&self, team: &str) -> Option<u8> {
        if self.is_home(team)? {
            self.home_shots_on_target
        } else {
            self.away_shots_on_target
        }
    }

    pub fn corners_for(&self, team: &str) -> Option<u8> {
        if self.is_home(team)? {
            self.home_corners
        } else {
            self.away_corners
        }
    }
}

/// Records in `MatchRecord::replay_order`
pub fn sort_chronologically(matches: &[MatchRecord]) -> Vec<&MatchRecord> {
    let mut sorted: Vec<&MatchRecord> = matches.iter().collect();
    sorted.sort_by(|a, b| a.replay_order(b));
    sorted
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootballError {
    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Insufficient history for {team}: has {matches} played matches")]
    InsufficientHistory { team: String, matches: usize },

    #[error("Malformed record {home} vs {away} on {date}: {reason}")]
    MalformedRecord {
        date: NaiveDate,
        home: String,
        away: String,
        reason: String,
    },

    #[error("Team encoder not found at {0} - run `football features build` first")]
    NoEncoder(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, FootballError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub features: FeatureConfig,
    pub elo: EloConfig,
    pub data: DataConfig,
    /// Extra raw name -> canonical name pairs on top of the built-in table
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of most recent matches in a team's form window, shared by the
    /// table builder and the live builder
    pub form_window: usize,
    pub missing_stats: MissingStatPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            form_window: DEFAULT_FORM_WINDOW,
            missing_stats: MissingStatPolicy::Zero,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub database_path: String,
    pub encoder_path: String,
    pub table_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            database_path: "data/football.db".to_string(),
            encoder_path: "model/team_encoder.json".to_string(),
            table_path: "data/feature_table.csv".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            features: FeatureConfig::default(),
            elo: EloConfig::default(),
            data: DataConfig::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootballError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| FootballError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootballError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.features.form_window == 0 {
            return Err(FootballError::Config(
                "features.form_window must be at least 1".to_string(),
            ));
        }
        if !self.elo.k_factor.is_finite() || self.elo.k_factor <= 0.0 {
            return Err(FootballError::Config(
                "elo.k_factor must be a positive number".to_string(),
            ));
        }
        if !self.elo.initial_rating.is_finite() {
            return Err(FootballError::Config(
                "elo.initial_rating must be a finite number".to_string(),
            ));
        }
        crate::data::teams::TeamNameNormalizer::from_config(self)?;
        Ok(())
    }
}
