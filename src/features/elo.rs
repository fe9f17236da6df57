//! Elo rating system for team strength estimation
//!
//! Computes dynamic team ratings from match history. Ratings are
//! path-dependent, so results must be applied in chronological order.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{sort_chronologically, MatchRecord, MatchResult};

/// Rating change per unit of surprise
pub const DEFAULT_K_FACTOR: f64 = 20.0;
/// Rating a team carries the first time it is seen
pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;

/// Elo rating configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloConfig {
    /// K-factor: how much ratings change per match
    pub k_factor: f64,
    /// Starting rating for new teams
    pub initial_rating: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        EloConfig {
            k_factor: DEFAULT_K_FACTOR,
            initial_rating: DEFAULT_INITIAL_RATING,
        }
    }
}

/// Elo rating state, owned by whoever drives the replay
#[derive(Debug, Clone)]
pub struct EloRatings {
    ratings: HashMap<String, f64>,
    config: EloConfig,
}

impl Default for EloRatings {
    fn default() -> Self {
        Self::new(EloConfig::default())
    }
}

impl EloRatings {
    pub fn new(config: EloConfig) -> Self {
        EloRatings {
            ratings: HashMap::new(),
            config,
        }
    }

    /// Replay every played match dated strictly before `as_of`
    pub fn replay(matches: &[MatchRecord], as_of: NaiveDate, config: EloConfig) -> Self {
        let mut elo = Self::new(config);
        for record in sort_chronologically(matches) {
            if record.date >= as_of {
                break;
            }
            elo.update(record);
        }
        elo
    }

    /// Get current rating for a team (returns initial if unknown)
    pub fn get_rating(&self, team: &str) -> f64 {
        *self
            .ratings
            .get(team)
            .unwrap_or(&self.config.initial_rating)
    }

    /// Ratings both sides carry into a match. Does not mutate.
    pub fn pre_match_ratings(&self, home: &str, away: &str) -> (f64, f64) {
        (self.get_rating(home), self.get_rating(away))
    }

    /// Expected score (0-1) for the home team
    pub fn expected_score(&self, home: &str, away: &str) -> f64 {
        let (home_rating, away_rating) = self.pre_match_ratings(home, away);
        1.0 / (1.0 + 10.0_f64.powf((away_rating - home_rating) / 400.0))
    }

    /// Update both ratings with a played outcome (call AFTER reading pre-match ratings)
    pub fn apply_result(&mut self, home: &str, away: &str, result: MatchResult) {
        let home_expected = self.expected_score(home, away);
        let home_actual = result.home_score();
        let (home_rating, away_rating) = self.pre_match_ratings(home, away);

        let k = self.config.k_factor;
        let home_new = home_rating + k * (home_actual - home_expected);
        let away_new = away_rating + k * ((1.0 - home_actual) - (1.0 - home_expected));

        self.ratings.insert(home.to_string(), home_new);
        self.ratings.insert(away.to_string(), away_new);
    }

    /// Apply a record if it is a played match. Returns whether ratings changed.
    pub fn update(&mut self, record: &MatchRecord) -> bool {
        if !record.is_played() {
            return false;
        }
        match record.result {
            Some(result) => {
                self.apply_result(&record.home_team, &record.away_team, result);
                true
            }
            None => false,
        }
    }

    /// All rated teams, strongest first (ties by name)
    pub fn ratings(&self) -> Vec<(String, f64)> {
        let mut table: Vec<(String, f64)> = self
            .ratings
            .iter()
            .map(|(team, rating)| (team.clone(), *rating))
            .collect();
        table.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        table
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

/// Elo features for a match
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EloFeatures {
    pub home_elo: f64,
    pub away_elo: f64,
    pub elo_diff: f64,
}

impl EloFeatures {
    pub fn from_ratings(elo: &EloRatings, home: &str, away: &str) -> Self {
        let (home_elo, away_elo) = elo.pre_match_ratings(home, away);
        EloFeatures {
            home_elo,
            away_elo,
            elo_diff: home_elo - away_elo,
        }
    }
}
