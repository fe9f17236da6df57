//! Fixed-schema feature vector consumed by the outcome classifier

use serde::Serialize;

use crate::features::elo::EloFeatures;
use crate::features::team_stats::FormStats;

/// Column names in the order the classifier was trained with
pub const FEATURE_COLUMNS: [&str; FeatureVector::DIM] = [
    "home_wins_last_5",
    "home_draws_last_5",
    "home_losses_last_5",
    "away_wins_last_5",
    "away_draws_last_5",
    "away_losses_last_5",
    "home_goals_scored_avg",
    "home_goals_conceded_avg",
    "away_goals_scored_avg",
    "away_goals_conceded_avg",
    "home_points_last_5",
    "away_points_last_5",
    "PointsDifference",
    "HomeElo",
    "AwayElo",
    "EloDifference",
    "HomeTeamCode",
    "AwayTeamCode",
    "home_sot_avg",
    "home_corners_avg",
    "away_sot_avg",
    "away_corners_avg",
];

/// Features for one match. Field order matches `FEATURE_COLUMNS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeatureVector {
    #[serde(rename = "home_wins_last_5")]
    pub home_wins: f64,
    #[serde(rename = "home_draws_last_5")]
    pub home_draws: f64,
    #[serde(rename = "home_losses_last_5")]
    pub home_losses: f64,
    #[serde(rename = "away_wins_last_5")]
    pub away_wins: f64,
    #[serde(rename = "away_draws_last_5")]
    pub away_draws: f64,
    #[serde(rename = "away_losses_last_5")]
    pub away_losses: f64,
    pub home_goals_scored_avg: f64,
    pub home_goals_conceded_avg: f64,
    pub away_goals_scored_avg: f64,
    pub away_goals_conceded_avg: f64,
    #[serde(rename = "home_points_last_5")]
    pub home_points: f64,
    #[serde(rename = "away_points_last_5")]
    pub away_points: f64,
    #[serde(rename = "PointsDifference")]
    pub points_difference: f64,
    #[serde(rename = "HomeElo")]
    pub home_elo: f64,
    #[serde(rename = "AwayElo")]
    pub away_elo: f64,
    #[serde(rename = "EloDifference")]
    pub elo_difference: f64,
    #[serde(rename = "HomeTeamCode")]
    pub home_team_code: f64,
    #[serde(rename = "AwayTeamCode")]
    pub away_team_code: f64,
    pub home_sot_avg: f64,
    pub home_corners_avg: f64,
    pub away_sot_avg: f64,
    pub away_corners_avg: f64,
}

impl FeatureVector {
    pub const DIM: usize = 22;

    pub fn new(
        home_code: u32,
        away_code: u32,
        elo: EloFeatures,
        home: &FormStats,
        away: &FormStats,
    ) -> Self {
        FeatureVector {
            home_wins: home.wins as f64,
            home_draws: home.draws as f64,
            home_losses: home.losses as f64,
            away_wins: away.wins as f64,
            away_draws: away.draws as f64,
            away_losses: away.losses as f64,
            home_goals_scored_avg: home.goals_for_avg,
            home_goals_conceded_avg: home.goals_against_avg,
            away_goals_scored_avg: away.goals_for_avg,
            away_goals_conceded_avg: away.goals_against_avg,
            home_points: home.points as f64,
            away_points: away.points as f64,
            points_difference: home.points as f64 - away.points as f64,
            home_elo: elo.home_elo,
            away_elo: elo.away_elo,
            elo_difference: elo.elo_diff,
            home_team_code: home_code as f64,
            away_team_code: away_code as f64,
            home_sot_avg: home.shots_on_target_avg,
            home_corners_avg: home.corners_avg,
            away_sot_avg: away.shots_on_target_avg,
            away_corners_avg: away.corners_avg,
        }
    }

    /// Values in `FEATURE_COLUMNS` order
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.home_wins,
            self.home_draws,
            self.home_losses,
            self.away_wins,
            self.away_draws,
            self.away_losses,
            self.home_goals_scored_avg,
            self.home_goals_conceded_avg,
            self.away_goals_scored_avg,
            self.away_goals_conceded_avg,
            self.home_points,
            self.away_points,
            self.points_difference,
            self.home_elo,
            self.away_elo,
            self.elo_difference,
            self.home_team_code,
            self.away_team_code,
            self.home_sot_avg,
            self.home_corners_avg,
            self.away_sot_avg,
            self.away_corners_avg,
        ]
    }

    /// (column, value) pairs in schema order
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_COLUMNS.iter().copied().zip(self.to_vec()).collect()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.to_vec()[idx])
    }

    /// Values in an arbitrary column order; columns this vector does not
    /// carry are filled with 0
    pub fn reindex<S: AsRef<str>>(&self, columns: &[S]) -> Vec<f64> {
        let values = self.to_vec();
        columns
            .iter()
            .map(|c| {
                FEATURE_COLUMNS
                    .iter()
                    .position(|known| *known == c.as_ref())
                    .map(|idx| values[idx])
                    .unwrap_or(0.0)
            })
            .collect()
    }
}
