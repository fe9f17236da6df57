//! Team form statistics
//!
//! Aggregates over a team's last N played matches before a given date,
//! regardless of venue.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{MatchRecord, Outcome};

/// Canonical number of recent matches in a form window
pub const DEFAULT_FORM_WINDOW: usize = 5;

/// How to average shots-on-target and corners when a row lacks them
///
/// Older seasons in the source data do not carry these columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingStatPolicy {
    /// Count a missing value as 0 and keep the row in the denominator
    #[default]
    Zero,
    /// Average only over rows where the value is present
    Exclude,
}

/// One entry of a team's form window, from that team's perspective
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub date: NaiveDate,
    pub is_home: bool,
    pub opponent: String,
    pub outcome: Outcome,
    pub goals_for: u8,
    pub goals_against: u8,
    pub shots_on_target: Option<u8>,
    pub corners: Option<u8>,
}

impl FormEntry {
    /// Entry for `team`, or None if the match was not played or the team did not play
    pub fn from_match(record: &MatchRecord, team: &str) -> Option<Self> {
        if !record.is_played() {
            return None;
        }
        Some(FormEntry {
            date: record.date,
            is_home: record.is_home(team)?,
            opponent: record.opponent(team)?.to_string(),
            outcome: record.outcome_for(team)?,
            goals_for: record.goals_for(team)?,
            goals_against: record.goals_against(team)?,
            shots_on_target: record.shots_on_target_for(team),
            corners: record.corners_for(team),
        })
    }
}

/// Aggregates over a form window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FormStats {
    /// Matches actually examined (at most the window size)
    pub matches: usize,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub goals_for_avg: f64,
    pub goals_against_avg: f64,
    pub shots_on_target_avg: f64,
    pub corners_avg: f64,
}

impl FormStats {
    pub fn from_entries<'e>(
        entries: impl IntoIterator<Item = &'e FormEntry>,
        policy: MissingStatPolicy,
    ) -> Self {
        let mut acc = FormAccumulator::default();
        for entry in entries {
            acc.add(entry);
        }
        acc.finish(policy)
    }
}

#[derive(Default)]
struct FormAccumulator {
    matches: usize,
    wins: u32,
    draws: u32,
    losses: u32,
    goals_for: u32,
    goals_against: u32,
    shots_on_target: u32,
    shots_rows: usize,
    corners: u32,
    corner_rows: usize,
}

impl FormAccumulator {
    fn add(&mut self, entry: &FormEntry) {
        self.matches += 1;
        match entry.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.goals_for += entry.goals_for as u32;
        self.goals_against += entry.goals_against as u32;
        if let Some(sot) = entry.shots_on_target {
            self.shots_on_target += sot as u32;
            self.shots_rows += 1;
        }
        if let Some(corners) = entry.corners {
            self.corners += corners as u32;
            self.corner_rows += 1;
        }
    }

    fn finish(self, policy: MissingStatPolicy) -> FormStats {
        let (shots_rows, corner_rows) = match policy {
            MissingStatPolicy::Zero => (self.matches, self.matches),
            MissingStatPolicy::Exclude => (self.shots_rows, self.corner_rows),
        };
        FormStats {
            matches: self.matches,
            wins: self.wins,
            draws: self.draws,
            losses: self.losses,
            points: 3 * self.wins + self.draws,
            goals_for_avg: average(self.goals_for, self.matches),
            goals_against_avg: average(self.goals_against, self.matches),
            shots_on_target_avg: average(self.shots_on_target, shots_rows),
            corners_avg: average(self.corners, corner_rows),
        }
    }
}

fn average(total: u32, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Form window queries over an immutable snapshot of match history.
///
/// Only played matches are indexed. Queries take `&self`, so one engine can be
/// shared across threads for batch feature computation.
pub struct FormWindowEngine<'a> {
    /// Played matches per team, ascending by date
    by_team: HashMap<&'a str, Vec<&'a MatchRecord>>,
    policy: MissingStatPolicy,
}

impl<'a> FormWindowEngine<'a> {
    pub fn new(
        matches: impl IntoIterator<Item = &'a MatchRecord>,
        policy: MissingStatPolicy,
    ) -> Self {
        let mut by_team: HashMap<&'a str, Vec<&'a MatchRecord>> = HashMap::new();
        for record in matches.into_iter().filter(|m| m.is_played()) {
            by_team.entry(record.home_team.as_str()).or_default().push(record);
            by_team.entry(record.away_team.as_str()).or_default().push(record);
        }
        for history in by_team.values_mut() {
            history.sort_by(|a, b| a.replay_order(b));
        }
        FormWindowEngine { by_team, policy }
    }

    /// Played matches of `team` strictly before `as_of`, oldest first
    fn history_before(&self, team: &str, as_of: NaiveDate) -> &[&'a MatchRecord] {
        match self.by_team.get(team) {
            Some(history) => {
                let end = history.partition_point(|m| m.date < as_of);
                &history[..end]
            }
            None => &[],
        }
    }

    /// Number of played matches of `team` strictly before `as_of`
    pub fn matches_before(&self, team: &str, as_of: NaiveDate) -> usize {
        self.history_before(team, as_of).len()
    }

    /// The last `window` played matches of `team` strictly before `as_of`
    pub fn window(&self, team: &str, as_of: NaiveDate, window: usize) -> Vec<FormEntry> {
        let history = self.history_before(team, as_of);
        let start = history.len().saturating_sub(window);
        history[start..]
            .iter()
            .filter_map(|m| FormEntry::from_match(m, team))
            .collect()
    }

    /// Form aggregates for `team` as of `as_of` over at most `window` matches
    pub fn stats_for(&self, team: &str, as_of: NaiveDate, window: usize) -> FormStats {
        let entries = self.window(team, as_of, window);
        FormStats::from_entries(&entries, self.policy)
    }
}
