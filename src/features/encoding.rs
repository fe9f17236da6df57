//! Team identity encoding
//!
//! Maps canonical team names to the integer codes the downstream classifier
//! was trained with. Fitted once from history and then reused unchanged.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{FootballError, MatchRecord, Result};

/// Label encoder over canonical team names: code = index in sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEncoder {
    classes: Vec<String>,
}

impl TeamEncoder {
    /// Fit from every team appearing in the records (played or scheduled)
    pub fn fit(matches: &[MatchRecord]) -> Self {
        Self::from_names(
            matches
                .iter()
                .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()]),
        )
    }

    pub fn from_names<'n>(names: impl IntoIterator<Item = &'n str>) -> Self {
        let mut classes: Vec<String> = names.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        TeamEncoder { classes }
    }

    /// Integer code for a canonical name. Never invents a code for unseen names.
    pub fn code(&self, team: &str) -> Result<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(team))
            .map(|idx| idx as u32)
            .map_err(|_| FootballError::UnknownTeam(team.to_string()))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Load a previously fitted encoder
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FootballError::NoEncoder(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let encoder: TeamEncoder = serde_json::from_str(&content)?;
        log::debug!("Loaded team encoder with {} teams from {}", encoder.len(), path.display());
        Ok(encoder)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
