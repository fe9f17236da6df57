//! Team name normalization
//!
//! Different feeds spell teams differently ("Man Utd", "Manchester United").
//! Everything is mapped to one canonical name before any rating or form lookup,
//! otherwise a spelling variant becomes a phantom team with its own 1500 start.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Config, FootballError, Result};

/// Built-in alias table: (raw name, canonical name)
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("Arsenal", "Arsenal"),
    ("Villa", "Aston Villa"),
    ("Aston Villa", "Aston Villa"),
    ("AFC Bournemouth", "Bournemouth"),
    ("Bournemouth", "Bournemouth"),
    ("Brentford", "Brentford"),
    ("Brighton & Hove Albion", "Brighton"),
    ("Brighton Hove", "Brighton"),
    ("Brighton", "Brighton"),
    ("Burnley", "Burnley"),
    ("Cardiff City", "Cardiff"),
    ("Cardiff", "Cardiff"),
    ("Chelsea", "Chelsea"),
    ("Palace", "Crystal Palace"),
    ("Crystal Palace", "Crystal Palace"),
    ("Everton", "Everton"),
    ("Fulham", "Fulham"),
    ("Huddersfield Town", "Huddersfield"),
    ("Huddersfield", "Huddersfield"),
    ("Hull City", "Hull"),
    ("Hull", "Hull"),
    ("Ipswich Town", "Ipswich"),
    ("Ipswich", "Ipswich"),
    ("Leeds United", "Leeds"),
    ("Leeds", "Leeds"),
    ("Leicester City", "Leicester"),
    ("Leicester", "Leicester"),
    ("Liverpool", "Liverpool"),
    ("Luton Town", "Luton"),
    ("Luton", "Luton"),
    ("Manchester City", "Man City"),
    ("Man City", "Man City"),
    ("Manchester United", "Man United"),
    ("Man Utd", "Man United"),
    ("Man United", "Man United"),
    ("Middlesbrough", "Middlesbrough"),
    ("Newcastle United", "Newcastle"),
    ("Newcastle", "Newcastle"),
    ("Norwich City", "Norwich"),
    ("Norwich", "Norwich"),
    ("Nottingham Forest", "Nott'm Forest"),
    ("Nottm Forest", "Nott'm Forest"),
    ("Nott'm Forest", "Nott'm Forest"),
    ("Forest", "Nott'm Forest"),
    ("Sheffield Utd", "Sheffield United"),
    ("Sheffield United", "Sheffield United"),
    ("Southampton", "Southampton"),
    ("Stoke City", "Stoke"),
    ("Stoke", "Stoke"),
    ("Sunderland", "Sunderland"),
    ("Swansea City", "Swansea"),
    ("Swansea", "Swansea"),
    ("Tottenham Hotspur", "Tottenham"),
    ("Spurs", "Tottenham"),
    ("Tottenham", "Tottenham"),
    ("Watford", "Watford"),
    ("West Bromwich Albion", "West Brom"),
    ("West Brom", "West Brom"),
    ("West Ham United", "West Ham"),
    ("West Ham", "West Ham"),
    ("Wolverhampton Wanderers", "Wolves"),
    ("Wolverhampton", "Wolves"),
    ("Wolves", "Wolves"),
];

/// Many-to-one mapping from raw team names to canonical names.
///
/// Lookup is case-insensitive. Unknown names pass through unchanged (trimmed);
/// each pass-through is logged and counted.
#[derive(Debug)]
pub struct TeamNameNormalizer {
    /// Lowercased raw name -> canonical name
    aliases: HashMap<String, String>,
    fallbacks: AtomicUsize,
}

impl Default for TeamNameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamNameNormalizer {
    /// Normalizer with the built-in alias table
    pub fn new() -> Self {
        let mut normalizer = TeamNameNormalizer {
            aliases: HashMap::new(),
            fallbacks: AtomicUsize::new(0),
        };
        for (raw, canonical) in DEFAULT_ALIASES {
            normalizer.insert(raw, canonical);
        }
        normalizer
    }

    /// Normalizer with the built-in table plus the config's `[aliases]`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new().with_aliases(
            config
                .aliases
                .iter()
                .map(|(raw, canonical)| (raw.as_str(), canonical.as_str())),
        )
    }

    /// Add aliases on top of the current table.
    ///
    /// An alias may remap a name that is itself canonical, or point at a name
    /// only defined by another alias. Every entry is then re-resolved to its
    /// final canonical name so normalization stays idempotent. Alias cycles
    /// are rejected.
    pub fn with_aliases<'a>(
        mut self,
        aliases: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        for (raw, canonical) in aliases {
            self.aliases
                .insert(raw.trim().to_lowercase(), canonical.trim().to_string());
            self.aliases
                .entry(canonical.trim().to_lowercase())
                .or_insert_with(|| canonical.trim().to_string());
        }

        let mut resolved = HashMap::with_capacity(self.aliases.len());
        for (raw, target) in &self.aliases {
            resolved.insert(raw.clone(), self.resolve(target)?);
        }
        self.aliases = resolved;
        Ok(self)
    }

    fn insert(&mut self, raw: &str, canonical: &str) {
        self.aliases
            .insert(raw.trim().to_lowercase(), canonical.to_string());
        self.aliases
            .entry(canonical.to_lowercase())
            .or_insert_with(|| canonical.to_string());
    }

    /// Follow aliases from `name` until a name that maps to itself
    fn resolve(&self, name: &str) -> Result<String> {
        let mut current = name.to_string();
        let mut seen = HashSet::new();
        loop {
            match self.aliases.get(&current.to_lowercase()) {
                Some(next) if *next == current => return Ok(current),
                Some(next) => {
                    if !seen.insert(current.to_lowercase()) {
                        return Err(FootballError::Config(format!(
                            "Team alias cycle through '{}'",
                            name
                        )));
                    }
                    current = next.clone();
                }
                None => return Ok(current),
            }
        }
    }

    fn lookup(&self, raw: &str) -> Option<String> {
        self.aliases.get(&raw.trim().to_lowercase()).cloned()
    }

    /// Canonical name for `raw`. Total: unknown names are returned trimmed.
    pub fn normalize(&self, raw: &str) -> String {
        match self.lookup(raw) {
            Some(canonical) => canonical,
            None => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                log::warn!("Unmapped team name '{}' passed through unchanged", raw.trim());
                raw.trim().to_string()
            }
        }
    }

    /// Whether `raw` is in the alias table
    pub fn is_known(&self, raw: &str) -> bool {
        self.aliases.contains_key(&raw.trim().to_lowercase())
    }

    /// Number of names passed through unmapped so far
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Every raw name in the table (lowercased)
    pub fn known_names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_aliases() {
        let normalizer = TeamNameNormalizer::new();
        assert_eq!(normalizer.normalize("Man Utd"), "Man United");
        assert_eq!(normalizer.normalize("Manchester United"), "Man United");
        assert_eq!(normalizer.normalize("Nottingham Forest"), "Nott'm Forest");
        assert_eq!(normalizer.normalize("Spurs"), "Tottenham");
        assert_eq!(normalizer.normalize("  wolverhampton wanderers "), "Wolves");
        assert_eq!(normalizer.fallback_count(), 0);
    }

    #[test]
    fn test_unknown_passes_through_and_counts() {
        let normalizer = TeamNameNormalizer::new();
        assert_eq!(normalizer.normalize(" Real Madrid "), "Real Madrid");
        assert_eq!(normalizer.normalize("Barcelona"), "Barcelona");
        assert_eq!(normalizer.fallback_count(), 2);
        assert!(!normalizer.is_known("Barcelona"));
    }

    #[test]
    fn test_idempotent_over_table() {
        let normalizer = TeamNameNormalizer::new();
        let names: Vec<String> = normalizer.known_names().map(str::to_string).collect();
        for name in names {
            let once = normalizer.normalize(&name);
            assert_eq!(normalizer.normalize(&once), once, "not idempotent for {}", name);
        }
        assert_eq!(normalizer.fallback_count(), 0);
    }

    #[test]
    fn test_extra_aliases_resolve_through_table() {
        let normalizer = TeamNameNormalizer::new()
            .with_aliases([("Red Devils", "Manchester United"), ("Saints", "Southampton")])
            .unwrap();
        assert_eq!(normalizer.normalize("Red Devils"), "Man United");
        assert_eq!(normalizer.normalize("saints"), "Southampton");
        assert_eq!(normalizer.normalize(&normalizer.normalize("Red Devils")), "Man United");
    }

    #[test]
    fn test_extra_alias_for_new_team() {
        let normalizer = TeamNameNormalizer::new()
            .with_aliases([("QPR", "Queens Park Rangers")])
            .unwrap();
        assert_eq!(normalizer.normalize("QPR"), "Queens Park Rangers");
        assert_eq!(normalizer.normalize("Queens Park Rangers"), "Queens Park Rangers");
        assert_eq!(normalizer.fallback_count(), 0);
    }

    fn assert_idempotent(normalizer: &TeamNameNormalizer) {
        let names: Vec<String> = normalizer.known_names().map(str::to_string).collect();
        for name in names {
            let once = normalizer.normalize(&name);
            assert_eq!(normalizer.normalize(&once), once, "not idempotent for {}", name);
        }
    }

    #[test]
    fn test_remapping_a_canonical_name_moves_its_aliases() {
        let normalizer = TeamNameNormalizer::new()
            .with_aliases([("Man United", "Red Devils")])
            .unwrap();
        assert_eq!(normalizer.normalize("Man Utd"), "Red Devils");
        assert_eq!(normalizer.normalize("Manchester United"), "Red Devils");
        assert_eq!(normalizer.normalize("Man United"), "Red Devils");
        assert_idempotent(&normalizer);
    }

    #[test]
    fn test_chained_aliases_resolve_in_any_order() {
        for pairs in [
            [("AAA", "ZZZ"), ("ZZZ", "Arsenal")],
            [("ZZZ", "Arsenal"), ("AAA", "ZZZ")],
        ] {
            let normalizer = TeamNameNormalizer::new().with_aliases(pairs).unwrap();
            assert_eq!(normalizer.normalize("AAA"), "Arsenal");
            assert_eq!(normalizer.normalize("ZZZ"), "Arsenal");
            assert_idempotent(&normalizer);
        }
    }

    #[test]
    fn test_alias_cycle_rejected() {
        let result = TeamNameNormalizer::new().with_aliases([("Alpha", "Beta"), ("Beta", "Alpha")]);
        assert!(matches!(result, Err(FootballError::Config(_))));
    }

    #[test]
    fn test_from_config_aliases() {
        let mut config = Config::default();
        config
            .aliases
            .insert("Gunners".to_string(), "Arsenal".to_string());
        let normalizer = TeamNameNormalizer::from_config(&config).unwrap();
        assert_eq!(normalizer.normalize("gunners"), "Arsenal");
        assert_eq!(normalizer.fallback_count(), 0);
    }
}
