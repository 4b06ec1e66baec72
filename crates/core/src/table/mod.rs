//! The fixed, cyclic table of display configurations.
//!
//! A configuration picks an ordered subset of the tier list together with a
//! layout token for the presentation layer. The table is validated against a
//! concrete tier list once, before rotation starts; after that every
//! projection is guaranteed to stay in range.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Result, ShowcaseError, Tier};

/// Opaque column-layout token, passed straight through to the presentation
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout(pub String);

impl Layout {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// A named selection drawn from the tier list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Positions into the tier list, in display order.
    pub indices: Vec<usize>,
    pub layout: Layout,
    /// Mode name echoed elsewhere on the page.
    pub name: String,
}

impl Configuration {
    pub fn new(name: impl Into<String>, indices: impl Into<Vec<usize>>, layout: Layout) -> Self {
        Self {
            indices: indices.into(),
            layout,
            name: name.into(),
        }
    }

    /// Materialises the tiers this configuration shows, in configured order.
    ///
    /// Pure projection over the shared list. Indices are expected to have
    /// been checked with [`ConfigurationTable::validate_against`].
    pub fn project<'a>(&self, tiers: &'a [Tier]) -> Vec<&'a Tier> {
        self.indices.iter().filter_map(|&i| tiers.get(i)).collect()
    }
}

/// Non-empty, ordered and cyclic list of configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Configuration>", into = "Vec<Configuration>")]
pub struct ConfigurationTable {
    entries: Vec<Configuration>,
}

impl ConfigurationTable {
    pub fn new(entries: Vec<Configuration>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ShowcaseError::EmptyTable);
        }
        Ok(Self { entries })
    }

    /// The three modes cycled on the billing landing page.
    pub fn billing_demo() -> Self {
        Self {
            entries: vec![
                Configuration::new("Quantum", [0, 1, 2], Layout::new("grid-cols-3")),
                Configuration::new("Abstraction", [1, 2], Layout::new("grid-cols-2")),
                Configuration::new("Web", [0], Layout::new("grid-cols-1")),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Configuration> {
        self.entries.get(index)
    }

    /// Configuration at `index`, wrapping around the end of the table.
    pub fn cyclic(&self, index: usize) -> &Configuration {
        &self.entries[index % self.entries.len()]
    }

    /// Position that follows `index` in the rotation.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.entries.iter()
    }

    /// Rejects the table if any configuration points outside `tiers`.
    pub fn validate_against(&self, tiers: &[Tier]) -> Result<()> {
        if tiers.is_empty() {
            return Err(ShowcaseError::EmptyTiers);
        }

        let mut seen = HashSet::new();
        for tier in tiers {
            if !seen.insert(tier.name.as_str()) {
                return Err(ShowcaseError::DuplicateTier(tier.name.clone()));
            }
        }

        for configuration in &self.entries {
            if let Some(&index) = configuration.indices.iter().find(|&&i| i >= tiers.len()) {
                return Err(ShowcaseError::TierIndexOutOfRange {
                    configuration: configuration.name.clone(),
                    index,
                    tier_count: tiers.len(),
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<Configuration>> for ConfigurationTable {
    type Error = ShowcaseError;

    fn try_from(value: Vec<Configuration>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ConfigurationTable> for Vec<Configuration> {
    fn from(value: ConfigurationTable) -> Self {
        value.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(tiers: &[&'a Tier]) -> Vec<&'a str> {
        tiers.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn projects_tiers_in_configured_order() {
        let tiers = Tier::billing_demo();
        let config = Configuration::new("Reversed", [2, 0], Layout::new("grid-cols-2"));
        assert_eq!(names(&config.project(&tiers)), ["Enterprise", "Standard"]);
    }

    #[test]
    fn rejects_empty_table() {
        let err = ConfigurationTable::new(Vec::new()).unwrap_err();
        assert!(matches!(err, ShowcaseError::EmptyTable));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let tiers = Tier::billing_demo();
        let table = ConfigurationTable::new(vec![Configuration::new(
            "Broken",
            [0, 3],
            Layout::new("grid-cols-2"),
        )])
        .unwrap();

        let err = table.validate_against(&tiers).unwrap_err();
        match err {
            ShowcaseError::TierIndexOutOfRange {
                configuration,
                index,
                tier_count,
            } => {
                assert_eq!(configuration, "Broken");
                assert_eq!(index, 3);
                assert_eq!(tier_count, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_tier_names() {
        let mut tiers = Tier::billing_demo();
        tiers.push(Tier::new("Standard", "Up to 5 users", "59"));
        let err = ConfigurationTable::billing_demo()
            .validate_against(&tiers)
            .unwrap_err();
        assert!(format!("{err}").contains("Standard"));
    }

    #[test]
    fn wraps_around_the_end() {
        let table = ConfigurationTable::billing_demo();
        assert_eq!(table.next_index(2), 0);
        assert_eq!(table.cyclic(4).name, "Abstraction");
    }

    #[test]
    fn deserialising_an_empty_table_fails() {
        let result: std::result::Result<ConfigurationTable, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }
}
