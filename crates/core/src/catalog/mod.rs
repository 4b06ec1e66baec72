use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{ConfigurationTable, Result, Tier, TierList};

/// Pricing content loaded once at startup: the tiers and the configuration
/// table that cycles through them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub tiers: Vec<Tier>,
    pub configurations: ConfigurationTable,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::billing_demo()
    }
}

impl Catalog {
    pub fn billing_demo() -> Self {
        Self {
            tiers: Tier::billing_demo(),
            configurations: ConfigurationTable::billing_demo(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.configurations.validate_against(&self.tiers)
    }

    /// Splits the catalog into the shared tier list and the table.
    pub fn into_parts(self) -> Result<(TierList, ConfigurationTable)> {
        self.validate()?;
        let tiers: TierList = Arc::from(self.tiers);
        Ok((tiers, self.configurations))
    }
}
