use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    currency::Balance,
    errors::Result,
    number::ScaledNumber,
    purchasable::ItemDefinition,
    utils::{app_data_dir, write_atomic},
};

/// Tag the ledger persists its snapshot under unless configured otherwise.
pub const DEFAULT_STORAGE_TAG: &str = "VCHandler";

const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "currencies.json";

/// Which initial-value field of a [`CurrencyDefinition`] is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    #[default]
    Int,
    Float,
    BigNumber,
}

/// Authoring-time description of one currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyDefinition<K = String> {
    pub id: K,
    #[serde(default)]
    pub value_kind: ValueKind,
    #[serde(default)]
    pub initial_int: i64,
    #[serde(default)]
    pub initial_float: f64,
    #[serde(default)]
    pub initial_big: ScaledNumber,
}

impl<K> CurrencyDefinition<K> {
    pub fn new(id: K, initial: ScaledNumber) -> Self {
        Self {
            id,
            value_kind: ValueKind::BigNumber,
            initial_int: 0,
            initial_float: 0.0,
            initial_big: initial,
        }
    }

    pub fn int(id: K, initial: i64) -> Self {
        Self {
            id,
            value_kind: ValueKind::Int,
            initial_int: initial,
            initial_float: 0.0,
            initial_big: ScaledNumber::ZERO,
        }
    }

    pub fn float(id: K, initial: f64) -> Self {
        Self {
            id,
            value_kind: ValueKind::Float,
            initial_int: 0,
            initial_float: initial,
            initial_big: ScaledNumber::ZERO,
        }
    }

    /// Starting balance selected by `value_kind`.
    pub fn initial_value<V: Balance>(&self) -> Result<V> {
        let value = match self.value_kind {
            ValueKind::Int => V::try_from_f64(self.initial_int as f64)?,
            ValueKind::Float => V::try_from_f64(self.initial_float)?,
            ValueKind::BigNumber => V::from_scaled(self.initial_big),
        };
        Ok(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig<K = String> {
    #[serde(default = "default_storage_tag")]
    pub storage_tag: String,
    #[serde(default = "Vec::new")]
    pub currencies: Vec<CurrencyDefinition<K>>,
    #[serde(default = "Vec::new")]
    pub catalog: Vec<ItemDefinition<K>>,
}

impl<K> Default for CurrencyConfig<K> {
    fn default() -> Self {
        Self {
            storage_tag: default_storage_tag(),
            currencies: Vec::new(),
            catalog: Vec::new(),
        }
    }
}

fn default_storage_tag() -> String {
    DEFAULT_STORAGE_TAG.to_string()
}

/// Loads and saves [`CurrencyConfig`] documents as JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Manager for `<base>/config/currencies.json`.
    pub fn with_base_dir(base: PathBuf) -> Self {
        Self::new(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn new_default() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config, or returns the default (empty) config when the file
    /// does not exist yet.
    pub fn load<K: DeserializeOwned>(&self) -> Result<CurrencyConfig<K>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no currency config, using defaults");
            return Ok(CurrencyConfig::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: CurrencyConfig<K> = serde_json::from_str(&data)?;
        tracing::debug!(
            path = %self.path.display(),
            currencies = config.currencies.len(),
            items = config.catalog.len(),
            "currency config loaded"
        );
        Ok(config)
    }

    pub fn save<K: Serialize>(&self, config: &CurrencyConfig<K>) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }
}
