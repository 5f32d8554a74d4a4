use serde::{Deserialize, Serialize};

use crate::errors::{CurrencyError, Result};

/// Schema version written into every snapshot blob.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Persisted balances in ledger order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default = "LedgerSnapshot::schema_version_default")]
    pub schema_version: u32,
    #[serde(default)]
    pub entries: Vec<SnapshotEntry>,
}

/// One currency's identifier and encoded balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: String,
    pub value: String,
}

/// How a decoded blob maps onto ledger records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEntries {
    /// Entries addressed by identifier.
    Keyed(Vec<SnapshotEntry>),
    /// Bare values in ledger order; a short list leaves trailing records alone.
    Positional(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Keyed(LedgerSnapshot),
    Positional(Vec<String>),
}

impl LedgerSnapshot {
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            entries,
        }
    }

    pub fn schema_version_default() -> u32 {
        SNAPSHOT_SCHEMA_VERSION
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Decodes a blob written by [`LedgerSnapshot::to_bytes`], or a bare JSON
/// array of transport strings.
pub fn decode(bytes: &[u8]) -> Result<SnapshotEntries> {
    let document: SnapshotDocument = serde_json::from_slice(bytes)
        .map_err(|err| CurrencyError::MalformedSnapshot(err.to_string()))?;
    match document {
        SnapshotDocument::Keyed(snapshot) => {
            if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
                return Err(CurrencyError::MalformedSnapshot(format!(
                    "unsupported schema version {} (latest {})",
                    snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION
                )));
            }
            Ok(SnapshotEntries::Keyed(snapshot.entries))
        }
        SnapshotDocument::Positional(values) => Ok(SnapshotEntries::Positional(values)),
    }
}
