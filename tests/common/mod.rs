#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use currency_core::{
    config::ConfigManager, CurrencyDefinition, CurrencyLedger, JsonFileStorage, MemoryStorage,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Definitions used by most suites: coin 100, gem 5, gold 0.
pub fn starter_definitions() -> Vec<CurrencyDefinition> {
    vec![
        CurrencyDefinition::int("Coin".to_string(), 100),
        CurrencyDefinition::int("Gem".to_string(), 5),
        CurrencyDefinition::int("Gold".to_string(), 0),
    ]
}

/// Initialized ledger over shared in-memory storage.
pub fn memory_ledger(storage: &MemoryStorage) -> CurrencyLedger {
    let mut ledger = CurrencyLedger::new(Box::new(storage.clone()));
    ledger
        .initialize(&starter_definitions())
        .expect("initialize ledger");
    ledger
}

/// Creates isolated file-backed storage and config managers for each test.
pub fn setup_test_env() -> (JsonFileStorage, ConfigManager) {
    let base = temp_root();
    let storage =
        JsonFileStorage::new(Some(base.join("data")), Some(3)).expect("create json storage backend");
    let config_manager = ConfigManager::with_base_dir(base);
    (storage, config_manager)
}
