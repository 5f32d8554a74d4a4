#![doc(test(attr(deny(warnings))))]

//! Currency Core provides the virtual-currency layer of an idle game: large
//! scaled numbers, observable per-currency balances, atomic purchases, and
//! snapshot persistence through a pluggable storage adapter.
//!
//! ```
//! use currency_core::{CurrencyLedger, MemoryStorage, ScaledNumber};
//!
//! let mut ledger: CurrencyLedger = CurrencyLedger::new(Box::new(MemoryStorage::new()));
//! ledger.initialize(&[]).unwrap();
//! ledger.add("Coin", ScaledNumber::from(100_i32)).unwrap();
//! assert!(ledger.purchase("Coin", ScaledNumber::from(60_i32)).unwrap());
//! assert_eq!(ledger.get("Coin").unwrap(), ScaledNumber::from(40_i32));
//! ```

pub mod config;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod number;
pub mod purchasable;
pub mod storage;
pub mod utils;

pub use config::{ConfigManager, CurrencyConfig, CurrencyDefinition, ValueKind};
pub use currency::{observer, Balance, CurrencyId, CurrencyKind, CurrencyRecord, Observer};
pub use errors::{CurrencyError, Result};
pub use ledger::{CurrencyLedger, LedgerSnapshot, SharedLedger};
pub use number::{NumberError, ScaledNumber};
pub use purchasable::{ItemDefinition, Purchasable, PurchasableItem};
pub use storage::{JsonFileStorage, MemoryStorage, PersistenceAdapter};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Currency Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
