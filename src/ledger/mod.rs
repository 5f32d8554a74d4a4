//! The currency ledger: balances, purchases, and snapshot persistence.

pub mod snapshot;

use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{Arc, Mutex},
};

use tracing::{debug, info, warn};

use crate::{
    config::{CurrencyConfig, CurrencyDefinition, DEFAULT_STORAGE_TAG},
    currency::{Balance, CurrencyId, CurrencyRecord, Observer},
    errors::{CurrencyError, Result},
    number::ScaledNumber,
    purchasable::Purchasable,
    storage::PersistenceAdapter,
};

pub use snapshot::{LedgerSnapshot, SnapshotEntries, SnapshotEntry, SNAPSHOT_SCHEMA_VERSION};

/// Ledger handle for hosts that touch currencies from more than one thread.
/// Every entry point goes through the one mutex, which keeps `purchase`
/// atomic.
pub type SharedLedger<K = String, V = ScaledNumber> = Arc<Mutex<CurrencyLedger<K, V>>>;

/// Registry owning every currency balance.
///
/// The set of currencies is fixed by [`CurrencyLedger::initialize`]; after
/// that only balances change. Records keep their definition order, which is
/// also the order snapshots are written in.
pub struct CurrencyLedger<K: CurrencyId = String, V: Balance = ScaledNumber> {
    records: Vec<CurrencyRecord<K, V>>,
    index: HashMap<K, usize>,
    storage: Box<dyn PersistenceAdapter>,
    tag: String,
    initialized: bool,
}

impl<K: CurrencyId, V: Balance> CurrencyLedger<K, V> {
    pub fn new(storage: Box<dyn PersistenceAdapter>) -> Self {
        Self::with_tag(storage, DEFAULT_STORAGE_TAG)
    }

    pub fn with_tag(storage: Box<dyn PersistenceAdapter>, tag: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            storage,
            tag: tag.into(),
            initialized: false,
        }
    }

    /// Builds a ledger persisting under the configured tag and initializes it
    /// from the configured currencies.
    pub fn from_config(
        config: &CurrencyConfig<K>,
        storage: Box<dyn PersistenceAdapter>,
    ) -> Result<Self> {
        let mut ledger = Self::with_tag(storage, config.storage_tag.clone());
        ledger.initialize(&config.currencies)?;
        Ok(ledger)
    }

    pub fn storage_tag(&self) -> &str {
        &self.tag
    }

    pub fn storage(&self) -> &dyn PersistenceAdapter {
        self.storage.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Creates one record per definition, in order, then restores any
    /// persisted balances over the initial values.
    ///
    /// Definitions with a blank identifier are skipped; when none remain the
    /// built-in currency set is created at zero. Repeated
    /// identifiers keep their first definition. Calling this again is a no-op
    /// until [`CurrencyLedger::reset`].
    pub fn initialize(&mut self, definitions: &[CurrencyDefinition<K>]) -> Result<()> {
        if self.initialized {
            debug!(tag = %self.tag, "currency ledger already initialized");
            return Ok(());
        }

        let mut seeds: Vec<(K, V)> = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if definition.id.to_string().trim().is_empty() {
                warn!("skipping currency definition with an empty identifier");
                continue;
            }
            seeds.push((definition.id.clone(), definition.initial_value::<V>()?));
        }
        if seeds.is_empty() {
            if !definitions.is_empty() {
                warn!("no usable currency definitions, using the built-in set");
            }
            seeds = K::builtin_set()
                .into_iter()
                .map(|id| (id, V::zero()))
                .collect();
        }

        let mut records = Vec::with_capacity(seeds.len());
        let mut index = HashMap::with_capacity(seeds.len());
        for (id, value) in seeds {
            if index.contains_key(&id) {
                warn!(currency = %id, "duplicate currency definition ignored");
                continue;
            }
            index.insert(id.clone(), records.len());
            records.push(CurrencyRecord::new(id, value));
        }

        self.records = records;
        self.index = index;
        self.initialized = true;
        info!(
            tag = %self.tag,
            currencies = self.records.len(),
            "currency ledger initialized"
        );

        self.restore();
        Ok(())
    }

    /// Drops every record and subscriber so the ledger can be initialized
    /// again.
    pub fn reset(&mut self) {
        self.records.clear();
        self.index.clear();
        self.initialized = false;
        debug!(tag = %self.tag, "currency ledger reset");
    }

    fn restore(&mut self) {
        match self.storage.get(&self.tag) {
            Ok(Some(bytes)) => {
                let applied = self.load_all(&bytes);
                info!(tag = %self.tag, applied, "restored persisted balances");
            }
            Ok(None) => debug!(tag = %self.tag, "no persisted balances"),
            Err(err) => warn!(tag = %self.tag, error = %err, "could not read persisted balances"),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &K> + '_ {
        self.records.iter().map(CurrencyRecord::id)
    }

    pub fn records(&self) -> &[CurrencyRecord<K, V>] {
        &self.records
    }

    pub fn record<Q>(&self, id: &Q) -> Result<&CurrencyRecord<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let position = self.position(id)?;
        Ok(&self.records[position])
    }

    fn record_mut<Q>(&mut self, id: &Q) -> Result<&mut CurrencyRecord<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let position = self.position(id)?;
        Ok(&mut self.records[position])
    }

    fn position<Q>(&self, id: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| CurrencyError::unknown(&id))
    }

    pub fn get<Q>(&self, id: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        Ok(self.record(id)?.balance())
    }

    /// Balance of `id`, or zero when the currency is unknown.
    pub fn value_or_zero<Q>(&self, id: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.get(id).unwrap_or_else(|_| V::zero())
    }

    pub fn get_f64<Q>(&self, id: &Q) -> Result<f64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        Ok(self.get(id)?.as_f64())
    }

    /// Balance truncated toward zero, saturating at the `i64` bounds.
    pub fn get_i64<Q>(&self, id: &Q) -> Result<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        Ok(self.get_f64(id)? as i64)
    }

    /// Replaces the balance of `id` and notifies its observers.
    pub fn set<Q>(&mut self, id: &Q, value: V) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let record = self.record_mut(id)?;
        record.set_balance(value);
        debug!(currency = %record.id(), balance = ?value, "balance set");
        Ok(())
    }

    pub fn set_raw<Q>(&mut self, id: &Q, value: f64) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let value = V::try_from_f64(value)?;
        self.set(id, value)
    }

    /// Adds `delta` to the balance of `id` and returns the new balance.
    pub fn add<Q>(&mut self, id: &Q, delta: V) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let record = self.record_mut(id)?;
        let updated = record.balance() + delta;
        record.set_balance(updated);
        debug!(currency = %record.id(), delta = ?delta, balance = ?updated, "balance adjusted");
        Ok(updated)
    }

    pub fn add_raw<Q>(&mut self, id: &Q, delta: f64) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let delta = V::try_from_f64(delta)?;
        self.add(id, delta)
    }

    /// Subscribes `observer` to `id`; it is called right away with the current
    /// balance and again after every change.
    pub fn subscribe<Q>(&mut self, id: &Q, observer: Observer<K, V>) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.record_mut(id)?.subscribe(observer);
        Ok(())
    }

    /// Returns whether `observer` was subscribed to `id`.
    pub fn unsubscribe<Q>(&mut self, id: &Q, observer: &Observer<K, V>) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        Ok(self.record_mut(id)?.unsubscribe(observer))
    }

    pub fn can_afford<Q>(&self, id: &Q, price: V) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        Ok(self.get(id)? >= price)
    }

    /// Debits `price` from `id` if the balance covers it.
    ///
    /// Returns `Ok(false)` without touching the balance when funds are
    /// insufficient.
    pub fn purchase<Q>(&mut self, id: &Q, price: V) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let record = self.record_mut(id)?;
        let balance = record.balance();
        if balance >= price {
            let remaining = balance - price;
            record.set_balance(remaining);
            debug!(currency = %record.id(), price = ?price, balance = ?remaining, "purchase succeeded");
            Ok(true)
        } else {
            debug!(currency = %record.id(), price = ?price, balance = ?balance, "insufficient funds");
            Ok(false)
        }
    }

    pub fn purchase_raw<Q>(&mut self, id: &Q, price: f64) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let price = V::try_from_f64(price)?;
        self.purchase(id, price)
    }

    pub fn can_purchase<P>(&self, item: &P) -> Result<bool>
    where
        P: Purchasable<K, V> + ?Sized,
    {
        self.can_afford(item.currency(), item.price())
    }

    pub fn purchase_item<P>(&mut self, item: &mut P) -> Result<bool>
    where
        P: Purchasable<K, V> + ?Sized,
    {
        self.purchase_item_with(item, || {}, || {})
    }

    /// Buys `item` with its own currency and price.
    ///
    /// On success the balance is debited, the item is marked purchased, its
    /// success hook runs and then `on_success`. On insufficient funds the
    /// item's failure hook runs and then `on_failure`. An unknown currency is
    /// an error and runs neither.
    pub fn purchase_item_with<P, S, F>(
        &mut self,
        item: &mut P,
        on_success: S,
        on_failure: F,
    ) -> Result<bool>
    where
        P: Purchasable<K, V> + ?Sized,
        S: FnOnce(),
        F: FnOnce(),
    {
        let currency = item.currency().clone();
        let price = item.price();
        if self.purchase(&currency, price)? {
            item.set_purchased(true);
            item.purchase_succeeded();
            on_success();
            Ok(true)
        } else {
            item.purchase_failed();
            on_failure();
            Ok(false)
        }
    }

    /// Current balances in ledger order.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(
            self.records
                .iter()
                .map(|record| SnapshotEntry {
                    id: record.id().to_string(),
                    value: record.balance().encode(),
                })
                .collect(),
        )
    }

    /// Writes every balance to storage under the ledger tag and returns the
    /// blob that was written.
    pub fn save_all(&self) -> Result<Vec<u8>> {
        let bytes = self.snapshot().to_bytes()?;
        self.storage.save(&self.tag, &bytes)?;
        debug!(tag = %self.tag, bytes = bytes.len(), "balances saved");
        Ok(bytes)
    }

    pub fn save(&self) -> Result<()> {
        self.save_all().map(|_| ())
    }

    pub fn save_all_to_string(&self) -> Result<String> {
        let bytes = self.save_all()?;
        String::from_utf8(bytes).map_err(|err| CurrencyError::Storage(err.to_string()))
    }

    /// Applies a snapshot blob and returns how many balances it set.
    ///
    /// Unknown identifiers are ignored and currencies missing from the blob
    /// keep their balance. An empty or malformed blob changes nothing.
    pub fn load_all(&mut self, bytes: &[u8]) -> usize {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(tag = %self.tag, "empty balance snapshot");
            return 0;
        }
        let entries = match snapshot::decode(bytes) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(tag = %self.tag, error = %err, "ignoring malformed balance snapshot");
                return 0;
            }
        };

        let applied = match entries {
            SnapshotEntries::Keyed(entries) => {
                let mut applied = 0;
                for entry in entries {
                    let found = self
                        .records
                        .iter_mut()
                        .find(|record| record.id().to_string() == entry.id);
                    match found {
                        Some(record) => {
                            record.set_balance(V::decode(&entry.value));
                            applied += 1;
                        }
                        None => debug!(currency = %entry.id, "skipping unknown currency in snapshot"),
                    }
                }
                applied
            }
            SnapshotEntries::Positional(values) => {
                let applied = values.len().min(self.records.len());
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.set_balance(V::decode(&value));
                }
                applied
            }
        };
        debug!(tag = %self.tag, applied, "balances loaded");
        applied
    }

    pub fn load_all_from_string(&mut self, raw: &str) -> usize {
        self.load_all(raw.as_bytes())
    }

    pub fn into_shared(self) -> SharedLedger<K, V> {
        Arc::new(Mutex::new(self))
    }
}

impl<K: CurrencyId, V: Balance> fmt::Debug for CurrencyLedger<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyLedger")
            .field("tag", &self.tag)
            .field("initialized", &self.initialized)
            .field("records", &self.records)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn ledger_with(storage: &MemoryStorage) -> CurrencyLedger {
        let mut ledger = CurrencyLedger::new(Box::new(storage.clone()));
        ledger
            .initialize(&[
                CurrencyDefinition::int("Coin".to_string(), 100),
                CurrencyDefinition::int("Gem".to_string(), 5),
            ])
            .expect("initialize");
        ledger
    }

    #[test]
    fn empty_definitions_fall_back_to_builtin_set() {
        let mut ledger: CurrencyLedger = CurrencyLedger::new(Box::new(MemoryStorage::new()));
        ledger.initialize(&[]).expect("initialize");
        let ids: Vec<&String> = ledger.ids().collect();
        assert_eq!(ids, ["Coin", "Gem", "Gold"]);
        assert!(ledger.get("Gold").unwrap().is_zero());
    }

    #[test]
    fn blank_and_duplicate_definitions_are_skipped() {
        let mut ledger: CurrencyLedger = CurrencyLedger::new(Box::new(MemoryStorage::new()));
        ledger
            .initialize(&[
                CurrencyDefinition::int("Coin".to_string(), 1),
                CurrencyDefinition::int("  ".to_string(), 2),
                CurrencyDefinition::int("Coin".to_string(), 3),
            ])
            .expect("initialize");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get_i64("Coin").unwrap(), 1);
    }

    #[test]
    fn all_blank_definitions_fall_back_to_builtin_set() {
        let mut ledger: CurrencyLedger = CurrencyLedger::new(Box::new(MemoryStorage::new()));
        ledger
            .initialize(&[
                CurrencyDefinition::int("".to_string(), 7),
                CurrencyDefinition::int(" \t".to_string(), 9),
            ])
            .expect("initialize");
        let ids: Vec<&String> = ledger.ids().collect();
        assert_eq!(ids, ["Coin", "Gem", "Gold"]);
        assert!(ledger.get("Coin").unwrap().is_zero());
    }

    #[test]
    fn invalid_definition_leaves_ledger_untouched() {
        let mut ledger: CurrencyLedger = CurrencyLedger::new(Box::new(MemoryStorage::new()));
        let result = ledger.initialize(&[
            CurrencyDefinition::int("Coin".to_string(), 1),
            CurrencyDefinition::float("Gem".to_string(), f64::NAN),
        ]);
        assert!(result.is_err());
        assert!(!ledger.is_initialized());
        assert!(ledger.is_empty());
    }

    #[test]
    fn unknown_currency_is_an_error() {
        let mut ledger = ledger_with(&MemoryStorage::new());
        assert!(matches!(
            ledger.get("Ruby"),
            Err(CurrencyError::UnknownCurrency(name)) if name == "Ruby"
        ));
        assert!(ledger.add("Ruby", ScaledNumber::ONE).is_err());
        assert!(ledger.purchase("Ruby", ScaledNumber::ONE).is_err());
        assert!(ledger.value_or_zero("Ruby").is_zero());
    }

    #[test]
    fn add_returns_new_balance() {
        let mut ledger = ledger_with(&MemoryStorage::new());
        let updated = ledger.add_raw("Gem", 2.0).unwrap();
        assert_eq!(updated, ScaledNumber::from(7_i32));
        assert_eq!(ledger.get_f64("Gem").unwrap(), 7.0);
        assert!(ledger.set_raw("Gem", f64::INFINITY).is_err());
        assert_eq!(ledger.get_i64("Gem").unwrap(), 7);
    }

    #[test]
    fn save_all_writes_under_tag() {
        let storage = MemoryStorage::new();
        let mut ledger = ledger_with(&storage);
        let bytes = ledger.save_all().expect("save");
        assert_eq!(storage.get(DEFAULT_STORAGE_TAG).unwrap(), Some(bytes.clone()));

        ledger.set_raw("Coin", 1.0).unwrap();
        ledger.save().expect("save");
        assert_ne!(storage.get(DEFAULT_STORAGE_TAG).unwrap(), Some(bytes));
    }

    #[test]
    fn reset_allows_reinitialization() {
        let storage = MemoryStorage::new();
        let mut ledger = ledger_with(&storage);
        ledger.initialize(&[]).expect("second initialize is a no-op");
        assert_eq!(ledger.len(), 2);

        ledger.reset();
        ledger.initialize(&[]).expect("initialize after reset");
        assert_eq!(ledger.len(), 3);
    }
}
