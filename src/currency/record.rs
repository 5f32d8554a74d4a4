use std::{fmt, sync::Arc};

use crate::number::ScaledNumber;

/// Change subscriber handle. Identity is the allocation: cloning an
/// `Observer` yields the same subscriber, wrapping the same closure twice
/// does not.
pub type Observer<K, V = ScaledNumber> = Arc<dyn Fn(&CurrencyRecord<K, V>) + Send + Sync>;

/// Wraps a closure into an [`Observer`] handle.
pub fn observer<K, V, F>(callback: F) -> Observer<K, V>
where
    F: Fn(&CurrencyRecord<K, V>) + Send + Sync + 'static,
{
    Arc::new(callback)
}

/// Live state of one currency: its balance plus ordered change subscribers.
pub struct CurrencyRecord<K, V = ScaledNumber> {
    id: K,
    balance: V,
    observers: Vec<Observer<K, V>>,
}

impl<K, V: Copy> CurrencyRecord<K, V> {
    pub fn new(id: K, balance: V) -> Self {
        Self {
            id,
            balance,
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    pub fn balance(&self) -> V {
        self.balance
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_subscribed(&self, observer: &Observer<K, V>) -> bool {
        self.observers
            .iter()
            .any(|existing| Arc::ptr_eq(existing, observer))
    }

    /// Replaces the balance and synchronously notifies every subscriber in
    /// subscription order.
    pub fn set_balance(&mut self, value: V) {
        self.balance = value;
        self.notify();
    }

    /// Registers `observer` (once) and immediately replays the current
    /// balance to it.
    pub fn subscribe(&mut self, observer: Observer<K, V>) {
        if !self.is_subscribed(&observer) {
            self.observers.push(Arc::clone(&observer));
        }
        observer(self);
    }

    /// Removes `observer`; returns whether it was subscribed.
    pub fn unsubscribe(&mut self, observer: &Observer<K, V>) -> bool {
        let before = self.observers.len();
        self.observers
            .retain(|existing| !Arc::ptr_eq(existing, observer));
        before != self.observers.len()
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer(self);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CurrencyRecord<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyRecord")
            .field("id", &self.id)
            .field("balance", &self.balance)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recording_observer(log: Arc<Mutex<Vec<String>>>, label: &'static str) -> Observer<String> {
        observer(move |record: &CurrencyRecord<String>| {
            log.lock()
                .unwrap()
                .push(format!("{label}:{}", record.balance().to_transport_string()));
        })
    }

    #[test]
    fn subscribe_replays_current_balance() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut record = CurrencyRecord::new("Coin".to_string(), ScaledNumber::from(25_i32));
        record.subscribe(recording_observer(log.clone(), "ui"));
        assert_eq!(*log.lock().unwrap(), vec!["ui:25|0"]);
    }

    #[test]
    fn set_balance_notifies_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut record = CurrencyRecord::new("Gem".to_string(), ScaledNumber::ZERO);
        record.subscribe(recording_observer(log.clone(), "first"));
        record.subscribe(recording_observer(log.clone(), "second"));
        log.lock().unwrap().clear();

        record.set_balance(ScaledNumber::new(2.0, 1));
        assert_eq!(*log.lock().unwrap(), vec!["first:2|1", "second:2|1"]);
    }

    #[test]
    fn duplicate_subscription_is_ignored() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut record = CurrencyRecord::new("Gold".to_string(), ScaledNumber::ZERO);
        let handle = recording_observer(log.clone(), "hud");
        record.subscribe(handle.clone());
        record.subscribe(handle.clone());
        assert_eq!(record.observer_count(), 1);

        log.lock().unwrap().clear();
        record.set_balance(ScaledNumber::ONE);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut record = CurrencyRecord::new("Coin".to_string(), ScaledNumber::ZERO);
        let handle = recording_observer(log.clone(), "hud");
        record.subscribe(handle.clone());
        assert!(record.unsubscribe(&handle));
        assert!(!record.unsubscribe(&handle));

        log.lock().unwrap().clear();
        record.set_balance(ScaledNumber::ONE);
        assert!(log.lock().unwrap().is_empty());
    }
}
