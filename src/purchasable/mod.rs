//! Purchasable descriptors: something priced in one currency that can be
//! bought through [`crate::ledger::CurrencyLedger::purchase_item`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{currency::Balance, errors::Result, number::ScaledNumber};

/// An item priced in a single currency.
pub trait Purchasable<K, V = ScaledNumber> {
    fn currency(&self) -> &K;
    fn price(&self) -> V;
    fn is_purchased(&self) -> bool;
    fn set_purchased(&mut self, purchased: bool);
    /// Called after the balance has been debited.
    fn purchase_succeeded(&mut self);
    /// Called when the balance could not cover the price.
    fn purchase_failed(&mut self);
}

/// Authored item description, e.g. a catalog entry in the currency config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinition<K = String> {
    pub currency: K,
    pub price: ScaledNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

type Callback = Box<dyn FnOnce() + Send>;

/// Runs and clears every queued callback.
fn fire(callbacks: &mut Vec<Callback>) {
    for callback in std::mem::take(callbacks) {
        callback();
    }
}

/// Stock [`Purchasable`] with one-shot success/failure callbacks.
///
/// Callbacks queued with [`PurchasableItem::on_purchase_success`] and
/// [`PurchasableItem::on_purchase_failed`] run at most once; each list is
/// cleared when it fires.
pub struct PurchasableItem<K = String, V = ScaledNumber> {
    currency: K,
    price: V,
    purchased: bool,
    display_name: Option<String>,
    icon: Option<String>,
    on_success: Vec<Callback>,
    on_failure: Vec<Callback>,
}

impl<K, V: Balance> PurchasableItem<K, V> {
    pub fn new(currency: K, price: V) -> Self {
        Self {
            currency,
            price,
            purchased: false,
            display_name: None,
            icon: None,
            on_success: Vec::new(),
            on_failure: Vec::new(),
        }
    }

    /// Builds an item from a raw price, rejecting non-finite values.
    pub fn from_raw(currency: K, price: f64) -> Result<Self> {
        Ok(Self::new(currency, V::try_from_f64(price)?))
    }

    pub fn from_definition(definition: &ItemDefinition<K>) -> Self
    where
        K: Clone,
    {
        let mut item = Self::new(
            definition.currency.clone(),
            V::from_scaled(definition.price),
        );
        item.display_name = definition.display_name.clone();
        item.icon = definition.icon.clone();
        item
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn on_purchase_success(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.on_success.push(Box::new(callback));
    }

    pub fn on_purchase_failed(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.on_failure.push(Box::new(callback));
    }
}

impl<K, V: Balance> Purchasable<K, V> for PurchasableItem<K, V> {
    fn currency(&self) -> &K {
        &self.currency
    }

    fn price(&self) -> V {
        self.price
    }

    fn is_purchased(&self) -> bool {
        self.purchased
    }

    fn set_purchased(&mut self, purchased: bool) {
        self.purchased = purchased;
    }

    fn purchase_succeeded(&mut self) {
        fire(&mut self.on_success);
    }

    fn purchase_failed(&mut self) {
        fire(&mut self.on_failure);
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PurchasableItem<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurchasableItem")
            .field("currency", &self.currency)
            .field("price", &self.price)
            .field("purchased", &self.purchased)
            .field("display_name", &self.display_name)
            .field("icon", &self.icon)
            .field("pending_success", &self.on_success.len())
            .field("pending_failure", &self.on_failure.len())
            .finish()
    }
}
