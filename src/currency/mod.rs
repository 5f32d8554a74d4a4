//! Currency identifiers, balance value types, and per-currency records.

mod record;

use std::{
    fmt,
    hash::Hash,
    ops::{Add, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    errors::CurrencyError,
    number::{NumberError, ScaledNumber},
};

pub use record::{observer, CurrencyRecord, Observer};

/// Names of the currencies a ledger starts with when no definitions are given.
pub const DEFAULT_CURRENCIES: [&str; 3] = ["Coin", "Gem", "Gold"];

/// Key type distinguishing currencies inside a ledger.
///
/// The `Display` form is what ends up in persisted snapshots, so it must be
/// stable and unique per currency.
pub trait CurrencyId: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Identifiers used when a ledger is initialized without definitions.
    fn builtin_set() -> Vec<Self>;
}

impl CurrencyId for String {
    fn builtin_set() -> Vec<Self> {
        DEFAULT_CURRENCIES.iter().map(|name| name.to_string()).collect()
    }
}

/// Enum-keyed alternative to string identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CurrencyKind {
    Coin,
    Gem,
    Gold,
}

impl CurrencyKind {
    pub const ALL: [CurrencyKind; 3] = [CurrencyKind::Coin, CurrencyKind::Gem, CurrencyKind::Gold];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyKind::Coin => "Coin",
            CurrencyKind::Gem => "Gem",
            CurrencyKind::Gold => "Gold",
        }
    }
}

impl fmt::Display for CurrencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyKind {
    type Err = CurrencyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        CurrencyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| CurrencyError::UnknownCurrency(raw.to_string()))
    }
}

impl CurrencyId for CurrencyKind {
    fn builtin_set() -> Vec<Self> {
        Self::ALL.to_vec()
    }
}

/// Value type a currency balance can be stored as.
pub trait Balance:
    Copy + PartialOrd + Add<Output = Self> + Sub<Output = Self> + fmt::Debug + Send + Sync + 'static
{
    fn zero() -> Self;

    /// Converts a raw number, rejecting non-finite input.
    fn try_from_f64(value: f64) -> Result<Self, NumberError>;

    fn from_scaled(value: ScaledNumber) -> Self;

    fn as_f64(&self) -> f64;

    /// Round-trip-safe text form written into snapshots.
    fn encode(&self) -> String;

    /// Inverse of [`Balance::encode`]; malformed text decodes to zero.
    fn decode(raw: &str) -> Self;
}

impl Balance for ScaledNumber {
    fn zero() -> Self {
        ScaledNumber::ZERO
    }

    fn try_from_f64(value: f64) -> Result<Self, NumberError> {
        ScaledNumber::from_raw(value)
    }

    fn from_scaled(value: ScaledNumber) -> Self {
        value
    }

    fn as_f64(&self) -> f64 {
        self.to_f64()
    }

    fn encode(&self) -> String {
        self.to_transport_string()
    }

    fn decode(raw: &str) -> Self {
        ScaledNumber::from_transport_string(raw)
    }
}

impl Balance for f64 {
    fn zero() -> Self {
        0.0
    }

    fn try_from_f64(value: f64) -> Result<Self, NumberError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(NumberError::InvalidValue(value))
        }
    }

    fn from_scaled(value: ScaledNumber) -> Self {
        value.to_f64()
    }

    fn as_f64(&self) -> f64 {
        *self
    }

    fn encode(&self) -> String {
        format!("{:?}", self)
    }

    fn decode(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
    }
}
