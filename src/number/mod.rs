//! Scaled big numbers for balances that outgrow ordinary `f64`/`i64` ranges.
//!
//! A [`ScaledNumber`] stores `mantissa × 1000^exponent` with the mantissa kept
//! in `[1, 1000)` (or exactly zero). Arithmetic is lossy and floating-point
//! backed; it trades exactness for effectively unbounded magnitude.

mod format;
mod transport;

use std::{
    cmp::Ordering,
    iter::Sum,
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use thiserror::Error;

pub use format::{format_grouped, magnitude_suffix};

const BASE: f64 = 1000.0;

/// Mantissas closer than this (at the same exponent) compare equal.
pub const EQUALITY_EPSILON: f64 = 1e-10;

/// Exponent gap at which the smaller operand of an addition is dropped.
pub const NEGLIGIBLE_EXPONENT_GAP: i64 = 20;

/// Failures raised by numeric construction and division.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error("value must be a finite number, got {0}")]
    InvalidValue(f64),
    #[error("attempt to divide by zero")]
    DivideByZero,
    #[error("malformed scaled number `{0}`")]
    Malformed(String),
}

/// A normalized `mantissa × 1000^exponent` value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaledNumber {
    mantissa: f64,
    exponent: i64,
}

impl ScaledNumber {
    /// Canonical zero: mantissa `0`, exponent `0`.
    pub const ZERO: Self = Self {
        mantissa: 0.0,
        exponent: 0,
    };
    pub const ONE: Self = Self {
        mantissa: 1.0,
        exponent: 0,
    };
    pub const THOUSAND: Self = Self {
        mantissa: 1.0,
        exponent: 1,
    };

    /// Builds a value from a mantissa/exponent pair and normalizes it.
    ///
    /// A non-finite mantissa collapses to [`ScaledNumber::ZERO`]; use
    /// [`ScaledNumber::try_new`] when such input must be rejected instead.
    pub fn new(mantissa: f64, exponent: i64) -> Self {
        Self::normalized(mantissa, exponent)
    }

    /// Like [`ScaledNumber::new`] but rejects a non-finite mantissa.
    pub fn try_new(mantissa: f64, exponent: i64) -> Result<Self, NumberError> {
        if !mantissa.is_finite() {
            return Err(NumberError::InvalidValue(mantissa));
        }
        Ok(Self::normalized(mantissa, exponent))
    }

    /// Converts a raw finite `f64` into scaled form.
    pub fn from_raw(value: f64) -> Result<Self, NumberError> {
        if !value.is_finite() {
            return Err(NumberError::InvalidValue(value));
        }
        Ok(Self::from_finite(value))
    }

    fn from_finite(value: f64) -> Self {
        if value == 0.0 {
            return Self::ZERO;
        }
        let abs = value.abs();
        let mut exponent = (abs.log10() / 3.0).floor() as i64;
        // Split the power so subnormal inputs do not underflow the divisor.
        let half = exponent / 2;
        let mut scaled = abs / pow1000(half) / pow1000(exponent - half);

        // log10 can land one bucket off near exact powers of 1000.
        if scaled >= BASE {
            scaled /= BASE;
            exponent += 1;
        }
        if scaled < 1.0 {
            scaled *= BASE;
            exponent -= 1;
        }
        Self::normalized(scaled.copysign(value), exponent)
    }

    fn normalized(mut mantissa: f64, mut exponent: i64) -> Self {
        if mantissa == 0.0 || !mantissa.is_finite() {
            return Self::ZERO;
        }
        loop {
            let abs = mantissa.abs();
            if abs >= BASE {
                mantissa /= BASE;
                exponent = exponent.saturating_add(1);
            } else if abs < 1.0 {
                mantissa *= BASE;
                exponent = exponent.saturating_sub(1);
            } else {
                break;
            }
        }
        Self { mantissa, exponent }
    }

    pub fn mantissa(&self) -> f64 {
        self.mantissa
    }

    /// The thousands exponent.
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa < 0.0
    }

    pub fn abs(self) -> Self {
        Self {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    /// `mantissa × 1000^exponent`. Overflows to infinity (or underflows to
    /// zero) for extreme exponents.
    pub fn to_f64(self) -> f64 {
        self.mantissa * BASE.powf(self.exponent as f64)
    }

    /// Multiplies by a raw scalar.
    pub fn multiply_scalar(self, scalar: f64) -> Result<Self, NumberError> {
        Ok(self * Self::from_raw(scalar)?)
    }

    /// Divides by another scaled number.
    pub fn divide(self, divisor: Self) -> Result<Self, NumberError> {
        if divisor.is_zero() {
            return Err(NumberError::DivideByZero);
        }
        Ok(Self::normalized(
            self.mantissa / divisor.mantissa,
            self.exponent.saturating_sub(divisor.exponent),
        ))
    }

    /// Divides by a raw scalar.
    pub fn divide_scalar(self, scalar: f64) -> Result<Self, NumberError> {
        if scalar == 0.0 {
            return Err(NumberError::DivideByZero);
        }
        self.divide(Self::from_raw(scalar)?)
    }

    /// Total order: sign, then exponent, then the exact mantissa.
    ///
    /// Sign is settled before the exponent, which departs from a plain
    /// exponent-first order on purpose: negatives sort below zero, zero below
    /// positives, and among negatives a larger exponent is smaller. This keeps
    /// a zero balance from outranking a sub-unit price.
    ///
    /// No tolerance applies here; [`EQUALITY_EPSILON`] is only used by `==`.
    /// Two values can therefore be equal while one is still less than the
    /// other, which is what balance checks rely on.
    pub fn compare(&self, other: &Self) -> Ordering {
        match self.sign_class().cmp(&other.sign_class()) {
            Ordering::Equal => {}
            ordering => return ordering,
        }
        if self.is_zero() {
            return Ordering::Equal;
        }
        let by_exponent = self.exponent.cmp(&other.exponent);
        let by_exponent = if self.is_negative() {
            by_exponent.reverse()
        } else {
            by_exponent
        };
        by_exponent.then_with(|| self.mantissa.total_cmp(&other.mantissa))
    }

    fn sign_class(&self) -> i8 {
        if self.is_zero() {
            0
        } else if self.is_negative() {
            -1
        } else {
            1
        }
    }
}

fn pow1000(exponent: i64) -> f64 {
    match exponent {
        0 => 1.0,
        1..=4 => BASE.powi(exponent as i32),
        _ => BASE.powf(exponent as f64),
    }
}

/// Same exponent bucket and mantissas within [`EQUALITY_EPSILON`].
impl PartialEq for ScaledNumber {
    fn eq(&self, other: &Self) -> bool {
        self.exponent == other.exponent
            && (self.mantissa - other.mantissa).abs() < EQUALITY_EPSILON
    }
}

impl PartialOrd for ScaledNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Add for ScaledNumber {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let (big, small) = if self.exponent >= rhs.exponent {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let gap = big.exponent.saturating_sub(small.exponent);
        if gap >= NEGLIGIBLE_EXPONENT_GAP {
            return big;
        }
        Self::normalized(big.mantissa + small.mantissa * pow1000(-gap), big.exponent)
    }
}

impl Sub for ScaledNumber {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for ScaledNumber {
    type Output = Self;

    fn neg(self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }
}

impl Mul for ScaledNumber {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::ZERO;
        }
        Self::normalized(
            self.mantissa * rhs.mantissa,
            self.exponent.saturating_add(rhs.exponent),
        )
    }
}

impl AddAssign for ScaledNumber {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for ScaledNumber {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for ScaledNumber {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for ScaledNumber {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<f64> for ScaledNumber {
    type Error = NumberError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_raw(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ScaledNumber {
                fn from(value: $ty) -> Self {
                    Self::from_finite(value as f64)
                }
            }
        )*
    };
}

impl_from_integer!(i32, u32, i64, u64);
