//! Non-negative money amounts backed by decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

/// A non-negative money amount in the shop's single display currency.
///
/// Constructors clamp negative inputs to zero: cart payloads come from a
/// remote API that is not trusted to keep prices sane, and a negative unit
/// price must never make it into a line total.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, clamping negative amounts to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.max(Decimal::ZERO))
    }

    /// Create a price from a floating-point amount, clamping negatives and
    /// non-finite values to zero.
    ///
    /// Wire payloads carry prices as JSON numbers; this is the single lossy
    /// step between them and decimal arithmetic.
    #[must_use]
    pub fn from_f64_lossy(amount: f64) -> Self {
        Decimal::from_f64(amount).map_or(Self::ZERO, Self::new)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This price multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether this price is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_clamped_to_zero() {
        assert_eq!(Price::new(Decimal::new(-350, 2)), Price::ZERO);
        assert_eq!(Price::from_f64_lossy(-1.0), Price::ZERO);
    }

    #[test]
    fn test_non_finite_clamped_to_zero() {
        assert_eq!(Price::from_f64_lossy(f64::NAN), Price::ZERO);
        assert_eq!(Price::from_f64_lossy(f64::INFINITY), Price::ZERO);
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::new(Decimal::new(999, 2));
        assert_eq!(price.times(3), Price::new(Decimal::new(2997, 2)));
        assert_eq!(price.times(0), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::new(Decimal::from(10)), Price::new(Decimal::new(550, 2))]
            .into_iter()
            .sum();
        assert_eq!(total, Price::new(Decimal::new(1550, 2)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::new(Decimal::new(75, 1)).to_string(), "$7.50");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }
}
