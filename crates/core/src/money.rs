//! Decimal money helpers and product pricing.
//!
//! All amounts are Ghana cedis held as [`Decimal`] with two decimal places.
//! The payment gateway works in pesewas (minor units), so conversions to and
//! from minor units live here as well.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places for every stored amount.
pub const SCALE: u32 = 2;

/// ISO 4217 currency code used for every amount on the platform.
pub const CURRENCY: &str = "GHS";

/// Round an amount to two decimal places, halves away from zero.
#[must_use]
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a cedi amount to pesewas.
///
/// Returns `None` if the amount is negative, has more than two decimal
/// places, or does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if amount.is_sign_negative() || amount.normalize().scale() > SCALE {
        return None;
    }
    let minor = amount.checked_mul(Decimal::ONE_HUNDRED)?;
    minor.trunc().to_i64()
}

/// Convert pesewas to a cedi amount.
#[must_use]
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, SCALE)
}

/// Errors from validating a price against its cost.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("price must be greater than zero")]
    NonPositivePrice,
    #[error("cost cannot be negative")]
    NegativeCost,
    #[error("price {price} is below the wholesale cost {cost}")]
    BelowCost { price: Decimal, cost: Decimal },
    #[error("amounts may have at most two decimal places")]
    TooPrecise,
}

/// A product's price and cost with the derived profit figures.
///
/// Profit fields are never accepted from clients; they are recomputed through
/// [`Pricing::new`] every time a price or cost changes.
///
/// ```
/// use bundlehub_core::Pricing;
/// use rust_decimal::Decimal;
///
/// let pricing = Pricing::new(Decimal::new(1200, 2), Decimal::new(1000, 2)).unwrap();
/// assert_eq!(pricing.profit, Decimal::new(200, 2));
/// assert_eq!(pricing.profit_margin, Decimal::new(1667, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub price: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    /// Profit as a percentage of price, two decimal places.
    pub profit_margin: Decimal,
}

impl Pricing {
    /// Validate `price`/`cost` and derive profit and margin.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] if the price is not positive, the cost is
    /// negative, either has more than two decimal places, or the price is
    /// below cost.
    pub fn new(price: Decimal, cost: Decimal) -> Result<Self, PricingError> {
        if price.normalize().scale() > SCALE || cost.normalize().scale() > SCALE {
            return Err(PricingError::TooPrecise);
        }
        if price <= Decimal::ZERO {
            return Err(PricingError::NonPositivePrice);
        }
        if cost < Decimal::ZERO {
            return Err(PricingError::NegativeCost);
        }
        if price < cost {
            return Err(PricingError::BelowCost { price, cost });
        }

        let profit = price - cost;
        let profit_margin = round(profit / price * Decimal::ONE_HUNDRED);

        Ok(Self {
            price,
            cost,
            profit,
            profit_margin,
        })
    }

    /// Re-derive with a new price and the same cost.
    ///
    /// # Errors
    ///
    /// Same as [`Pricing::new`].
    pub fn with_price(self, price: Decimal) -> Result<Self, PricingError> {
        Self::new(price, self.cost)
    }
}
