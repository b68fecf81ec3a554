//! Cart totals: subtotal, tax, shipping and promotional discount.
//!
//! Prices come from the catalog collaborator; this module only does the
//! arithmetic shown on the cart and checkout pages.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::line_item::LineItem;
use super::price::{CurrencyCode, Price};

/// Promo code granting 10% off the subtotal.
pub const PROMO_WELCOME10: &str = "WELCOME10";

/// Sales tax rate applied to the subtotal (8%).
const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);
/// Discount rate for [`PROMO_WELCOME10`] (10%).
const PROMO_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
/// Orders with a subtotal strictly above this ship free.
const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
/// Flat shipping charge below the threshold.
const FLAT_SHIPPING: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Errors computing a cart summary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("cart mixes currencies {0:?} and {1:?}")]
    MixedCurrency(CurrencyCode, CurrencyCode),
    #[error("cart total is out of range")]
    Overflow,
}

/// Totals for a priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub subtotal: Price,
    pub tax: Price,
    pub shipping: Price,
    pub discount: Price,
    pub total: Price,
    /// The promo code that was applied, if any.
    pub promo_applied: Option<String>,
    /// A promo code was supplied but is not recognized.
    pub promo_rejected: bool,
}

impl CartSummary {
    /// Compute totals for `lines`, each paired with its unit price.
    ///
    /// An empty cart is summarized in the default currency with no shipping.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::MixedCurrency` if the unit prices do not share
    /// one currency and `SummaryError::Overflow` if an amount does not fit in
    /// a `Decimal`.
    pub fn compute(lines: &[(LineItem, Price)], promo: Option<&str>) -> Result<Self, SummaryError> {
        let currency = match lines.first() {
            Some((_, price)) => price.currency_code,
            None => CurrencyCode::default(),
        };

        let mut subtotal = Decimal::ZERO;
        for (line, price) in lines {
            if price.currency_code != currency {
                return Err(SummaryError::MixedCurrency(currency, price.currency_code));
            }
            subtotal = price
                .amount
                .checked_mul(Decimal::from(line.quantity.get()))
                .and_then(|amount| subtotal.checked_add(amount))
                .ok_or(SummaryError::Overflow)?;
        }

        let tax = subtotal.checked_mul(TAX_RATE).ok_or(SummaryError::Overflow)?;
        let shipping = if lines.is_empty() || subtotal > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING
        };

        let promo = promo.map(str::trim).filter(|code| !code.is_empty());
        let promo_valid = promo.is_some_and(|code| code.eq_ignore_ascii_case(PROMO_WELCOME10));
        let discount = if promo_valid {
            subtotal.checked_mul(PROMO_RATE).ok_or(SummaryError::Overflow)?
        } else {
            Decimal::ZERO
        };
        let total = subtotal
            .checked_add(tax)
            .and_then(|amount| amount.checked_add(shipping))
            .and_then(|amount| amount.checked_sub(discount))
            .ok_or(SummaryError::Overflow)?;

        let price = |amount| Price::new(amount, currency).rounded();
        Ok(Self {
            subtotal: price(subtotal),
            tax: price(tax),
            shipping: price(shipping),
            discount: price(discount),
            total: price(total),
            promo_applied: promo_valid.then(|| PROMO_WELCOME10.to_string()),
            promo_rejected: promo.is_some() && !promo_valid,
        })
    }
}
