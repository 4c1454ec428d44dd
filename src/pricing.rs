//! Deposit/balance arithmetic for a stay. Pure functions, whole currency
//! units; the only rounding applied is the single `round()` on the
//! deposit, so `deposit + balance == discounted_total` always holds.

use crate::models::DiscountType;

/// Baseline deposit rate when no voucher is applied.
const DEPOSIT_RATE: f64 = 0.10;
/// Deposit rate once a voucher discount has been applied.
/// The asymmetry with [`DEPOSIT_RATE`] matches observed production
/// behavior; see DESIGN.md.
const VOUCHER_DEPOSIT_RATE: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    pub kind: DiscountType,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quote {
    pub discount_amount: i64,
    pub discounted_total: i64,
    pub deposit_amount: i64,
    pub balance_amount: i64,
}

/// Compute the money split for a stay priced at `total`, with an
/// optional validated voucher discount.
///
/// A zero or negative `total` (price-on-request room) yields an
/// all-zero quote; callers must block progress on it.
pub fn quote(total: i64, discount: Option<Discount>) -> Quote {
    if total <= 0 {
        return Quote::default();
    }

    let (discount_amount, rate) = match discount {
        None => (0, DEPOSIT_RATE),
        Some(d) => {
            let amount = match d.kind {
                DiscountType::Percent => ((total as f64) * (d.value as f64) / 100.0).round() as i64,
                DiscountType::Fixed => d.value,
            };
            // Clamp so the discounted total never goes negative.
            (amount.clamp(0, total), VOUCHER_DEPOSIT_RATE)
        }
    };

    let discounted_total = total - discount_amount;
    let deposit_amount = ((discounted_total as f64) * rate).round() as i64;

    Quote {
        discount_amount,
        discounted_total,
        deposit_amount,
        balance_amount: discounted_total - deposit_amount,
    }
}
