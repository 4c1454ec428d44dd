//! Voucher validation against the CRM. Read-only: redemption happens in
//! the CRM during fulfillment, never here. Fails closed; an unreachable
//! CRM means no discount.

use chrono::NaiveDate;

use crate::models::{DiscountType, VoucherValidation};
use crate::services::crm::{Crm, CrmModule};

pub async fn validate_voucher(crm: &dyn Crm, code: &str, today: NaiveDate) -> VoucherValidation {
    // Codes are case-insensitive on input; the CRM stores them uppercase.
    let normalized = code.trim().to_uppercase();

    let criteria = format!("(Voucher_Code:equals:{normalized})");
    let records = match crm.search_records(CrmModule::Vouchers, &criteria).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(code = %normalized, error = %e, "voucher lookup failed");
            return VoucherValidation::rejected(&normalized, "Unable to validate voucher");
        }
    };

    let Some(voucher) = records.first() else {
        return VoucherValidation::rejected(&normalized, "Voucher code not found");
    };

    match voucher["Status"].as_str() {
        Some("Active") => {}
        Some("Redeemed") => {
            return VoucherValidation::rejected(&normalized, "This voucher has already been used")
        }
        _ => return VoucherValidation::rejected(&normalized, "This voucher is no longer valid"),
    }

    if let Some(expiry) = voucher["Expiration_Date"].as_str() {
        match expiry.parse::<NaiveDate>() {
            Ok(expiry) if expiry < today => {
                return VoucherValidation::rejected(&normalized, "This voucher has expired")
            }
            Ok(_) => {}
            Err(_) => {
                tracing::warn!(code = %normalized, expiry, "unparseable voucher expiry date");
            }
        }
    }

    let discount_type = match voucher["Discount_Type"].as_str() {
        Some("PERCENT") => DiscountType::Percent,
        _ => DiscountType::Fixed,
    };
    let discount_value = voucher["Discount_Value"]
        .as_i64()
        .or_else(|| voucher["Discount_Value"].as_f64().map(|v| v.round() as i64))
        .unwrap_or(0);

    VoucherValidation {
        valid: true,
        code: normalized,
        discount_type,
        discount_value,
        description: voucher["Description"].as_str().map(|s| s.to_string()),
        error: None,
    }
}
