use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountType {
    #[serde(rename = "PERCENT")]
    Percent,
    #[serde(rename = "FIXED")]
    Fixed,
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::Fixed
    }
}

/// Wire shape of the voucher validation endpoint. `valid: false` is a
/// business-rule rejection, not an error; the wizard renders `error`
/// inline and keeps the guest's input intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherValidation {
    pub valid: bool,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VoucherValidation {
    pub fn rejected(code: &str, reason: &str) -> Self {
        Self {
            valid: false,
            code: code.to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 0,
            description: None,
            error: Some(reason.to_string()),
        }
    }
}
