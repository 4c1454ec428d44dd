use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::voucher::DiscountType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub age: u8,
}

/// The room the guest picked, carried with its resolved pricing so the
/// summary and payment steps never re-derive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedRoom {
    pub id: String,
    pub name: String,
    pub max_adults: u32,
    pub max_children: u32,
    pub min_nights: i64,
    pub total_price: i64,
    pub price_per_night: i64,
    pub currency: String,
    pub nights: i64,
}

/// Client-held reservation draft. Rebuilt each session, mutated step by
/// step, discarded once the flow completes or is abandoned; durability
/// lives in the CRM/PMS, never here.
///
/// Invariant after room selection: `total_amount = deposit_amount +
/// balance_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDraft {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub nights: i64,
    pub room: Option<SelectedRoom>,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub adults: u32,
    pub children: Vec<Child>,
    pub special_requests: String,
    pub nip_number: String,
    pub voucher_code: String,
    pub voucher_valid: bool,
    pub voucher_discount: i64,
    pub voucher_discount_type: DiscountType,
    pub deposit_amount: i64,
    pub balance_amount: i64,
    pub total_amount: i64,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            check_in: None,
            check_out: None,
            nights: 0,
            room: None,
            guest_name: String::new(),
            guest_email: String::new(),
            guest_phone: String::new(),
            adults: 2,
            children: Vec::new(),
            special_requests: String::new(),
            nip_number: String::new(),
            voucher_code: String::new(),
            voucher_valid: false,
            voucher_discount: 0,
            voucher_discount_type: DiscountType::Fixed,
            deposit_amount: 0,
            balance_amount: 0,
            total_amount: 0,
        }
    }
}

/// Syntactic email check: one `@`, no whitespace, dotted domain.
pub fn email_is_valid(s: &str) -> bool {
    if s.is_empty() || s.chars().any(char::is_whitespace) {
        return false;
    }
    let parts: Vec<&str> = s.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Syntactic phone check: optional leading `+`, then 7–20 digits,
/// spaces, dashes, or parentheses.
pub fn phone_is_valid(s: &str) -> bool {
    let trimmed = s.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let len = rest.chars().count();
    if !(7..=20).contains(&len) {
        return false;
    }
    rest.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(email_is_valid("anna@example.com"));
        assert!(email_is_valid("a.b+tag@mail.co.uk"));
    }

    #[test]
    fn test_email_invalid() {
        assert!(!email_is_valid(""));
        assert!(!email_is_valid("anna"));
        assert!(!email_is_valid("anna@example"));
        assert!(!email_is_valid("anna@@example.com"));
        assert!(!email_is_valid("anna @example.com"));
        assert!(!email_is_valid("@example.com"));
        assert!(!email_is_valid("anna@.com"));
    }

    #[test]
    fn test_phone_valid() {
        assert!(phone_is_valid("+48 123 456 789"));
        assert!(phone_is_valid("1234567"));
        assert!(phone_is_valid("(22) 123-45-67"));
    }

    #[test]
    fn test_phone_invalid() {
        assert!(!phone_is_valid("123456"));
        assert!(!phone_is_valid("abc123456"));
        assert!(!phone_is_valid("123456789012345678901"));
        assert!(!phone_is_valid(""));
    }
}
