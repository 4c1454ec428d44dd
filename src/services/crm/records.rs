//! Typed payload builders for the CRM modules this system writes.
//! Field names follow the Zoho module layouts; optional fields are
//! omitted from the payload rather than sent as nulls, and every record
//! validates itself before serialization.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::models::email_is_valid;

#[derive(Debug, Clone, Serialize)]
pub struct ContactRecord {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "First_Name", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "Last_Name", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ContactRecord {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(email_is_valid(&self.email), "contact requires a valid email");
        Ok(())
    }

    pub fn into_value(self) -> anyhow::Result<Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }
}

/// The durable booking record; the source of truth for a reservation
/// attempt. Created before any payment artifact exists.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    #[serde(rename = "Check_In")]
    pub check_in: NaiveDate,
    #[serde(rename = "Check_Out")]
    pub check_out: NaiveDate,
    #[serde(rename = "Nights")]
    pub nights: i64,
    #[serde(rename = "Booking_status")]
    pub booking_status: String,
    #[serde(rename = "Payment_status")]
    pub payment_status: String,
    #[serde(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "Payment_Method")]
    pub payment_method: String,
    #[serde(rename = "Booking_Notes")]
    pub booking_notes: String,
    #[serde(rename = "Arrival_time")]
    pub arrival_time: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Number_of_Adults")]
    pub adults: u32,
    #[serde(rename = "Number_of_Children")]
    pub children: u32,
    #[serde(rename = "Guest_Ages")]
    pub guest_ages: String,
    #[serde(rename = "Total_Price")]
    pub total_price: i64,
    #[serde(rename = "Deposit_Amount")]
    pub deposit_amount: i64,
    #[serde(rename = "Balance_Amount")]
    pub balance_amount: i64,
    #[serde(rename = "NIP_Number")]
    pub nip_number: String,
    #[serde(rename = "Locale")]
    pub locale: String,
    #[serde(rename = "Room", skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(rename = "Guest", skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,
    #[serde(rename = "Voucher_code", skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    #[serde(rename = "Discount_amount", skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<i64>,
    #[serde(rename = "Stripe_Deposit_ID", skip_serializing_if = "Option::is_none")]
    pub stripe_deposit_id: Option<String>,
    #[serde(rename = "Stripe_Customer_ID", skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(rename = "Stripe_Payment_Method_ID", skip_serializing_if = "Option::is_none")]
    pub stripe_payment_method_id: Option<String>,
}

impl BookingRecord {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.check_out > self.check_in, "check-out must be after check-in");
        anyhow::ensure!(self.nights >= 1, "booking requires at least one night");
        anyhow::ensure!(email_is_valid(&self.email), "booking requires a valid guest email");
        anyhow::ensure!(self.total_price >= 0, "total price cannot be negative");
        anyhow::ensure!(
            self.total_price == self.deposit_amount + self.balance_amount,
            "deposit and balance must add up to the total"
        );
        Ok(())
    }

    pub fn into_value(self) -> anyhow::Result<Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoucherRecord {
    #[serde(rename = "Email")]
    pub buyer_email: String,
    #[serde(rename = "Recipient_Name")]
    pub recipient_name: String,
    #[serde(rename = "Expiration_Date")]
    pub expiration_date: NaiveDate,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Buyer", skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
}

impl VoucherRecord {
    pub fn active(
        code: &str,
        buyer_email: &str,
        recipient_name: Option<&str>,
        expiration_date: NaiveDate,
    ) -> Self {
        Self {
            buyer_email: buyer_email.to_string(),
            recipient_name: recipient_name.unwrap_or_default().to_string(),
            expiration_date,
            status: "Active".to_string(),
            description: format!("Voucher Code: {code}"),
            buyer: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.buyer_email.is_empty(), "voucher requires a buyer email");
        anyhow::ensure!(!self.description.is_empty(), "voucher requires a code");
        Ok(())
    }

    pub fn into_value(self) -> anyhow::Result<Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdoptionRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Alpaca")]
    pub alpaca: String,
    #[serde(rename = "Tier")]
    pub tier: String,
    #[serde(rename = "Amount_Paid")]
    pub amount_paid: f64,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Stripe_Session_ID")]
    pub stripe_session_id: String,
    #[serde(rename = "Date_Started")]
    pub date_started: NaiveDate,
    #[serde(rename = "Client", skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl AdoptionRecord {
    pub fn paid(
        alpaca: &str,
        tier: &str,
        email: &str,
        amount_minor: i64,
        stripe_session_id: &str,
        date_started: NaiveDate,
    ) -> Self {
        Self {
            name: format!("Adoption - {alpaca}"),
            email: email.to_string(),
            alpaca: alpaca.to_string(),
            tier: tier.to_string(),
            amount_paid: amount_minor as f64 / 100.0,
            status: "Paid".to_string(),
            stripe_session_id: stripe_session_id.to_string(),
            date_started,
            client: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.alpaca.is_empty(), "adoption requires an alpaca name");
        anyhow::ensure!(!self.stripe_session_id.is_empty(), "adoption requires a session id");
        Ok(())
    }

    pub fn into_value(self) -> anyhow::Result<Value> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn booking() -> BookingRecord {
        BookingRecord {
            check_in: date("2026-03-10"),
            check_out: date("2026-03-13"),
            nights: 3,
            booking_status: "DEPOSIT_PAID".to_string(),
            payment_status: "Deposit Paid".to_string(),
            channel: "Website".to_string(),
            payment_method: "Stripe".to_string(),
            booking_notes: String::new(),
            arrival_time: "15:00".to_string(),
            email: "anna@example.com".to_string(),
            adults: 2,
            children: 1,
            guest_ages: "Child 1: 4y".to_string(),
            total_price: 900,
            deposit_amount: 90,
            balance_amount: 810,
            nip_number: String::new(),
            locale: "pl".to_string(),
            room: None,
            guest: None,
            voucher_code: None,
            discount_amount: None,
            stripe_deposit_id: None,
            stripe_customer_id: None,
            stripe_payment_method_id: None,
        }
    }

    #[test]
    fn test_booking_serializes_crm_field_names() {
        let value = booking().into_value().unwrap();
        assert_eq!(value["Check_In"], "2026-03-10");
        assert_eq!(value["Booking_status"], "DEPOSIT_PAID");
        assert_eq!(value["Number_of_Adults"], 2);
        assert_eq!(value["Total_Price"], 900);
        // Absent optionals are omitted, not null.
        assert!(value.get("Room").is_none());
        assert!(value.get("Voucher_code").is_none());
    }

    #[test]
    fn test_booking_optionals_serialize_when_set() {
        let mut record = booking();
        record.room = Some("zr-1".to_string());
        record.voucher_code = Some("SPRING10".to_string());
        record.discount_amount = Some(90);
        let value = record.into_value().unwrap();
        assert_eq!(value["Room"], "zr-1");
        assert_eq!(value["Voucher_code"], "SPRING10");
        assert_eq!(value["Discount_amount"], 90);
    }

    #[test]
    fn test_booking_rejects_inconsistent_amounts() {
        let mut record = booking();
        record.deposit_amount = 100;
        assert!(record.into_value().is_err());
    }

    #[test]
    fn test_booking_rejects_reversed_dates() {
        let mut record = booking();
        record.check_out = date("2026-03-09");
        assert!(record.into_value().is_err());
    }

    #[test]
    fn test_booking_rejects_bad_email() {
        let mut record = booking();
        record.email = "nope".to_string();
        assert!(record.into_value().is_err());
    }

    #[test]
    fn test_voucher_record() {
        let value = VoucherRecord::active("GIFT-500", "buyer@example.com", Some("Jan"), date("2027-03-10"))
            .into_value()
            .unwrap();
        assert_eq!(value["Status"], "Active");
        assert_eq!(value["Description"], "Voucher Code: GIFT-500");
        assert_eq!(value["Expiration_Date"], "2027-03-10");
        assert_eq!(value["Recipient_Name"], "Jan");
    }

    #[test]
    fn test_adoption_record_converts_minor_units() {
        let value = AdoptionRecord::paid("Misia", "gold", "fan@example.com", 15000, "cs_123", date("2026-03-10"))
            .into_value()
            .unwrap();
        assert_eq!(value["Name"], "Adoption - Misia");
        assert_eq!(value["Amount_Paid"], 150.0);
        assert_eq!(value["Status"], "Paid");
        assert!(value.get("Client").is_none());
    }

    #[test]
    fn test_contact_requires_valid_email() {
        let record = ContactRecord {
            email: "not-an-email".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
        };
        assert!(record.into_value().is_err());
    }
}
