pub mod beds;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AvailabilityResult, Child, RoomImage, RoomImageKind};

fn booking_source() -> String {
    "alpaca-site".to_string()
}

/// Booking payload mirrored into the property manager once the deposit
/// has been taken. The PMS blocks the OTA calendar from this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmsBookingRequest {
    /// Same reference in the CRM, the PMS, and the guest's email.
    pub booking_ref: String,
    #[serde(rename = "zohoBookingDealId")]
    pub crm_deal_id: String,
    pub room_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub adults: u32,
    pub children: Vec<Child>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nip_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_amount: Option<i64>,
    pub deposit_amount: i64,
    pub balance_amount: i64,
    pub stripe_deposit_id: String,
    pub stripe_customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_payment_method_id: Option<String>,
    pub locale: String,
    #[serde(default = "booking_source")]
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmsBookingResult {
    pub booking_ref: String,
    /// None when the downstream calendar was temporarily unreachable;
    /// non-fatal, the PMS reconciles later.
    pub beds24_booking_id: Option<String>,
    pub status: String,
    pub nights: i64,
    /// Check-in minus three days; the balance charge runs then.
    pub balance_due_date: NaiveDate,
}

#[async_trait]
pub trait Pms: Send + Sync {
    async fn availability(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> anyhow::Result<AvailabilityResult>;

    async fn room_images(
        &self,
        room_id: &str,
        kind: Option<RoomImageKind>,
    ) -> anyhow::Result<Vec<RoomImage>>;

    async fn create_booking(&self, req: &PmsBookingRequest) -> anyhow::Result<PmsBookingResult>;

    async fn cancel_booking(&self, booking_ref: &str) -> anyhow::Result<()>;
}
