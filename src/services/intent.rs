//! The booking-intent orchestration: one strictly sequential pass that
//! turns a completed draft into a CRM deal plus a payment handle.
//!
//! Ordering is the contract. The CRM deal comes first so that no charge
//! can ever exist without a durable record; a later payment-processor
//! failure leaves an orphaned deal behind for manual reconciliation
//! instead of rolling anything back. There are no retries and no
//! idempotency key; a client retry creates a second deal (known gap,
//! see DESIGN.md).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Child;
use crate::services::booking_deal::{self, DealOutcome};
use crate::services::payments::{CustomerParams, PaymentIntentParams};
use crate::state::AppState;

fn default_adults() -> u32 {
    2
}

fn default_locale() -> String {
    "pl".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub room_name: String,
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub nights: i64,
    #[serde(default)]
    pub deposit_amount: i64,
    #[serde(default)]
    pub balance_amount: i64,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub guest_name: String,
    #[serde(default)]
    pub guest_email: String,
    #[serde(default)]
    pub guest_phone: String,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub nip_number: Option<String>,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub voucher_amount: Option<i64>,
    #[serde(default = "default_locale")]
    pub locale: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
    /// Shown to the guest before payment; quotable even if the charge
    /// is abandoned.
    pub booking_ref: String,
}

pub async fn create_intent(state: &AppState, req: &IntentRequest) -> Result<IntentResponse, AppError> {
    // ── Step 1: validate ──
    if req.room_id.is_none()
        || req.check_in.is_none()
        || req.check_out.is_none()
        || req.guest_email.is_empty()
        || req.guest_name.is_empty()
    {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    if req.deposit_amount < 1 {
        return Err(AppError::Validation(
            "Deposit amount must be positive".to_string(),
        ));
    }

    // ── Step 2: CRM deal, before any payment artifact ──
    let deal = booking_deal::create_booking_deal(state.crm.as_ref(), req)
        .await
        .map_err(|e| AppError::Crm(e.to_string()))?;

    // ── Step 3: resolve or create the processor customer ──
    let customer_id = match state
        .payments
        .find_customer_by_email(&req.guest_email)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?
    {
        Some(id) => id,
        None => state
            .payments
            .create_customer(CustomerParams {
                email: req.guest_email.clone(),
                name: req.guest_name.clone(),
                phone: req.guest_phone.clone(),
                metadata: vec![
                    ("locale".to_string(), req.locale.clone()),
                    ("bookingRef".to_string(), deal.booking_ref.clone()),
                ],
            })
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?,
    };

    // ── Step 4: payment intent for the deposit ──
    let check_in = req.check_in.unwrap_or_default();
    let check_out = req.check_out.unwrap_or_default();
    let description = format!(
        "Deposit: {} {}–{} [{}]",
        req.room_name, check_in, check_out, deal.booking_ref
    );
    let handle = state
        .payments
        .create_payment_intent(PaymentIntentParams {
            amount_minor: req.deposit_amount * 100,
            currency: state.config.currency.clone(),
            customer_id,
            description,
            save_payment_method: true,
            metadata: intent_metadata(req, &deal),
        })
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    tracing::info!(
        booking_ref = %deal.booking_ref,
        deal_id = %deal.deal_id,
        intent_id = %handle.id,
        deposit = req.deposit_amount,
        "booking intent prepared"
    );

    // ── Step 5: hand back the payment handle and the reference ──
    Ok(IntentResponse {
        client_secret: handle.client_secret,
        booking_ref: deal.booking_ref,
    })
}

/// Flatten the whole draft into intent metadata. This is the only
/// per-guest record inside the payment processor and is used for manual
/// reconciliation if the CRM write partially failed.
fn intent_metadata(req: &IntentRequest, deal: &DealOutcome) -> Vec<(String, String)> {
    let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    vec![
        ("type".to_string(), "booking_deposit".to_string()),
        ("bookingRef".to_string(), deal.booking_ref.clone()),
        ("zohoBookingDealId".to_string(), deal.deal_id.clone()),
        ("roomId".to_string(), req.room_id.clone().unwrap_or_default()),
        ("roomName".to_string(), req.room_name.clone()),
        ("checkIn".to_string(), date(req.check_in)),
        ("checkOut".to_string(), date(req.check_out)),
        ("nights".to_string(), req.nights.to_string()),
        ("depositAmount".to_string(), req.deposit_amount.to_string()),
        ("balanceAmount".to_string(), req.balance_amount.to_string()),
        ("totalAmount".to_string(), req.total_amount.to_string()),
        ("adults".to_string(), req.adults.to_string()),
        (
            "childrenJson".to_string(),
            serde_json::to_string(&req.children).unwrap_or_else(|_| "[]".to_string()),
        ),
        ("guestName".to_string(), req.guest_name.clone()),
        ("guestEmail".to_string(), req.guest_email.clone()),
        ("guestPhone".to_string(), req.guest_phone.clone()),
        (
            "specialRequests".to_string(),
            req.special_requests.clone().unwrap_or_default(),
        ),
        ("nipNumber".to_string(), req.nip_number.clone().unwrap_or_default()),
        ("voucherCode".to_string(), req.voucher_code.clone().unwrap_or_default()),
        (
            "voucherAmount".to_string(),
            req.voucher_amount.unwrap_or(0).to_string(),
        ),
        ("locale".to_string(), req.locale.clone()),
    ]
}
