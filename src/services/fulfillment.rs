//! Reacts to the payment processor's asynchronous events once the
//! signature has been verified. By the time an event arrives the charge
//! has already succeeded, so every branch here is best-effort: failures
//! are logged for manual reconciliation and never surfaced to the
//! processor (a non-2xx would only trigger retries of bookkeeping that
//! is not retriable).

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::models::Child;
use crate::services::booking_deal::{self, BookingStatus};
use crate::services::crm::records::{AdoptionRecord, VoucherRecord};
use crate::services::crm::CrmModule;
use crate::services::documents::VoucherDocument;
use crate::services::pms::PmsBookingRequest;
use crate::state::AppState;

const FALLBACK_BUYER_EMAIL: &str = "pending@stripe.com";

/// Purchased vouchers stay valid for twelve calendar months from the
/// purchase event.
pub(crate) fn voucher_expiry(purchased_on: NaiveDate) -> NaiveDate {
    purchased_on
        .checked_add_months(Months::new(12))
        .unwrap_or(purchased_on)
}

fn event_date(event: &Value) -> NaiveDate {
    event["created"]
        .as_i64()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.date_naive())
        .unwrap_or_else(|| Utc::now().date_naive())
}

/// Dispatch a verified event. Unrecognized types are logged and
/// accepted; the processor retries rejected deliveries indefinitely.
pub async fn handle_event(state: &AppState, event: &Value) {
    let event_type = event["type"].as_str().unwrap_or("");
    let occurred_on = event_date(event);

    match event_type {
        "checkout.session.completed" => {
            let session = &event["data"]["object"];

            if let Some(alpaca) = session["metadata"]["alpaca"].as_str() {
                if let Err(e) = fulfill_adoption(state, session, alpaca, occurred_on).await {
                    tracing::error!(alpaca, error = %e, "adoption fulfillment failed");
                }
            }

            if let Some(code) = session["metadata"]["voucherCode"].as_str() {
                fulfill_voucher_purchase(state, session, code, occurred_on).await;
            }
        }
        "payment_intent.succeeded" => {
            let intent = &event["data"]["object"];
            if intent["metadata"]["bookingRef"].as_str().is_some() {
                fulfill_booking(state, intent, occurred_on).await;
            } else {
                tracing::info!("payment_intent.succeeded without booking metadata; ignoring");
            }
        }
        other => {
            tracing::info!(event_type = other, "unhandled event type");
        }
    }
}

/// Mark the pending adoption paid. If the intermediate record never
/// made it, create a paid one directly from the session.
async fn fulfill_adoption(
    state: &AppState,
    session: &Value,
    alpaca: &str,
    occurred_on: NaiveDate,
) -> anyhow::Result<()> {
    let session_id = session["id"].as_str().unwrap_or_default();
    let criteria = format!("(Stripe_Session_ID:equals:{session_id})");
    let records = state.crm.search_records(CrmModule::Adoptions, &criteria).await?;

    if let Some(id) = records.first().and_then(|r| r["id"].as_str()) {
        state
            .crm
            .update_record(CrmModule::Adoptions, id, json!({ "Status": "Paid" }))
            .await?;
        tracing::info!(adoption_id = id, alpaca, "adoption marked paid");
        return Ok(());
    }

    let record = AdoptionRecord::paid(
        alpaca,
        session["metadata"]["tier"].as_str().unwrap_or_default(),
        session["customer_details"]["email"]
            .as_str()
            .unwrap_or(FALLBACK_BUYER_EMAIL),
        session["amount_total"].as_i64().unwrap_or(0),
        session_id,
        occurred_on,
    );
    let created = state
        .crm
        .create_record(CrmModule::Adoptions, record.into_value()?)
        .await?;
    tracing::info!(adoption_id = %created.id, alpaca, "created paid adoption record directly");
    Ok(())
}

/// Voucher purchase: sync the CRM and deliver the document. The two
/// halves are independently best-effort; a PDF failure must not undo
/// the CRM sync having been attempted, and vice versa.
async fn fulfill_voucher_purchase(state: &AppState, session: &Value, code: &str, occurred_on: NaiveDate) {
    let expiry = voucher_expiry(occurred_on);

    if let Err(e) = upsert_voucher(state, session, code, expiry).await {
        tracing::error!(code, error = %e, "voucher CRM sync failed");
    }

    if let Err(e) = send_voucher_document(state, session, code, expiry).await {
        tracing::error!(code, error = %e, "voucher document delivery failed");
    }
}

async fn upsert_voucher(
    state: &AppState,
    session: &Value,
    code: &str,
    expiry: NaiveDate,
) -> anyhow::Result<()> {
    let buyer_email = session["customer_details"]["email"]
        .as_str()
        .unwrap_or(FALLBACK_BUYER_EMAIL);
    let recipient = session["metadata"]["recipientName"].as_str();

    let criteria = format!("(Voucher_Code:equals:{code})");
    let existing = state.crm.search_records(CrmModule::Vouchers, &criteria).await?;

    if let Some(id) = existing.first().and_then(|r| r["id"].as_str()) {
        state
            .crm
            .update_record(
                CrmModule::Vouchers,
                id,
                json!({ "Status": "Active", "Expiration_Date": expiry }),
            )
            .await?;
        tracing::info!(code, voucher_id = id, "voucher reactivated in CRM");
    } else {
        let record = VoucherRecord::active(code, buyer_email, recipient, expiry);
        let created = state
            .crm
            .create_record(CrmModule::Vouchers, record.into_value()?)
            .await?;
        tracing::info!(code, voucher_id = %created.id, "voucher synced to CRM");
    }
    Ok(())
}

async fn send_voucher_document(
    state: &AppState,
    session: &Value,
    code: &str,
    expiry: NaiveDate,
) -> anyhow::Result<()> {
    let document = VoucherDocument {
        code: code.to_string(),
        amount: session["amount_total"].as_i64().unwrap_or(0) / 100,
        currency: session["currency"]
            .as_str()
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| "PLN".to_string()),
        buyer_name: session["customer_details"]["name"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        buyer_email: session["customer_details"]["email"]
            .as_str()
            .unwrap_or(FALLBACK_BUYER_EMAIL)
            .to_string(),
        recipient_name: session["metadata"]["recipientName"]
            .as_str()
            .map(|s| s.to_string()),
        expiry_date: expiry,
    };

    let generated = state.documents.voucher_pdf(&document).await?;
    // Sent to the internal admin address; a human forwards it.
    state
        .mailer
        .send_voucher_email(&state.config.admin_email, &document, &generated)
        .await?;
    tracing::info!(code, to = %state.config.admin_email, "voucher document emailed");
    Ok(())
}

/// A deposit settled: mirror the booking into the PMS, move the CRM deal
/// forward, and redeem any voucher. Each step independently best-effort.
async fn fulfill_booking(state: &AppState, intent: &Value, occurred_on: NaiveDate) {
    let meta = &intent["metadata"];
    let booking_ref = meta["bookingRef"].as_str().unwrap_or_default();
    let deal_id = meta["zohoBookingDealId"].as_str().unwrap_or_default();

    match pms_request_from_intent(intent) {
        Ok(req) => match state.pms.create_booking(&req).await {
            Ok(result) => {
                tracing::info!(
                    booking_ref,
                    beds24_id = ?result.beds24_booking_id,
                    balance_due = %result.balance_due_date,
                    "PMS booking created"
                );
            }
            Err(e) => tracing::error!(booking_ref, error = %e, "PMS booking creation failed"),
        },
        Err(e) => tracing::error!(booking_ref, error = %e, "unusable booking metadata"),
    }

    if deal_id.is_empty() {
        tracing::error!(booking_ref, "missing CRM deal id in intent metadata");
    } else {
        let extra = json!({
            "Payment_status": "Deposit Paid",
            "Stripe_Deposit_ID": intent["id"].as_str().unwrap_or_default(),
            "Stripe_Customer_ID": intent["customer"].as_str().unwrap_or_default(),
            "Stripe_Payment_Method_ID": intent["payment_method"].as_str().unwrap_or_default(),
        });
        if let Err(e) =
            booking_deal::update_booking_status(state.crm.as_ref(), deal_id, BookingStatus::DepositPaid, extra)
                .await
        {
            tracing::error!(booking_ref, deal_id, error = %e, "CRM status update failed");
        }
    }

    if let Some(code) = meta["voucherCode"].as_str().filter(|c| !c.is_empty()) {
        if let Err(e) =
            booking_deal::redeem_voucher(state.crm.as_ref(), code, deal_id, occurred_on).await
        {
            tracing::error!(booking_ref, code, error = %e, "voucher redemption failed");
        }
    }
}

/// Rebuild the PMS booking payload from intent metadata; the flattened
/// draft is the only record available at this point.
fn pms_request_from_intent(intent: &Value) -> anyhow::Result<PmsBookingRequest> {
    let meta = &intent["metadata"];
    let str_field = |key: &str| meta[key].as_str().unwrap_or_default().to_string();
    let amount = |key: &str| meta[key].as_str().and_then(|v| v.parse::<i64>().ok()).unwrap_or(0);

    let check_in: NaiveDate = meta["checkIn"]
        .as_str()
        .unwrap_or_default()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid checkIn in metadata"))?;
    let check_out: NaiveDate = meta["checkOut"]
        .as_str()
        .unwrap_or_default()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid checkOut in metadata"))?;

    let children: Vec<Child> = meta["childrenJson"]
        .as_str()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();

    let optional = |key: &str| {
        meta[key]
            .as_str()
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };

    Ok(PmsBookingRequest {
        booking_ref: str_field("bookingRef"),
        crm_deal_id: str_field("zohoBookingDealId"),
        room_id: str_field("roomId"),
        check_in,
        check_out,
        guest_name: str_field("guestName"),
        guest_email: str_field("guestEmail"),
        guest_phone: str_field("guestPhone"),
        adults: meta["adults"]
            .as_str()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2),
        children,
        special_requests: optional("specialRequests"),
        nip_number: optional("nipNumber"),
        voucher_code: optional("voucherCode"),
        voucher_amount: optional("voucherAmount").and_then(|v| v.parse().ok()),
        deposit_amount: amount("depositAmount"),
        balance_amount: amount("balanceAmount"),
        stripe_deposit_id: intent["id"].as_str().unwrap_or_default().to_string(),
        stripe_customer_id: intent["customer"].as_str().unwrap_or_default().to_string(),
        stripe_payment_method_id: intent["payment_method"].as_str().map(|s| s.to_string()),
        locale: meta["locale"].as_str().unwrap_or("pl").to_string(),
        source: "alpaca-site".to_string(),
    })
}
