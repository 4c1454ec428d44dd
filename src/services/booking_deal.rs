//! Creation and lifecycle of the CRM booking deal; the durable record
//! behind every reservation attempt. The deal is created before any
//! payment artifact exists, so a charge can never happen without a
//! durable trace.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::models::Child;
use crate::services::crm::records::{BookingRecord, ContactRecord};
use crate::services::crm::{Crm, CrmModule};
use crate::services::intent::IntentRequest;

#[derive(Debug, Clone)]
pub struct DealOutcome {
    /// Human-facing reference, shared verbatim across CRM, payment
    /// metadata, and the PMS. Minted by the CRM; immutable once issued.
    pub booking_ref: String,
    pub deal_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    DepositPaid,
    BalancePending,
    FullyPaid,
    PaymentFailed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::DepositPaid => "DEPOSIT_PAID",
            BookingStatus::BalancePending => "BALANCE_PENDING",
            BookingStatus::FullyPaid => "FULLY_PAID",
            BookingStatus::PaymentFailed => "PAYMENT_FAILED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Find a contact by email or create one. Best-effort: a missing link
/// degrades the deal, it does not block the booking.
async fn find_or_create_contact(
    crm: &dyn Crm,
    email: &str,
    name: &str,
    phone: &str,
) -> Option<String> {
    let criteria = format!("(Email:equals:{email})");
    match crm.search_records(CrmModule::Contacts, &criteria).await {
        Ok(records) => {
            if let Some(id) = records.first().and_then(|r| r["id"].as_str()) {
                return Some(id.to_string());
            }
        }
        Err(e) => {
            tracing::warn!(email, error = %e, "contact lookup failed; creating without search");
        }
    }

    let mut parts = name.trim().split_whitespace();
    let first_name = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    let last_name = if rest.is_empty() { first_name.clone() } else { rest };

    let record = ContactRecord {
        email: email.to_string(),
        first_name: Some(first_name),
        last_name: Some(last_name),
        phone: (!phone.is_empty()).then(|| phone.to_string()),
    };
    let value = match record.into_value() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(email, error = %e, "invalid contact payload; booking proceeds unlinked");
            return None;
        }
    };
    match crm.create_record(CrmModule::Contacts, value).await {
        Ok(created) => Some(created.id),
        Err(e) => {
            tracing::warn!(email, error = %e, "contact creation failed; booking proceeds unlinked");
            None
        }
    }
}

/// Resolve the CRM Room record for a PMS room id. Best-effort.
async fn lookup_room(crm: &dyn Crm, pms_room_id: &str) -> Option<String> {
    let criteria = format!("(Beds24_Room_ID:equals:{pms_room_id})");
    match crm.search_records(CrmModule::Rooms, &criteria).await {
        Ok(records) => records
            .first()
            .and_then(|r| r["id"].as_str())
            .map(|s| s.to_string()),
        Err(e) => {
            tracing::warn!(pms_room_id, error = %e, "room lookup failed; storing name only");
            None
        }
    }
}

fn children_summary(children: &[Child]) -> String {
    if children.is_empty() {
        return "No children".to_string();
    }
    children
        .iter()
        .enumerate()
        .map(|(i, c)| format!("Child {}: {}y", i + 1, c.age))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create the booking deal for a validated intent request. Errors here
/// abort the whole intent call; see the orchestration in
/// [`crate::services::intent`].
pub async fn create_booking_deal(crm: &dyn Crm, req: &IntentRequest) -> anyhow::Result<DealOutcome> {
    let check_in = req
        .check_in
        .ok_or_else(|| anyhow::anyhow!("missing check-in date"))?;
    let check_out = req
        .check_out
        .ok_or_else(|| anyhow::anyhow!("missing check-out date"))?;
    let room_id = req
        .room_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("missing room id"))?;

    let guest = find_or_create_contact(crm, &req.guest_email, &req.guest_name, &req.guest_phone).await;
    let room = lookup_room(crm, room_id).await;

    let record = BookingRecord {
        check_in,
        check_out,
        nights: req.nights,
        booking_status: "DEPOSIT_PAID".to_string(),
        payment_status: "Deposit Paid".to_string(),
        channel: "Website".to_string(),
        payment_method: "Stripe".to_string(),
        booking_notes: req.special_requests.clone().unwrap_or_default(),
        arrival_time: "15:00".to_string(),
        email: req.guest_email.clone(),
        adults: req.adults,
        children: req.children.len() as u32,
        guest_ages: children_summary(&req.children),
        total_price: req.total_amount,
        deposit_amount: req.deposit_amount,
        balance_amount: req.balance_amount,
        nip_number: req.nip_number.clone().unwrap_or_default(),
        locale: req.locale.clone(),
        room,
        guest,
        voucher_code: req.voucher_code.clone(),
        discount_amount: req.voucher_code.is_some().then(|| req.voucher_amount.unwrap_or(0)),
        stripe_deposit_id: None,
        stripe_customer_id: None,
        stripe_payment_method_id: None,
    };

    let created = crm
        .create_record(CrmModule::Bookings, record.into_value()?)
        .await?;

    let booking_ref = created.name.clone().unwrap_or_else(|| {
        let tail: String = created
            .id
            .chars()
            .rev()
            .take(6)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("ZAP-{tail}")
    });

    tracing::info!(deal_id = %created.id, booking_ref = %booking_ref, "created CRM booking deal");

    Ok(DealOutcome {
        booking_ref,
        deal_id: created.id,
    })
}

/// Move the deal to a new status, optionally merging extra fields (e.g.
/// Stripe identifiers once the deposit has settled).
pub async fn update_booking_status(
    crm: &dyn Crm,
    deal_id: &str,
    status: BookingStatus,
    extra_fields: Value,
) -> anyhow::Result<()> {
    let mut data = json!({ "Booking_status": status.as_str() });
    if let (Some(target), Some(extra)) = (data.as_object_mut(), extra_fields.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    crm.update_record(CrmModule::Bookings, deal_id, data).await
}

/// Mark a voucher redeemed against a deal. A voucher missing from the
/// CRM is logged and skipped, not an error; the charge already settled.
pub async fn redeem_voucher(
    crm: &dyn Crm,
    code: &str,
    deal_id: &str,
    redeemed_on: NaiveDate,
) -> anyhow::Result<()> {
    let criteria = format!("(Voucher_Code:equals:{code})");
    let records = crm.search_records(CrmModule::Vouchers, &criteria).await?;
    let Some(id) = records.first().and_then(|r| r["id"].as_str()) else {
        tracing::warn!(code, "voucher not found in CRM; skipping redemption");
        return Ok(());
    };

    crm.update_record(
        CrmModule::Vouchers,
        id,
        json!({
            "Status": "Redeemed",
            "Redeemed_Date": redeemed_on,
            "Booking_Deal_ID": deal_id,
        }),
    )
    .await
}
