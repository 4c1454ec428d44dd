//! The booking wizard as an explicit finite-state machine, independent of
//! any UI. A frontend drives it step by step; the guards here are the
//! contract for what each forward transition requires.
//!
//! Steps are linear with no skipping forward. Backward transitions are
//! allowed from every step except `Dates` and `Confirmed`. Forward
//! transitions emit best-effort analytics events through the injected
//! sink.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde_json::json;

use crate::analytics::AnalyticsSink;
use crate::models::{email_is_valid, phone_is_valid, BookingDraft, Child, SelectedRoom, VoucherValidation};
use crate::pricing::{self, Discount};
use crate::services::intent::IntentRequest;

/// Minimum stay across all rooms; individual rooms may require more.
const MIN_STAY_NIGHTS: i64 = 2;
/// After this local hour, the earliest check-in moves one day further
/// out so staff have lead time to prepare the room.
const BOOKING_CUTOFF_HOUR: u32 = 13;
/// Oldest accepted child age; older guests count as adults.
const MAX_CHILD_AGE: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Dates,
    Room,
    Guests,
    Extras,
    Summary,
    Payment,
    Confirmed,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("select check-in and check-out dates first")]
    DatesIncomplete,

    #[error("check-out must be after check-in")]
    CheckOutNotAfterCheckIn,

    #[error("earliest available check-in is {earliest}")]
    CheckInTooSoon { earliest: NaiveDate },

    #[error("minimum stay is {min} nights")]
    StayTooShort { min: i64 },

    #[error("select a room first")]
    NoRoomSelected,

    #[error("room price is unavailable; this room cannot be booked online")]
    PriceUnresolved,

    #[error("guest details are incomplete or invalid")]
    GuestDetailsInvalid,

    #[error("cannot go back from this step")]
    BackNotAllowed,

    #[error("cannot advance from this step")]
    AdvanceNotAllowed,
}

/// Earliest selectable check-in date: tomorrow, or the day after
/// tomorrow once the current time is at or past the cutoff.
pub fn earliest_check_in(now: NaiveDateTime) -> NaiveDate {
    let lead_days = if now.hour() >= BOOKING_CUTOFF_HOUR { 2 } else { 1 };
    now.date() + Duration::days(lead_days)
}

pub struct Wizard {
    step: Step,
    draft: BookingDraft,
    voucher: Option<Discount>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl Wizard {
    pub fn new(analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            step: Step::Dates,
            draft: BookingDraft::default(),
            voucher: None,
            analytics,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    // ── Date selection ──

    pub fn set_check_in(&mut self, date: NaiveDate) {
        self.draft.check_in = Some(date);
        // A check-out at or before the new check-in is stale; clear it.
        if matches!(self.draft.check_out, Some(co) if co <= date) {
            self.draft.check_out = None;
        }
        self.recompute_nights();
        self.invalidate_room();
    }

    pub fn set_check_out(&mut self, date: NaiveDate) -> Result<(), WizardError> {
        let check_in = self.draft.check_in.ok_or(WizardError::DatesIncomplete)?;
        if date <= check_in {
            return Err(WizardError::CheckOutNotAfterCheckIn);
        }
        self.draft.check_out = Some(date);
        self.recompute_nights();
        self.invalidate_room();
        Ok(())
    }

    fn recompute_nights(&mut self) {
        self.draft.nights = match (self.draft.check_in, self.draft.check_out) {
            (Some(ci), Some(co)) => (co - ci).num_days(),
            _ => 0,
        };
    }

    /// Any date change makes the previously selected room (and every
    /// amount derived from it) stale: availability must be re-fetched.
    fn invalidate_room(&mut self) {
        if self.draft.room.is_some() {
            self.draft.room = None;
            self.recompute_amounts();
        }
    }

    // ── Room selection ──

    pub fn select_room(&mut self, room: SelectedRoom) {
        self.analytics.emit(
            "select_item",
            json!({
                "item_id": room.id.clone(),
                "item_name": room.name.clone(),
                "price": room.total_price,
                "nights": room.nights,
                "currency": room.currency.clone(),
            }),
        );
        self.draft.room = Some(room);
        self.recompute_amounts();
    }

    // ── Guest details ──

    pub fn set_guest_details(&mut self, name: &str, email: &str, phone: &str) {
        self.draft.guest_name = name.trim().to_string();
        self.draft.guest_email = email.trim().to_string();
        self.draft.guest_phone = phone.trim().to_string();
    }

    pub fn set_adults(&mut self, adults: u32) {
        self.draft.adults = adults;
    }

    pub fn set_children(&mut self, children: Vec<Child>) {
        self.draft.children = children;
    }

    pub fn set_special_requests(&mut self, text: &str) {
        self.draft.special_requests = text.to_string();
    }

    pub fn set_nip_number(&mut self, nip: &str) {
        self.draft.nip_number = nip.trim().to_string();
    }

    // ── Voucher ──

    /// Apply a validated voucher. Rejected validations clear any
    /// previously applied discount instead; totals on screen are never
    /// left stale.
    pub fn apply_voucher(&mut self, validation: &VoucherValidation) {
        if !validation.valid {
            self.clear_voucher();
            return;
        }
        self.draft.voucher_code = validation.code.clone();
        self.draft.voucher_valid = true;
        self.draft.voucher_discount_type = validation.discount_type;
        self.voucher = Some(Discount {
            kind: validation.discount_type,
            value: validation.discount_value,
        });
        self.recompute_amounts();
        self.analytics.emit(
            "voucher_applied",
            json!({
                "code": self.draft.voucher_code.clone(),
                "discount": self.draft.voucher_discount,
            }),
        );
    }

    pub fn clear_voucher(&mut self) {
        self.draft.voucher_code.clear();
        self.draft.voucher_valid = false;
        self.voucher = None;
        self.recompute_amounts();
    }

    /// Re-derive every money field from the current room and voucher.
    fn recompute_amounts(&mut self) {
        let total = self.draft.room.as_ref().map(|r| r.total_price).unwrap_or(0);
        let q = pricing::quote(total, self.voucher);
        self.draft.total_amount = q.discounted_total;
        self.draft.voucher_discount = q.discount_amount;
        self.draft.deposit_amount = q.deposit_amount;
        self.draft.balance_amount = q.balance_amount;
    }

    // ── Transitions ──

    /// Move one step forward if the current step's guard passes. `now`
    /// feeds the check-in lead-time rule and is otherwise unused.
    pub fn advance(&mut self, now: NaiveDateTime) -> Result<Step, WizardError> {
        match self.step {
            Step::Dates => {
                let check_in = self.draft.check_in.ok_or(WizardError::DatesIncomplete)?;
                self.draft.check_out.ok_or(WizardError::DatesIncomplete)?;
                if self.draft.nights < MIN_STAY_NIGHTS {
                    return Err(WizardError::StayTooShort { min: MIN_STAY_NIGHTS });
                }
                let earliest = earliest_check_in(now);
                if check_in < earliest {
                    return Err(WizardError::CheckInTooSoon { earliest });
                }
                self.step = Step::Room;
                self.analytics.emit(
                    "begin_checkout",
                    json!({
                        "check_in_date": check_in,
                        "check_out_date": self.draft.check_out,
                        "nights": self.draft.nights,
                    }),
                );
            }
            Step::Room => {
                let room = self.draft.room.as_ref().ok_or(WizardError::NoRoomSelected)?;
                if room.total_price <= 0 {
                    return Err(WizardError::PriceUnresolved);
                }
                if self.draft.nights < room.min_nights {
                    return Err(WizardError::StayTooShort { min: room.min_nights });
                }
                let payload = json!({
                    "item_id": room.id.clone(),
                    "item_name": room.name.clone(),
                    "value": self.draft.total_amount,
                    "deposit_amount": self.draft.deposit_amount,
                    "nights": self.draft.nights,
                });
                self.step = Step::Guests;
                self.analytics.emit("add_to_cart", payload);
            }
            Step::Guests => {
                let d = &self.draft;
                let guests_ok = !d.guest_name.is_empty()
                    && email_is_valid(&d.guest_email)
                    && phone_is_valid(&d.guest_phone)
                    && d.adults >= 1
                    && d.children.iter().all(|c| c.age <= MAX_CHILD_AGE);
                if !guests_ok {
                    return Err(WizardError::GuestDetailsInvalid);
                }
                self.step = Step::Extras;
            }
            Step::Extras => {
                self.step = Step::Summary;
            }
            Step::Summary => {
                // Price-on-request rooms (zero amounts) stop here.
                if self.draft.deposit_amount <= 0 {
                    return Err(WizardError::PriceUnresolved);
                }
                let room = self.draft.room.as_ref().ok_or(WizardError::NoRoomSelected)?;
                let payload = json!({
                    "item_id": room.id.clone(),
                    "item_name": room.name.clone(),
                    "value": self.draft.total_amount,
                    "deposit_amount": self.draft.deposit_amount,
                });
                self.step = Step::Payment;
                self.analytics.emit("add_payment_info", payload);
            }
            // Payment completes only through `confirm_paid`.
            Step::Payment | Step::Confirmed => return Err(WizardError::AdvanceNotAllowed),
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> Result<Step, WizardError> {
        self.step = match self.step {
            Step::Dates | Step::Confirmed => return Err(WizardError::BackNotAllowed),
            Step::Room => Step::Dates,
            Step::Guests => Step::Room,
            Step::Extras => Step::Guests,
            Step::Summary => Step::Extras,
            Step::Payment => Step::Summary,
        };
        Ok(self.step)
    }

    /// Complete the flow after the processor confirmed the charge.
    pub fn confirm_paid(&mut self, payment_intent_id: &str) -> Result<Step, WizardError> {
        if self.step != Step::Payment {
            return Err(WizardError::AdvanceNotAllowed);
        }
        self.step = Step::Confirmed;
        let room = self.draft.room.as_ref();
        self.analytics.emit(
            "purchase",
            json!({
                "booking_ref": payment_intent_id,
                "item_id": room.map(|r| r.id.clone()),
                "item_name": room.map(|r| r.name.clone()),
                "value": self.draft.total_amount,
                "deposit_amount": self.draft.deposit_amount,
                "nights": self.draft.nights,
                "check_in": self.draft.check_in,
                "check_out": self.draft.check_out,
            }),
        );
        Ok(self.step)
    }

    pub fn payment_failed(&self, error: &str) {
        self.analytics.emit(
            "payment_failed",
            json!({
                "item_name": self.draft.room.as_ref().map(|r| r.name.clone()),
                "error": error,
            }),
        );
    }

    /// Build the booking-intent request body from the draft. Only valid
    /// once the guest has reached the summary.
    pub fn intent_request(&self, locale: &str) -> Result<IntentRequest, WizardError> {
        if !matches!(self.step, Step::Summary | Step::Payment) {
            return Err(WizardError::AdvanceNotAllowed);
        }
        let d = &self.draft;
        let room = d.room.as_ref().ok_or(WizardError::NoRoomSelected)?;
        let some_if_filled = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Ok(IntentRequest {
            room_id: some_if_filled(&room.id),
            room_name: room.name.clone(),
            check_in: d.check_in,
            check_out: d.check_out,
            nights: d.nights,
            deposit_amount: d.deposit_amount,
            balance_amount: d.balance_amount,
            total_amount: d.total_amount,
            adults: d.adults,
            children: d.children.clone(),
            guest_name: d.guest_name.clone(),
            guest_email: d.guest_email.clone(),
            guest_phone: d.guest_phone.clone(),
            special_requests: some_if_filled(&d.special_requests),
            nip_number: some_if_filled(&d.nip_number),
            voucher_code: d.voucher_valid.then(|| d.voucher_code.clone()),
            voucher_amount: d.voucher_valid.then_some(d.voucher_discount),
            locale: locale.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscountType;
    use std::sync::Mutex;

    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn names(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AnalyticsSink for RecordingSink {
        fn emit(&self, event: &str, _payload: serde_json::Value) {
            self.events.lock().unwrap().push(event.to_string());
        }
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn noon(s: &str) -> NaiveDateTime {
        d(s).and_hms_opt(12, 0, 0).unwrap()
    }

    fn garden_room() -> SelectedRoom {
        SelectedRoom {
            id: "room-garden".to_string(),
            name: "Garden Room".to_string(),
            max_adults: 2,
            max_children: 1,
            min_nights: 2,
            total_price: 660,
            price_per_night: 330,
            currency: "PLN".to_string(),
            nights: 2,
        }
    }

    fn wizard() -> (Wizard, Arc<RecordingSink>) {
        let sink = RecordingSink::new();
        (Wizard::new(sink.clone()), sink)
    }

    /// Drive a wizard to the guests step with valid dates and a room.
    fn wizard_at_guests() -> (Wizard, Arc<RecordingSink>) {
        let (mut w, sink) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-12")).unwrap();
        w.advance(noon("2026-03-01")).unwrap();
        w.select_room(garden_room());
        w.advance(noon("2026-03-01")).unwrap();
        (w, sink)
    }

    #[test]
    fn test_earliest_check_in_before_cutoff() {
        let now = d("2026-03-01").and_hms_opt(12, 59, 0).unwrap();
        assert_eq!(earliest_check_in(now), d("2026-03-02"));
    }

    #[test]
    fn test_earliest_check_in_at_cutoff() {
        let now = d("2026-03-01").and_hms_opt(13, 0, 0).unwrap();
        assert_eq!(earliest_check_in(now), d("2026-03-03"));
    }

    #[test]
    fn test_one_night_rejected_two_accepted() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-11")).unwrap();
        assert_eq!(
            w.advance(noon("2026-03-01")),
            Err(WizardError::StayTooShort { min: 2 })
        );

        w.set_check_out(d("2026-03-12")).unwrap();
        assert_eq!(w.advance(noon("2026-03-01")), Ok(Step::Room));
    }

    #[test]
    fn test_check_in_too_soon_rejected() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-02"));
        w.set_check_out(d("2026-03-04")).unwrap();
        // At 13:00 the earliest check-in moves to 2026-03-03.
        let res = w.advance(d("2026-03-01").and_hms_opt(13, 0, 0).unwrap());
        assert_eq!(
            res,
            Err(WizardError::CheckInTooSoon {
                earliest: d("2026-03-03")
            })
        );
    }

    #[test]
    fn test_check_out_not_after_check_in_rejected() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        assert_eq!(
            w.set_check_out(d("2026-03-10")),
            Err(WizardError::CheckOutNotAfterCheckIn)
        );
        assert_eq!(
            w.set_check_out(d("2026-03-09")),
            Err(WizardError::CheckOutNotAfterCheckIn)
        );
    }

    #[test]
    fn test_moving_check_in_past_check_out_clears_it() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-12")).unwrap();
        w.set_check_in(d("2026-03-12"));
        assert_eq!(w.draft().check_out, None);
        assert_eq!(w.draft().nights, 0);
    }

    #[test]
    fn test_date_change_invalidates_room_and_amounts() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-12")).unwrap();
        w.advance(noon("2026-03-01")).unwrap();
        w.select_room(garden_room());
        assert_eq!(w.draft().deposit_amount, 66);

        w.set_check_in(d("2026-03-11"));
        assert!(w.draft().room.is_none());
        assert_eq!(w.draft().deposit_amount, 0);
        assert_eq!(w.draft().total_amount, 0);
        assert_eq!(w.draft().balance_amount, 0);
    }

    #[test]
    fn test_room_selection_computes_ten_percent_deposit() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-12")).unwrap();
        w.advance(noon("2026-03-01")).unwrap();
        w.select_room(garden_room());
        let draft = w.draft();
        assert_eq!(draft.total_amount, 660);
        assert_eq!(draft.deposit_amount, 66);
        assert_eq!(draft.balance_amount, 594);
    }

    #[test]
    fn test_unpriced_room_blocks_advance() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-12")).unwrap();
        w.advance(noon("2026-03-01")).unwrap();
        let mut room = garden_room();
        room.total_price = 0;
        w.select_room(room);
        assert_eq!(
            w.advance(noon("2026-03-01")),
            Err(WizardError::PriceUnresolved)
        );
    }

    #[test]
    fn test_room_min_nights_enforced() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-12")).unwrap();
        w.advance(noon("2026-03-01")).unwrap();
        let mut room = garden_room();
        room.min_nights = 3;
        w.select_room(room);
        assert_eq!(
            w.advance(noon("2026-03-01")),
            Err(WizardError::StayTooShort { min: 3 })
        );
    }

    #[test]
    fn test_guest_guards() {
        let (mut w, _) = wizard_at_guests();
        let now = noon("2026-03-01");

        assert_eq!(w.advance(now), Err(WizardError::GuestDetailsInvalid));

        w.set_guest_details("Anna Kowalska", "not-an-email", "+48 123 456 789");
        assert_eq!(w.advance(now), Err(WizardError::GuestDetailsInvalid));

        w.set_guest_details("Anna Kowalska", "anna@example.com", "12");
        assert_eq!(w.advance(now), Err(WizardError::GuestDetailsInvalid));

        w.set_guest_details("Anna Kowalska", "anna@example.com", "+48 123 456 789");
        w.set_adults(0);
        assert_eq!(w.advance(now), Err(WizardError::GuestDetailsInvalid));

        w.set_adults(2);
        w.set_children(vec![Child { age: 16 }]);
        assert_eq!(w.advance(now), Err(WizardError::GuestDetailsInvalid));

        w.set_children(vec![Child { age: 4 }, Child { age: 15 }]);
        assert_eq!(w.advance(now), Ok(Step::Extras));
    }

    #[test]
    fn test_voucher_apply_and_clear_recompute_amounts() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-13")).unwrap();
        w.advance(noon("2026-03-01")).unwrap();
        let mut room = garden_room();
        room.total_price = 900;
        room.nights = 3;
        w.select_room(room);
        assert_eq!(w.draft().deposit_amount, 90);

        w.apply_voucher(&VoucherValidation {
            valid: true,
            code: "SPRING10".to_string(),
            discount_type: DiscountType::Percent,
            discount_value: 10,
            description: None,
            error: None,
        });
        let draft = w.draft();
        assert_eq!(draft.voucher_discount, 90);
        assert_eq!(draft.total_amount, 810);
        assert_eq!(draft.deposit_amount, 243);
        assert_eq!(draft.balance_amount, 567);

        w.clear_voucher();
        let draft = w.draft();
        assert_eq!(draft.voucher_discount, 0);
        assert_eq!(draft.total_amount, 900);
        assert_eq!(draft.deposit_amount, 90);
        assert_eq!(draft.balance_amount, 810);
    }

    #[test]
    fn test_rejected_voucher_clears_previous_discount() {
        let (mut w, _) = wizard();
        w.set_check_in(d("2026-03-10"));
        w.set_check_out(d("2026-03-12")).unwrap();
        w.advance(noon("2026-03-01")).unwrap();
        w.select_room(garden_room());
        w.apply_voucher(&VoucherValidation {
            valid: true,
            code: "GIFT100".to_string(),
            discount_type: DiscountType::Fixed,
            discount_value: 100,
            description: None,
            error: None,
        });
        assert_eq!(w.draft().voucher_discount, 100);

        w.apply_voucher(&VoucherValidation::rejected("NOPE", "Voucher code not found"));
        assert!(!w.draft().voucher_valid);
        assert_eq!(w.draft().voucher_discount, 0);
        assert_eq!(w.draft().deposit_amount, 66);
    }

    #[test]
    fn test_back_transitions() {
        let (mut w, _) = wizard_at_guests();
        assert_eq!(w.back(), Ok(Step::Room));
        assert_eq!(w.back(), Ok(Step::Dates));
        assert_eq!(w.back(), Err(WizardError::BackNotAllowed));
    }

    #[test]
    fn test_full_flow_with_analytics_events() {
        let (mut w, sink) = wizard_at_guests();
        let now = noon("2026-03-01");
        w.set_guest_details("Anna Kowalska", "anna@example.com", "+48 123 456 789");
        w.advance(now).unwrap();
        w.advance(now).unwrap();
        assert_eq!(w.advance(now), Ok(Step::Payment));
        assert_eq!(w.confirm_paid("pi_123"), Ok(Step::Confirmed));
        assert_eq!(
            sink.names(),
            vec![
                "begin_checkout",
                "select_item",
                "add_to_cart",
                "add_payment_info",
                "purchase"
            ]
        );
        // Nothing moves past Confirmed.
        assert_eq!(w.advance(now), Err(WizardError::AdvanceNotAllowed));
        assert_eq!(w.back(), Err(WizardError::BackNotAllowed));
    }

    #[test]
    fn test_confirm_paid_only_from_payment() {
        let (mut w, _) = wizard_at_guests();
        assert_eq!(w.confirm_paid("pi_123"), Err(WizardError::AdvanceNotAllowed));
    }

    #[test]
    fn test_intent_request_built_from_summary() {
        let (mut w, _) = wizard_at_guests();
        let now = noon("2026-03-01");
        assert_eq!(w.intent_request("pl"), Err(WizardError::AdvanceNotAllowed));

        w.set_guest_details("Anna Kowalska", "anna@example.com", "+48 123 456 789");
        w.set_special_requests("late arrival, around 21:00");
        w.set_nip_number("1234567890");
        w.advance(now).unwrap();
        w.advance(now).unwrap();

        let req = w.intent_request("pl").unwrap();
        assert_eq!(req.room_id.as_deref(), Some("room-garden"));
        assert_eq!(req.check_in, Some(d("2026-03-10")));
        assert_eq!(req.nights, 2);
        assert_eq!(req.deposit_amount, 66);
        assert_eq!(req.balance_amount, 594);
        assert_eq!(req.total_amount, 660);
        assert_eq!(req.special_requests.as_deref(), Some("late arrival, around 21:00"));
        assert_eq!(req.nip_number.as_deref(), Some("1234567890"));
        assert_eq!(req.voucher_code, None);
        assert_eq!(req.locale, "pl");
    }

    #[test]
    fn test_payment_failed_emits_event_without_transition() {
        let (mut w, sink) = wizard_at_guests();
        let now = noon("2026-03-01");
        w.set_guest_details("Anna Kowalska", "anna@example.com", "+48 123 456 789");
        w.advance(now).unwrap();
        w.advance(now).unwrap();
        w.advance(now).unwrap();

        w.payment_failed("card_declined");
        assert_eq!(w.step(), Step::Payment);
        assert!(sink.names().contains(&"payment_failed".to_string()));
    }
}
