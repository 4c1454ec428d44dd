use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use super::{Pms, PmsBookingRequest, PmsBookingResult};
use crate::models::{
    AvailabilityResult, AvailableRoom, RoomImage, RoomImageKind, RoomPricing,
};

/// Beds25 client. With no API key configured it serves fixture data
/// matching the real response shapes, so the rest of the stack works in
/// development without ever erroring.
pub struct Beds25Client {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl Beds25Client {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn dev_mode(&self) -> bool {
        self.api_key.is_empty()
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Beds25 request failed: {path}"))?;
        Self::check(resp, path).await
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> anyhow::Result<Value> {
        let mut req = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("Beds25 request failed: {path}"))?;
        Self::check(resp, path).await
    }

    async fn check(resp: reqwest::Response, path: &str) -> anyhow::Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Beds25 API error {status} {path}: {body}");
        }
        resp.json()
            .await
            .with_context(|| format!("failed to parse Beds25 response for {path}"))
    }
}

fn fixture_room(id: &str, name: &str, capacity: u32, max_children: u32, base_price: i64, amenities: &[&str], nights: i64) -> AvailableRoom {
    AvailableRoom {
        id: id.to_string(),
        name: name.to_string(),
        capacity,
        max_adults: 2,
        max_children,
        min_nights: 2,
        base_price,
        amenities: amenities.iter().map(|a| a.to_string()).collect(),
        pricing: RoomPricing {
            nights,
            total_price: base_price * nights,
            average_per_night: base_price,
            currency: "PLN".to_string(),
            nightly_breakdown: Vec::new(),
        },
    }
}

fn fixture_availability(check_in: NaiveDate, check_out: NaiveDate) -> AvailabilityResult {
    let nights = (check_out - check_in).num_days();
    AvailabilityResult {
        check_in,
        check_out,
        nights,
        available_rooms: vec![
            fixture_room(
                "room-garden",
                "Garden Room",
                3,
                1,
                330,
                &["WIFI", "BREAKFAST", "PRIVATE_BATHROOM"],
                nights,
            ),
            fixture_room(
                "room-jungle",
                "Jungle Room",
                3,
                1,
                330,
                &["WIFI", "BREAKFAST", "PRIVATE_BATHROOM"],
                nights,
            ),
            fixture_room(
                "room-forest",
                "Forest Apartment",
                5,
                3,
                410,
                &["WIFI", "BREAKFAST", "KITCHEN", "SEPARATE_BEDROOM"],
                nights,
            ),
        ],
    }
}

#[async_trait]
impl Pms for Beds25Client {
    async fn availability(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> anyhow::Result<AvailabilityResult> {
        if self.dev_mode() {
            return Ok(fixture_availability(check_in, check_out));
        }

        let result = self
            .get(
                "/api/public/availability",
                &[
                    ("checkIn", check_in.to_string()),
                    ("checkOut", check_out.to_string()),
                ],
            )
            .await?;
        serde_json::from_value(result).context("unexpected Beds25 availability shape")
    }

    async fn room_images(
        &self,
        room_id: &str,
        kind: Option<RoomImageKind>,
    ) -> anyhow::Result<Vec<RoomImage>> {
        if self.dev_mode() {
            return Ok(vec![
                RoomImage {
                    id: "stub-1".to_string(),
                    url: "/images/rooms/hero.jpg".to_string(),
                    kind: RoomImageKind::Hero,
                    alt_text: Some("Room hero".to_string()),
                    sort_order: 0,
                },
                RoomImage {
                    id: "stub-2".to_string(),
                    url: "/images/rooms/gallery.jpg".to_string(),
                    kind: RoomImageKind::Gallery,
                    alt_text: Some("Room gallery".to_string()),
                    sort_order: 1,
                },
            ]);
        }

        let mut query = Vec::new();
        if let Some(kind) = kind {
            query.push(("type", serde_json::to_string(&kind)?.trim_matches('"').to_string()));
        }
        let result = self
            .get(&format!("/api/public/rooms/{room_id}/images"), &query)
            .await?;
        let images = result["images"].clone();
        serde_json::from_value(images).context("unexpected Beds25 images shape")
    }

    async fn create_booking(&self, req: &PmsBookingRequest) -> anyhow::Result<PmsBookingResult> {
        if self.dev_mode() {
            tracing::warn!("Beds25 API key not set; using stub booking creation");
            return Ok(PmsBookingResult {
                booking_ref: req.booking_ref.clone(),
                beds24_booking_id: Some("STUB-99999".to_string()),
                status: "DEPOSIT_PAID".to_string(),
                nights: (req.check_out - req.check_in).num_days(),
                balance_due_date: req.check_in - Duration::days(3),
            });
        }

        let body = serde_json::to_value(req)?;
        let result = self.post("/api/public/booking/create", Some(&body)).await?;
        serde_json::from_value(result).context("unexpected Beds25 booking shape")
    }

    async fn cancel_booking(&self, booking_ref: &str) -> anyhow::Result<()> {
        if self.dev_mode() {
            tracing::warn!(booking_ref, "Beds25 API key not set; stub cancel");
            return Ok(());
        }

        self.post(&format!("/api/public/booking/{booking_ref}/cancel"), None)
            .await?;
        Ok(())
    }
}
