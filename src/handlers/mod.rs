pub mod availability;
pub mod health;
pub mod images;
pub mod intent;
pub mod voucher;
pub mod webhook;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/booking/availability", get(availability::availability))
        .route("/api/booking/rooms/:room_id/images", get(images::room_images))
        .route("/api/booking/voucher", post(voucher::validate))
        .route("/api/booking/intent", post(intent::create))
        .route("/api/stripe/webhook", post(webhook::stripe_webhook))
        .with_state(state)
}
