use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::services::fulfillment;
use crate::services::payments::stripe::verify_signature;
use crate::state::AppState;

// POST /api/stripe/webhook
//
// Raw body in, because the signature covers the exact bytes. An invalid
// or unverifiable signature short-circuits with 400 and no processing;
// once verified, the response is always 200 {received:true} regardless
// of downstream partial failures; the charge has already been taken.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if state.config.stripe_webhook_secret.is_empty() {
        tracing::error!("missing STRIPE_WEBHOOK_SECRET");
        return webhook_error("Webhook secret not configured");
    }

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if signature.is_empty() {
        tracing::warn!("missing Stripe-Signature header");
        return webhook_error("Missing signature");
    }

    if !verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        state.config.stripe_webhook_tolerance_secs,
        Utc::now().timestamp(),
    ) {
        tracing::warn!("invalid Stripe webhook signature");
        return webhook_error("Invalid signature");
    }

    let event: Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable webhook payload");
            return webhook_error("Invalid payload");
        }
    };

    tracing::info!(
        event_type = event["type"].as_str().unwrap_or("unknown"),
        event_id = event["id"].as_str().unwrap_or(""),
        "processing Stripe event"
    );

    fulfillment::handle_event(&state, &event).await;

    Json(json!({ "received": true })).into_response()
}

fn webhook_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("Webhook Error: {message}") })),
    )
        .into_response()
}
