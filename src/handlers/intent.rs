use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::intent::{self, IntentRequest, IntentResponse};
use crate::state::AppState;

// POST /api/booking/intent
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<IntentResponse>, AppError> {
    tracing::info!(
        room_id = ?req.room_id,
        check_in = ?req.check_in,
        check_out = ?req.check_out,
        deposit = req.deposit_amount,
        "booking intent requested"
    );

    let response = intent::create_intent(&state, &req).await?;
    Ok(Json(response))
}
