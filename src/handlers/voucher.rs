use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::VoucherValidation;
use crate::services::vouchers;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct VoucherRequest {
    pub code: Option<String>,
}

// POST /api/booking/voucher
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VoucherRequest>,
) -> Result<Json<VoucherValidation>, AppError> {
    let code = req.code.unwrap_or_default();
    if code.trim().is_empty() {
        return Err(AppError::Validation("No voucher code provided".to_string()));
    }

    // Upstream failures are folded into a `valid: false` result inside
    // the validator; never a silently granted discount.
    let result = vouchers::validate_voucher(state.crm.as_ref(), &code, Utc::now().date_naive()).await;
    Ok(Json(result))
}
