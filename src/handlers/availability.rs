use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::AvailabilityResult;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
}

// GET /api/booking/availability?checkIn=&checkOut=
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResult>, AppError> {
    let (Some(check_in), Some(check_out)) = (query.check_in, query.check_out) else {
        return Err(AppError::Validation(
            "checkIn and checkOut are required".to_string(),
        ));
    };

    let check_in: NaiveDate = check_in
        .parse()
        .map_err(|_| AppError::Validation("Invalid date range".to_string()))?;
    let check_out: NaiveDate = check_out
        .parse()
        .map_err(|_| AppError::Validation("Invalid date range".to_string()))?;
    if check_out <= check_in {
        return Err(AppError::Validation("Invalid date range".to_string()));
    }

    let result = state
        .pms
        .availability(check_in, check_out)
        .await
        .map_err(|e| AppError::Pms(e.to_string()))?;

    Ok(Json(result))
}
