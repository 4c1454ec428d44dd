use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::models::RoomImageKind;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ImagesQuery {
    #[serde(rename = "type")]
    pub kind: Option<RoomImageKind>,
}

// GET /api/booking/rooms/:room_id/images?type=
pub async fn room_images(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ImagesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let images = state
        .pms
        .room_images(&room_id, query.kind)
        .await
        .map_err(|e| AppError::Pms(e.to_string()))?;

    Ok(Json(json!({ "images": images })))
}
