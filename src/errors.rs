use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("CRM error: {0}")]
    Crm(String),

    #[error("payment error: {0}")]
    Payment(String),

    #[error("property manager error: {0}")]
    Pms(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Crm(_) => StatusCode::BAD_GATEWAY,
            AppError::Payment(_) => StatusCode::BAD_GATEWAY,
            AppError::Pms(_) => StatusCode::BAD_GATEWAY,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
