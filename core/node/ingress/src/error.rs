use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    BadRequest(String),
    #[error("Unexpected error: {0}")]
    InternalServerError(String),
}

impl From<fogseal_dal::SqlxError> for ApiError {
    fn from(error: fogseal_dal::SqlxError) -> Self {
        ApiError::InternalServerError(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(&msg)),
            ApiError::InternalServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(&msg))
            }
        };

        (status, Json(error_response)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ErrorResponse {
    fn new<E: std::fmt::Display>(message: &E) -> Self {
        Self {
            error: "Fog API Error".to_string(),
            message: message.to_string(),
        }
    }
}
