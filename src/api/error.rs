use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::ocr::OcrError;
use crate::spreadsheet::SheetError;

/// Errors surfaced to HTTP clients as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image uploaded")]
    NoImage,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("No text extracted from image")]
    NoText,

    #[error("No records found")]
    NoRecords,

    #[error("Unable to parse address")]
    Geocode,

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Failed to store record")]
    Storage(#[from] SheetError),

    #[error("Failed to save upload")]
    Upload(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoImage | ApiError::InvalidUpload(_) | ApiError::NoText => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NoRecords => StatusCode::NOT_FOUND,
            ApiError::Geocode => StatusCode::BAD_GATEWAY,
            ApiError::Ocr(_) | ApiError::Storage(_) | ApiError::Upload(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Storage(e) => tracing::error!("Record storage failed: {}", e),
            ApiError::Upload(e) => tracing::error!("Saving upload failed: {}", e),
            e if status.is_server_error() => tracing::error!("{}", e),
            e => tracing::debug!("Rejected request: {}", e),
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
