//! HTTP API: image upload and sheet download.

mod error;
mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::correction::SpellCorrector;
use crate::geocoder::Geocoder;
use crate::ocr::OcrEngine;
use crate::spreadsheet::RecordSheet;

pub use error::{ApiError, ErrorResponse};

/// Application state shared across handlers
pub struct AppState {
    pub ocr: Arc<dyn OcrEngine>,
    pub corrector: Arc<SpellCorrector>,
    pub geocoder: Arc<dyn Geocoder>,
    pub sheet: RecordSheet,
    pub upload_dir: PathBuf,
}

/// Build the router with CORS, request tracing and a body size limit.
pub fn router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/upload", post(handlers::upload_handler))
        .route("/download", get(handlers::download_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
