//! Upload, download and health handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;
use crate::geocoder::parse_address;
use crate::models::AddressRecord;

const IMAGE_FIELD: &str = "image";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    ocr: String,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        ocr: state.ocr.name().to_string(),
    })
}

/// OCR an uploaded image, correct the text, geocode it and record the result.
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AddressRecord>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Upload is not multipart: {}", e);
        ApiError::NoImage
    })?;

    let mut image: Option<(Option<String>, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidUpload(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
        image = Some((file_name, bytes));
    }

    let (file_name, bytes) = image
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or(ApiError::NoImage)?;

    let image_path = save_upload(&state.upload_dir, file_name.as_deref(), &bytes).await?;
    info!("Saved upload ({} bytes) to {}", bytes.len(), image_path.display());

    match process_upload(&state, &image_path).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            // Unrecorded uploads are not kept
            if let Err(remove_err) = tokio::fs::remove_file(&image_path).await {
                warn!("Failed to remove {}: {}", image_path.display(), remove_err);
            }
            Err(e)
        }
    }
}

/// Run the saved image through OCR, correction and geocoding, then record it.
async fn process_upload(state: &AppState, image_path: &Path) -> Result<AddressRecord, ApiError> {
    let ocr = Arc::clone(&state.ocr);
    let ocr_path = image_path.to_path_buf();
    let output = tokio::task::spawn_blocking(move || ocr.extract_text(&ocr_path))
        .await
        .map_err(|e| ApiError::Internal(format!("OCR task failed: {}", e)))??;

    if output.is_empty() {
        return Err(ApiError::NoText);
    }

    let extracted = output.text();
    let corrected = state.corrector.correct_text(&extracted);
    debug!("OCR text {:?} corrected to {:?}", extracted, corrected);

    let parsed = parse_address(state.geocoder.as_ref(), &corrected).await;
    let record = parsed.record().ok_or(ApiError::Geocode)?;

    state.sheet.append(record, image_path).await?;
    Ok(record.clone())
}

/// Serve the accumulated sheet as an attachment.
pub async fn download_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let contents = state.sheet.contents().await?.ok_or(ApiError::NoRecords)?;

    let file_name = state
        .sheet
        .path()
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output.csv")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        contents,
    )
        .into_response())
}

/// Write the upload under a unique `image_<timestamp>_<id>.<ext>` name.
async fn save_upload(
    upload_dir: &Path,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<PathBuf, ApiError> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let name = format!(
        "image_{}_{}.{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        &Uuid::new_v4().simple().to_string()[..8],
        image_extension(file_name)
    );
    let path = upload_dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Extension of the uploaded file name if it is a known image type, else `png`.
fn image_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or_else(|| "png".to_string())
}
