//! Append-only record sheet.
//!
//! Every successful upload lands as one CSV row that opens directly in a
//! spreadsheet application.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::models::AddressRecord;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sheet task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One row of the sheet, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Extracted Text")]
    pub extracted_text: String,
    #[serde(rename = "Street")]
    pub street: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Postal Code")]
    pub postal_code: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
    #[serde(rename = "Image Path")]
    pub image_path: String,
}

impl SheetRow {
    pub fn new(record: &AddressRecord, image_path: &Path) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            extracted_text: record.text.clone(),
            street: record.street.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            country: record.country.clone(),
            postal_code: record.postal_code.clone(),
            latitude: record.latitude.to_string(),
            longitude: record.longitude.to_string(),
            image_path: image_path.display().to_string(),
        }
    }
}

/// CSV file that accumulates one row per processed upload.
pub struct RecordSheet {
    path: PathBuf,
    /// Serializes appends
    write_lock: Mutex<()>,
}

impl RecordSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether at least one row has been written.
    pub fn exists(&self) -> bool {
        fs::metadata(&self.path).map_or(false, |m| m.is_file() && m.len() > 0)
    }

    /// Append one row, writing the header first if the file is new.
    pub async fn append(&self, record: &AddressRecord, image_path: &Path) -> Result<(), SheetError> {
        let row = SheetRow::new(record, image_path);
        let _guard = self.write_lock.lock().await;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_row(&path, &row)).await??;

        info!("Appended record to {}", self.path.display());
        Ok(())
    }

    /// Raw file contents for download, or `None` before the first append.
    pub async fn contents(&self) -> Result<Option<Vec<u8>>, SheetError> {
        let _guard = self.write_lock.lock().await;
        if !self.exists() {
            return Ok(None);
        }
        Ok(Some(tokio::fs::read(&self.path).await?))
    }

    /// Read every row back.
    pub async fn rows(&self) -> Result<Vec<SheetRow>, SheetError> {
        let _guard = self.write_lock.lock().await;
        if !self.exists() {
            return Ok(Vec::new());
        }

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_rows(&path)).await?
    }
}

fn write_row(path: &Path, row: &SheetRow) -> Result<(), SheetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let needs_header = fs::metadata(path).map_or(true, |m| m.len() == 0);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<SheetRow>, SheetError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut rows: Vec<SheetRow> = Vec::new();
    for result in reader.deserialize::<SheetRow>() {
        rows.push(result?);
    }
    Ok(rows)
}
