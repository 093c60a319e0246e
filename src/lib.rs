//! Addrscan - reads addresses off uploaded images
//!
//! OCR output is spell-corrected against a frequency dictionary, geocoded and
//! appended to a downloadable record sheet. The `serve` binary hosts the HTTP API.

pub mod api;
pub mod config;
pub mod correction;
pub mod geocoder;
pub mod models;
pub mod ocr;
pub mod spreadsheet;

pub use models::{AddressRecord, Coordinate, ParsedAddress};
