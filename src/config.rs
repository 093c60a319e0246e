//! Service configuration, loaded from an optional TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::geocoder::DEFAULT_NOMINATIM_URL;

pub const DEFAULT_PORT: u16 = 10000;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
    pub correction: CorrectionConfig,
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Maximum request body size in MiB
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: format!("0.0.0.0:{}", DEFAULT_PORT),
            body_limit_mb: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub sheet_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            sheet_path: PathBuf::from("output.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    pub binary: String,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorrectionConfig {
    pub dictionary: PathBuf,
    pub term_index: usize,
    pub count_index: usize,
    /// Single-byte column separator
    pub delimiter: String,
    pub max_edit_distance: usize,
    pub prefix_length: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            dictionary: PathBuf::from("words.txt"),
            term_index: 0,
            count_index: 1,
            delimiter: " ".to_string(),
            max_edit_distance: 2,
            prefix_length: 7,
        }
    }
}

impl CorrectionConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => anyhow::bail!(
                "Dictionary delimiter must be a single byte, got {:?}",
                self.delimiter
            ),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Minimum spacing between requests in milliseconds
    pub min_interval_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: "addrscan/0.1 (address parser)".to_string(),
            timeout_secs: 10,
            min_interval_ms: 1000,
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.listen, "0.0.0.0:10000");
        assert_eq!(config.correction.max_edit_distance, 2);
        assert_eq!(config.correction.prefix_length, 7);
        assert_eq!(config.correction.delimiter_byte().unwrap(), b' ');
        assert_eq!(config.storage.sheet_path, PathBuf::from("output.csv"));
        assert_eq!(config.geocoder.min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addrscan.toml");
        fs::write(
            &path,
            r#"
            [storage]
            sheet_path = "/data/records.csv"

            [correction]
            dictionary = "/data/words.txt.gz"
            delimiter = "\t"

            [geocoder]
            url = "http://localhost:8080"
            "#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.storage.sheet_path, PathBuf::from("/data/records.csv"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.correction.delimiter_byte().unwrap(), b'\t');
        assert_eq!(config.correction.max_edit_distance, 2);
        assert_eq!(config.geocoder.url, "http://localhost:8080");
        assert_eq!(config.ocr.binary, "tesseract");
    }

    #[test]
    fn test_bad_delimiter() {
        let config = CorrectionConfig {
            delimiter: "::".to_string(),
            ..Default::default()
        };
        assert!(config.delimiter_byte().is_err());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[server\nlisten = ").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }
}
