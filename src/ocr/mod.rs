//! Text extraction from uploaded images.
//!
//! The engine itself is external; this module only defines the seam the
//! upload handler calls and a Tesseract command-line implementation.

mod tesseract;

use std::path::Path;
use thiserror::Error;

pub use tesseract::TesseractEngine;

/// Errors from OCR engines.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text recognized in a single image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    /// Recognized lines, in reading order
    pub lines: Vec<String>,
}

impl OcrOutput {
    /// Build from raw engine output, dropping blank lines.
    pub fn from_raw(raw: &str) -> Self {
        let lines = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Self { lines }
    }

    /// Lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// An OCR engine. Calls block; run them off the async executor.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Extract text from an image file.
    fn extract_text(&self, image_path: &Path) -> Result<OcrOutput, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_drops_blank_lines_and_form_feed() {
        let out = OcrOutput::from_raw("  221B Baker Street \n\n London NW1 6XE\n\u{c}");
        assert_eq!(out.lines, vec!["221B Baker Street", "London NW1 6XE"]);
        assert_eq!(out.text(), "221B Baker Street\nLondon NW1 6XE");
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert!(OcrOutput::from_raw("   \n\t\n\u{c}").is_empty());
        assert!(OcrOutput::default().is_empty());
    }
}
