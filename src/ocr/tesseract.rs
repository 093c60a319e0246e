//! Tesseract OCR via its command-line binary.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tracing::debug;

use super::{OcrEngine, OcrError, OcrOutput};

/// Runs `tesseract <image> stdout -l <language>`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    language: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn extract_text(&self, image_path: &Path) -> Result<OcrOutput, OcrError> {
        let start = Instant::now();

        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::EngineNotAvailable(format!(
                    "{} not found (install tesseract-ocr)",
                    self.binary
                )));
            }
            Err(e) => return Err(OcrError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let result = OcrOutput::from_raw(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "tesseract read {} lines from {} in {}ms",
            result.lines.len(),
            image_path.display(),
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_not_available() {
        let engine = TesseractEngine::new("addrscan-no-such-ocr-binary", "eng");
        let err = engine
            .extract_text(Path::new("does-not-matter.png"))
            .unwrap_err();
        assert!(matches!(err, OcrError::EngineNotAvailable(_)));
    }
}
