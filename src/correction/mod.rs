//! OCR error correction against a frequency dictionary.

mod corrector;
mod dictionary;

pub use corrector::SpellCorrector;
pub use dictionary::Dictionary;
pub use symspell_rs::Suggestion;
