use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Term frequencies used to rank spelling suggestions.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    counts: HashMap<String, u64>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a frequency dictionary such as `words.txt`.
    ///
    /// Each row holds a term and its count in the given columns. Rows with a
    /// missing term or an unparsable count are skipped. Files ending in `.gz`
    /// are decompressed on the fly.
    pub fn load(path: &Path, term_index: usize, count_index: usize, delimiter: u8) -> Result<Self> {
        info!("Loading dictionary from {}", path.display());

        let file = File::open(path)
            .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;
        let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let dictionary = Self::from_reader(reader, term_index, count_index, delimiter)?;
        info!("Loaded {} dictionary terms", dictionary.len());
        Ok(dictionary)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        term_index: usize,
        count_index: usize,
        delimiter: u8,
    ) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut dictionary = Self::new();
        let mut skipped = 0usize;

        for result in csv_reader.records() {
            let record = result.context("Failed to read dictionary row")?;
            let term = record.get(term_index).unwrap_or("");
            let count = record.get(count_index).and_then(|c| c.parse::<u64>().ok());

            match count {
                Some(count) if !term.is_empty() => dictionary.insert(term, count),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Skipped {} malformed dictionary rows", skipped);
        }
        Ok(dictionary)
    }

    /// Add a term; counts of repeated terms accumulate.
    pub fn insert(&mut self, term: &str, count: u64) {
        let entry = self.counts.entry(term.to_string()).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    pub fn count(&self, term: &str) -> Option<u64> {
        self.counts.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_load_space_separated() {
        let data = "the 23135851162\nstreet 105634\nbroken\navenue notanumber\nroad 80000\n";
        let dict = Dictionary::from_reader(data.as_bytes(), 0, 1, b' ').unwrap();

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.count("street"), Some(105634));
        assert_eq!(dict.count("avenue"), None);
        assert_eq!(dict.count("broken"), None);
    }

    #[test]
    fn test_duplicate_terms_accumulate() {
        let data = "main\t10\nmain\t5\n";
        let dict = Dictionary::from_reader(data.as_bytes(), 0, 1, b'\t').unwrap();
        assert_eq!(dict.count("main"), Some(15));
    }

    #[test]
    fn test_custom_columns() {
        let data = "1200,boulevard\n";
        let dict = Dictionary::from_reader(data.as_bytes(), 1, 0, b',').unwrap();
        assert_eq!(dict.count("boulevard"), Some(1200));
    }

    #[test]
    fn test_load_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt.gz");

        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"city 500\nstate 400\n").unwrap();
        encoder.finish().unwrap();

        let dict = Dictionary::load(&path, 0, 1, b' ').unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.count("state"), Some(400));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Dictionary::load(Path::new("/nonexistent/words.txt"), 0, 1, b' ');
        assert!(err.is_err());
    }
}
