use regex::Regex;
use std::sync::LazyLock;
use symspell_rs::{Suggestion, SymSpell, Verbosity};
use tracing::{debug, info};

use super::dictionary::Dictionary;

/// Splits a token into leading punctuation, core, trailing punctuation.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\W*)(.*?)(\W*)$").unwrap());

/// Token-level OCR correction on top of a SymSpell index.
pub struct SpellCorrector {
    symspell: SymSpell,
    max_edit_distance: usize,
}

impl SpellCorrector {
    pub fn new(dictionary: Dictionary, max_edit_distance: usize, prefix_length: usize) -> Self {
        let mut symspell = SymSpell::new(max_edit_distance, None, prefix_length, 1);
        for (term, count) in dictionary.iter() {
            symspell.create_dictionary_entry(term, usize::try_from(count).unwrap_or(usize::MAX));
        }

        info!(
            "Built spelling index: {} terms",
            symspell.get_dictionary_size()
        );

        Self {
            symspell,
            max_edit_distance,
        }
    }

    pub fn max_edit_distance(&self) -> usize {
        self.max_edit_distance
    }

    /// Closest dictionary terms to `word`, most frequent first.
    ///
    /// The lookup distance is capped at the distance the index was built with.
    pub fn lookup(&self, word: &str, max_edit_distance: usize) -> Vec<Suggestion> {
        self.symspell.lookup(
            word,
            Verbosity::Closest,
            max_edit_distance.min(self.max_edit_distance),
            &None,
            None,
            false,
        )
    }

    /// Correct each whitespace-separated token of OCR output.
    ///
    /// Tokens containing digits are kept as-is. Punctuation around a word and
    /// its casing pattern survive the replacement. Tokens are re-joined with
    /// single spaces.
    pub fn correct_text(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.correct_token(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn correct_token(&self, token: &str) -> String {
        if token.chars().any(|c| c.is_ascii_digit()) {
            return token.to_string();
        }

        let Some(caps) = TOKEN_REGEX.captures(token) else {
            return token.to_string();
        };
        let (lead, core, trail) = (&caps[1], &caps[2], &caps[3]);
        if core.is_empty() {
            return token.to_string();
        }

        let lowered = core.to_lowercase();
        let suggestions = self.lookup(&lowered, self.max_edit_distance);
        let Some(best) = suggestions.first() else {
            return token.to_string();
        };
        if best.term == lowered {
            return token.to_string();
        }

        debug!("Corrected '{}' -> '{}' (distance {})", core, best.term, best.distance);
        format!("{}{}{}", lead, transfer_case(core, &best.term), trail)
    }
}

/// Apply the casing pattern of `original` (all caps or capitalized) to `term`.
fn transfer_case(original: &str, term: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();

    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return term.to_uppercase();
    }

    if original.chars().next().map_or(false, char::is_uppercase) {
        let mut chars = term.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }

    term.to_string()
}
