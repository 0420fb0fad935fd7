//! Categorical label encoding.
//!
//! A [`LabelEncoder`] is a bijection between a finite vocabulary of
//! strings observed at training time and dense integer codes `0..k-1`.
//! Lookups are two-tier: exact match first, then a normalized match that
//! tolerates case, whitespace, and punctuation drift between training
//! labels and request labels. Anything else is an unknown label and an
//! explicit error; there is no silent default code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifacts::{read_json, write_json};
use crate::error::{Result, RewearError};

/// Normalize a label for fuzzy comparison: lowercase, alphanumerics only.
pub fn normalize_label(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// A fitted bijection between strings and dense integer codes.
///
/// Classes are stored sorted lexicographically, so codes are stable for
/// a given vocabulary regardless of input order. The encoder records the
/// request-facing field name it serves, so unknown-label errors can name
/// the offending field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    field: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder for `field` from the observed values.
    ///
    /// Duplicates are collapsed and the vocabulary is sorted before
    /// codes are assigned. An empty vocabulary is an error.
    pub fn fit<'a, I>(field: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut classes: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        classes.sort();
        classes.dedup();

        if classes.is_empty() {
            return Err(RewearError::dataset(format!(
                "cannot fit label encoder for '{field}' on an empty column"
            )));
        }

        Ok(LabelEncoder {
            field: field.to_string(),
            classes,
        })
    }

    /// The request-facing field name this encoder serves.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The fitted vocabulary, in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes in the vocabulary.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Encode a value to its integer code.
    ///
    /// Exact matches win; otherwise the first class whose normalized
    /// form equals the normalized input is used. A value that matches
    /// neither way yields [`RewearError::UnknownLabel`] naming this
    /// encoder's field.
    pub fn encode(&self, value: &str) -> Result<usize> {
        if let Some(code) = self.classes.iter().position(|c| c == value) {
            return Ok(code);
        }

        let norm = normalize_label(value);
        if let Some(code) = self
            .classes
            .iter()
            .position(|c| normalize_label(c) == norm)
        {
            return Ok(code);
        }

        Err(RewearError::unknown_label(&self.field, value))
    }

    /// Decode a code back to its canonical class string.
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(|s| s.as_str())
    }

    /// Save the encoder to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Load an encoder from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> LabelEncoder {
        LabelEncoder::fit(
            "material",
            ["Wool", "Cotton", "ecofriendly", "Cotton"].into_iter(),
        )
        .unwrap()
    }

    #[test]
    fn test_fit_sorts_and_dedups() {
        let enc = fitted();
        assert_eq!(enc.classes(), ["Cotton", "Wool", "ecofriendly"]);
        assert_eq!(enc.len(), 3);
    }

    #[test]
    fn test_encode_is_idempotent_on_canonical_classes() {
        let enc = fitted();
        for (code, class) in enc.classes().iter().enumerate() {
            assert_eq!(enc.encode(class).unwrap(), code);
            // Encoding the decoded form round-trips to the same code.
            assert_eq!(enc.encode(enc.decode(code).unwrap()).unwrap(), code);
        }
    }

    #[test]
    fn test_normalized_match() {
        let enc = fitted();
        let canonical = enc.encode("ecofriendly").unwrap();
        assert_eq!(enc.encode("Eco-Friendly ").unwrap(), canonical);
        assert_eq!(enc.encode("  COTTON").unwrap(), enc.encode("Cotton").unwrap());
    }

    #[test]
    fn test_unknown_label_names_field() {
        let enc = fitted();
        let err = enc.encode("Unobtainium").unwrap_err();
        assert_eq!(err.to_string(), "Unknown material label: Unobtainium");
    }

    #[test]
    fn test_empty_vocabulary_is_an_error() {
        assert!(LabelEncoder::fit("brand", std::iter::empty()).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("le_material.json");

        let enc = fitted();
        enc.save(&path).unwrap();

        let loaded = LabelEncoder::load(&path).unwrap();
        assert_eq!(loaded.field(), "material");
        assert_eq!(loaded.classes(), enc.classes());
        assert_eq!(loaded.encode("Wool").unwrap(), enc.encode("Wool").unwrap());
    }
}
