//! Data passed into and out of the extraction engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Character span of an extraction in its source document.
///
/// Positions count Unicode scalar values, not bytes. `end_pos` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharInterval {
    #[serde(default)]
    pub start_pos: Option<usize>,
    #[serde(default)]
    pub end_pos: Option<usize>,
}

impl CharInterval {
    pub fn new(start_pos: usize, end_pos: usize) -> Self {
        Self {
            start_pos: Some(start_pos),
            end_pos: Some(end_pos),
        }
    }

    /// Both ends known.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        match (self.start_pos, self.end_pos) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn overlaps(&self, other: &CharInterval) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
            _ => false,
        }
    }
}

/// One entity found in a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub extraction_class: String,
    pub extraction_text: String,
    /// `None` when the text could not be located in the source
    #[serde(default)]
    pub char_interval: Option<CharInterval>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Extraction {
    pub fn new(extraction_class: impl Into<String>, extraction_text: impl Into<String>) -> Self {
        Self {
            extraction_class: extraction_class.into(),
            extraction_text: extraction_text.into(),
            char_interval: None,
            attributes: Map::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_interval(mut self, start_pos: usize, end_pos: usize) -> Self {
        self.char_interval = Some(CharInterval::new(start_pos, end_pos));
        self
    }

    /// Aligned span, if both ends are known.
    pub fn span(&self) -> Option<(usize, usize)> {
        self.char_interval.and_then(|interval| interval.bounds())
    }
}

/// A worked example shown to the model: a text and what should be extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleData {
    pub text: String,
    pub extractions: Vec<Extraction>,
}

/// A source text together with the extractions found in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub document_id: String,
    pub text: String,
    #[serde(default)]
    pub extractions: Vec<Extraction>,
}

impl AnnotatedDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            document_id: format!("doc_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
            text: text.into(),
            extractions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_overlap() {
        let a = CharInterval::new(0, 5);
        let b = CharInterval::new(4, 8);
        let c = CharInterval::new(5, 9);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&CharInterval::default()));
    }

    #[test]
    fn test_extraction_deserializes_without_optional_fields() {
        let extraction: Extraction =
            serde_json::from_str(r#"{"extraction_class":"person","extraction_text":"John"}"#).unwrap();
        assert!(extraction.char_interval.is_none());
        assert!(extraction.attributes.is_empty());
        assert_eq!(extraction.span(), None);
    }

    #[test]
    fn test_document_ids_are_unique() {
        let a = AnnotatedDocument::new("x");
        let b = AnnotatedDocument::new("x");
        assert!(a.document_id.starts_with("doc_"));
        assert_ne!(a.document_id, b.document_id);
    }
}
