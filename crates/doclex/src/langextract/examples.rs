//! Few-shot exemplars built from the requested entity classes.
//!
//! Each request gets one worked example: a sample text plus, for every requested
//! class, a canned extraction looked up in an [`ExemplarTable`]. Classes the
//! table does not know get a generic placeholder.

use super::data::{ExampleData, Extraction};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Sample sentence used when the caller provides no sample text.
pub const DEFAULT_SAMPLE_TEXT: &str =
    "John Smith visited New York on January 15, 2024, to meet with Dr. Sarah Johnson.";

const GENERIC_TEXT: &str = "example_text";

/// Canned extraction for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct Exemplar {
    pub text: String,
    pub attributes: Map<String, Value>,
}

/// Immutable class → exemplar lookup, keyed by lower-cased class name.
#[derive(Debug, Clone, Default)]
pub struct ExemplarTable {
    entries: HashMap<String, Exemplar>,
}

impl ExemplarTable {
    /// Table with no entries; every class gets the generic placeholder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn with_entry(mut self, class: &str, text: &str, attributes: &[(&str, &str)]) -> Self {
        let attributes = attributes
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
            .collect();
        self.entries.insert(
            class.to_lowercase(),
            Exemplar {
                text: text.to_string(),
                attributes,
            },
        );
        self
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, class: &str) -> Option<&Exemplar> {
        self.entries.get(&class.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the single worked example for `classes`.
    ///
    /// Extractions keep the caller's spelling of each class and follow the order
    /// of `classes`. An empty or missing `sample_text` uses [`DEFAULT_SAMPLE_TEXT`].
    pub fn build_examples(&self, classes: &[String], sample_text: Option<&str>) -> Vec<ExampleData> {
        let text = sample_text
            .filter(|sample| !sample.is_empty())
            .unwrap_or(DEFAULT_SAMPLE_TEXT)
            .to_string();

        let extractions = classes
            .iter()
            .map(|class| match self.lookup(class) {
                Some(exemplar) => {
                    Extraction::new(class.clone(), exemplar.text.clone()).with_attributes(exemplar.attributes.clone())
                }
                None => {
                    let mut attributes = Map::new();
                    attributes.insert("type".to_string(), Value::String("generic".to_string()));
                    Extraction::new(class.clone(), GENERIC_TEXT).with_attributes(attributes)
                }
            })
            .collect();

        vec![ExampleData { text, extractions }]
    }

    /// The built-in table for common entity types.
    pub fn standard() -> Self {
        Self::empty()
            .with_entry("person", "John Smith", &[("type", "full_name")])
            .with_entry("name", "John Smith", &[("type", "person_name")])
            .with_entry("location", "New York", &[("type", "city")])
            .with_entry("place", "New York", &[("type", "city")])
            .with_entry("date", "January 15, 2024", &[("format", "full_date")])
            .with_entry("time", "January 15, 2024", &[("type", "date")])
            .with_entry("organization", "Dr. Sarah Johnson", &[("type", "professional_title")])
            .with_entry("title", "Dr.", &[("type", "professional_title")])
            .with_entry("email", "example@email.com", &[("type", "contact")])
            .with_entry("phone", "(555) 123-4567", &[("type", "contact")])
            .with_entry("address", "New York", &[("type", "location")])
            .with_entry("company", "Company Name", &[("type", "business")])
            .with_entry("product", "Product Name", &[("type", "item")])
            .with_entry("money", "$100", &[("currency", "USD")])
            .with_entry("amount", "$100", &[("type", "monetary")])
    }
}
