//! Turning raw model output into aligned [`Extraction`]s.
//!
//! Models answer with JSON, sometimes wrapped in a Markdown code fence. Two item
//! shapes are accepted inside the `extractions` array:
//!
//! ```json
//! {"person": "John Smith", "person_attributes": {"type": "full_name"}}
//! {"extraction_class": "person", "extraction_text": "John Smith", "attributes": {}}
//! ```

use super::data::{CharInterval, Extraction};
use crate::error::{DoclexError, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

const ATTRIBUTES_SUFFIX: &str = "_attributes";
const INDEX_SUFFIX: &str = "_index";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("Code fence regex pattern is valid and should compile")
});

/// Return the JSON payload inside the first code fence, or the trimmed input.
pub fn strip_code_fence(raw: &str) -> &str {
    CODE_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| raw.trim())
}

/// Parse one model answer into unaligned extractions.
pub fn parse_model_output(raw: &str) -> Result<Vec<Extraction>> {
    let payload = strip_code_fence(raw);
    if payload.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(payload).map_err(|e| {
        DoclexError::lang_extract_with_source(format!("Model output is not valid JSON: {}", e), e)
    })?;

    let items = match value {
        Value::Object(mut map) => match map.remove("extractions") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(DoclexError::lang_extract(format!(
                    "Expected 'extractions' to be a list, got {}",
                    json_type(&other)
                )));
            }
        },
        Value::Array(items) => items,
        other => {
            return Err(DoclexError::lang_extract(format!(
                "Expected a JSON object with an 'extractions' list, got {}",
                json_type(&other)
            )));
        }
    };

    let mut extractions = Vec::new();
    for item in items {
        match item {
            Value::Object(map) => parse_item(map, &mut extractions),
            other => tracing::debug!("Skipping non-object extraction item: {}", other),
        }
    }
    Ok(extractions)
}

fn parse_item(mut map: Map<String, Value>, out: &mut Vec<Extraction>) {
    if let (Some(class), Some(text)) = (
        map.get("extraction_class").and_then(scalar_text),
        map.get("extraction_text").and_then(scalar_text),
    ) {
        let attributes = match map.remove("attributes") {
            Some(Value::Object(attributes)) => attributes,
            _ => Map::new(),
        };
        out.push(Extraction::new(class, text).with_attributes(attributes));
        return;
    }

    let classes: Vec<String> = map
        .keys()
        .filter(|key| !key.ends_with(ATTRIBUTES_SUFFIX) && !key.ends_with(INDEX_SUFFIX))
        .cloned()
        .collect();

    for class in classes {
        let Some(text) = map.get(&class).and_then(scalar_text) else {
            continue;
        };
        let attributes = match map.remove(&format!("{}{}", class, ATTRIBUTES_SUFFIX)) {
            Some(Value::Object(attributes)) => attributes,
            _ => Map::new(),
        };
        out.push(Extraction::new(class, text).with_attributes(attributes));
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Locate each extraction in `chunk` and set its document-level interval.
///
/// Extractions are searched in order from a cursor that advances past every
/// match, first exactly and then case-insensitively; if the text only occurs
/// before the cursor the search restarts at the beginning of the chunk.
/// Extractions that cannot be found keep `char_interval = None`.
pub fn align_extractions(extractions: &mut [Extraction], chunk: &str, char_offset: usize) {
    let mut cursor = 0usize;

    for extraction in extractions.iter_mut() {
        let needle = extraction.extraction_text.as_str();
        if needle.trim().is_empty() {
            extraction.char_interval = None;
            continue;
        }

        let found = find_from(chunk, needle, cursor).or_else(|| find_from(chunk, needle, 0));

        match found {
            Some((start, end)) => {
                let start_char = char_offset + chunk[..start].chars().count();
                let end_char = start_char + chunk[start..end].chars().count();
                extraction.char_interval = Some(CharInterval::new(start_char, end_char));
                cursor = end;
            }
            None => {
                tracing::debug!(
                    "Could not align '{}' ({}) in chunk at offset {}",
                    needle,
                    extraction.extraction_class,
                    char_offset
                );
                extraction.char_interval = None;
            }
        }
    }
}

/// Byte span of `needle` in `haystack[from..]`, exact match preferred.
fn find_from(haystack: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    let tail = haystack.get(from..)?;

    if let Some(pos) = tail.find(needle) {
        return Some((from + pos, from + pos + needle.len()));
    }

    let pattern = RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()?;
    pattern.find(tail).map(|m| (from + m.start(), from + m.end()))
}
