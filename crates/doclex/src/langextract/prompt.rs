//! Few-shot prompt rendering.

use super::data::{ExampleData, Extraction};
use serde_json::{Map, Value, json};

/// Renders the question/answer prompt sent for every chunk.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    description: String,
    examples: Vec<ExampleData>,
    fence_output: bool,
}

impl PromptBuilder {
    pub fn new(description: impl Into<String>, examples: Vec<ExampleData>, fence_output: bool) -> Self {
        Self {
            description: description.into(),
            examples,
            fence_output,
        }
    }

    /// Classes named in the examples, first occurrence order.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = Vec::new();
        for extraction in self.examples.iter().flat_map(|e| &e.extractions) {
            if !classes.contains(&extraction.extraction_class.as_str()) {
                classes.push(&extraction.extraction_class);
            }
        }
        classes
    }

    pub fn render(&self, chunk_text: &str) -> String {
        let mut prompt = String::with_capacity(chunk_text.len() + 1024);

        prompt.push_str(self.description.trim());
        prompt.push_str("\n\n");

        let classes = self.classes();
        if !classes.is_empty() {
            prompt.push_str("Extract entities of these classes: ");
            prompt.push_str(&classes.join(", "));
            prompt.push_str(".\n");
        }
        prompt.push_str(
            "Answer with JSON of the form {\"extractions\": [{\"<class>\": \"<exact text>\", \"<class>_attributes\": {}}]}. \
             Copy entity text exactly as it appears in the input, list entities in order of appearance \
             and do not overlap them.\n\n",
        );

        if !self.examples.is_empty() {
            prompt.push_str("Examples\n");
            for example in &self.examples {
                prompt.push_str("Q: ");
                prompt.push_str(&example.text);
                prompt.push_str("\nA: ");
                prompt.push_str(&self.render_answer(&example.extractions));
                prompt.push_str("\n\n");
            }
        }

        prompt.push_str("Q: ");
        prompt.push_str(chunk_text);
        prompt.push_str("\nA: ");
        prompt
    }

    fn render_answer(&self, extractions: &[Extraction]) -> String {
        let answer = json!({ "extractions": extractions.iter().map(answer_item).collect::<Vec<_>>() });
        let body = serde_json::to_string_pretty(&answer).unwrap_or_else(|_| answer.to_string());

        if self.fence_output {
            format!("```json\n{}\n```", body)
        } else {
            body
        }
    }
}

fn answer_item(extraction: &Extraction) -> Value {
    let mut item = Map::new();
    item.insert(
        extraction.extraction_class.clone(),
        Value::String(extraction.extraction_text.clone()),
    );
    item.insert(
        format!("{}_attributes", extraction.extraction_class),
        Value::Object(extraction.attributes.clone()),
    );
    Value::Object(item)
}
