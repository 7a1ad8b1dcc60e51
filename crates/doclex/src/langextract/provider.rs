//! Model-family resolution.
//!
//! A model id is mapped once to a [`Provider`]; the provider carries the rules
//! that shape the engine call (which key to use, fenced output, schema
//! constraints) as plain data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model-id prefixes served by the OpenAI API.
const OPENAI_FAMILIES: &[&str] = &["gpt-", "text-", "davinci", "curie", "babbage", "ada", "o1", "o3", "o4"];

/// Model-id prefixes served by the Gemini API.
const GEMINI_FAMILIES: &[&str] = &["gemini", "gemma", "learnlm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

/// Which configured key authenticates calls for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    /// `LANGEXTRACT_API_KEY`
    LangExtract,
    /// `OPENAI_API_KEY`
    OpenAi,
}

impl ApiKeySource {
    pub fn env_var(&self) -> &'static str {
        match self {
            ApiKeySource::LangExtract => "LANGEXTRACT_API_KEY",
            ApiKeySource::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Call-shaping rules for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: Provider,
    pub api_key_source: ApiKeySource,
    /// Ask the model to wrap its JSON answer in a ```json fence.
    pub fence_output: bool,
    /// Ask the API to constrain the response to JSON.
    pub use_schema_constraints: bool,
}

impl Provider {
    /// Resolve the provider for a model id.
    ///
    /// Ids outside both family tables fall back to Gemini with a warning.
    pub fn resolve(model_id: &str) -> Provider {
        let id = model_id.trim().to_lowercase();

        if OPENAI_FAMILIES.iter().any(|prefix| id.starts_with(prefix)) {
            return Provider::OpenAi;
        }

        if !GEMINI_FAMILIES.iter().any(|prefix| id.starts_with(prefix)) {
            tracing::warn!(
                "Model '{}' does not belong to a known model family; routing it to the Gemini API",
                model_id
            );
        }

        Provider::Gemini
    }

    pub fn profile(&self) -> ProviderProfile {
        match self {
            Provider::Gemini => ProviderProfile {
                provider: Provider::Gemini,
                api_key_source: ApiKeySource::LangExtract,
                fence_output: false,
                use_schema_constraints: true,
            },
            Provider::OpenAi => ProviderProfile {
                provider: Provider::OpenAi,
                api_key_source: ApiKeySource::OpenAi,
                fence_output: true,
                use_schema_constraints: false,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_families() {
        for id in [
            "gpt-4o",
            "gpt-4o-mini",
            "gpt-3.5-turbo",
            "text-davinci-003",
            "davinci-002",
            "babbage-002",
            "o1-mini",
            "o3",
            "o4-mini",
            "GPT-4-Turbo",
        ] {
            assert_eq!(Provider::resolve(id), Provider::OpenAi, "{id}");
        }
    }

    #[test]
    fn test_gemini_and_unknown_models() {
        assert_eq!(Provider::resolve("gemini-2.5-flash"), Provider::Gemini);
        assert_eq!(Provider::resolve("gemini-1.5-pro"), Provider::Gemini);
        assert_eq!(Provider::resolve("claude-3-opus"), Provider::Gemini);
        assert_eq!(Provider::resolve("llama3"), Provider::Gemini);
    }

    #[test]
    fn test_profiles() {
        let gemini = Provider::Gemini.profile();
        assert_eq!(gemini.api_key_source, ApiKeySource::LangExtract);
        assert!(!gemini.fence_output);
        assert!(gemini.use_schema_constraints);

        let openai = Provider::OpenAi.profile();
        assert_eq!(openai.api_key_source.env_var(), "OPENAI_API_KEY");
        assert!(openai.fence_output);
        assert!(!openai.use_schema_constraints);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(Provider::Gemini.to_string(), "gemini");
    }
}
