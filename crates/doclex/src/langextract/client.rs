//! HTTP clients for the hosted language models.

use super::provider::{Provider, ProviderProfile};
use crate::error::{DoclexError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A text-in, text-out model endpoint.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_id(&self) -> &str;

    /// Send one prompt and return the raw completion text.
    async fn infer(&self, prompt: &str) -> Result<String>;
}

/// Endpoint settings shared by every model client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from_settings(&crate::core::config::Settings::default())
    }
}

impl ClientOptions {
    pub fn from_settings(settings: &crate::core::config::Settings) -> Self {
        Self {
            gemini_base_url: settings.gemini_base_url.clone(),
            openai_base_url: settings.openai_base_url.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }

    pub fn build_http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DoclexError::configuration_with_source(format!("Failed to build HTTP client: {}", e), e))
    }
}

/// Instantiate the client matching `profile`.
pub fn create_model(
    http: Client,
    options: &ClientOptions,
    profile: &ProviderProfile,
    model_id: &str,
    api_key: &str,
) -> Arc<dyn LanguageModel> {
    match profile.provider {
        Provider::Gemini => Arc::new(GeminiModel {
            http,
            base_url: options.gemini_base_url.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
            api_key: api_key.to_string(),
            json_response: profile.use_schema_constraints,
        }),
        Provider::OpenAi => Arc::new(OpenAiModel {
            http,
            base_url: options.openai_base_url.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
            api_key: api_key.to_string(),
        }),
    }
}

async fn read_error_body(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    body.chars().take(500).collect()
}

// Gemini

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` client.
pub struct GeminiModel {
    http: Client,
    base_url: String,
    model_id: String,
    api_key: String,
    json_response: bool,
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn infer(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: self.json_response.then_some("application/json"),
            },
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model_id);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DoclexError::lang_extract_with_source(format!("Gemini request failed: {}", e), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(DoclexError::lang_extract(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            DoclexError::lang_extract_with_source(format!("Invalid Gemini response: {}", e), e)
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|part| part.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DoclexError::lang_extract("Gemini returned an empty response"));
        }
        Ok(text)
    }
}

// OpenAI

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

const OPENAI_SYSTEM_PROMPT: &str =
    "You are a precise information extraction assistant. Respond only with the requested JSON.";

/// OpenAI chat-completions client.
pub struct OpenAiModel {
    http: Client,
    base_url: String,
    model_id: String,
    api_key: String,
}

impl OpenAiModel {
    /// Reasoning models only accept their default temperature.
    fn temperature(&self) -> Option<f32> {
        let id = self.model_id.to_lowercase();
        if ["o1", "o3", "o4"].iter().any(|family| id.starts_with(family)) {
            None
        } else {
            Some(0.0)
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn infer(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model_id,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: OPENAI_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature(),
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DoclexError::lang_extract_with_source(format!("OpenAI request failed: {}", e), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(DoclexError::lang_extract(format!(
                "OpenAI API returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            DoclexError::lang_extract_with_source(format!("Invalid OpenAI response: {}", e), e)
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| DoclexError::lang_extract("OpenAI returned an empty response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: Some("application/json"),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_gemini_response_parts_are_read() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"extractions\""},{"text":":[]}"}]}}]}"#,
        )
        .unwrap();
        let content = parsed.candidates.into_iter().next().unwrap().content.unwrap();
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        assert_eq!(text, r#"{"extractions":[]}"#);
    }

    #[test]
    fn test_openai_temperature_omitted_for_reasoning_models() {
        let options = ClientOptions::default();
        let http = Client::new();
        let make = |id: &str| OpenAiModel {
            http: http.clone(),
            base_url: options.openai_base_url.clone(),
            model_id: id.to_string(),
            api_key: "k".to_string(),
        };
        assert_eq!(make("gpt-4o").temperature(), Some(0.0));
        assert_eq!(make("o3-mini").temperature(), None);
    }

    #[test]
    fn test_create_model_follows_profile() {
        let options = ClientOptions::default();
        let model = create_model(Client::new(), &options, &Provider::OpenAi.profile(), "gpt-4o", "k");
        assert_eq!(model.model_id(), "gpt-4o");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_lang_extract_error() {
        let options = ClientOptions {
            gemini_base_url: "http://127.0.0.1:1".to_string(),
            openai_base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(5),
        };
        let http = options.build_http_client().unwrap();
        let model = create_model(http, &options, &Provider::Gemini.profile(), "gemini-2.5-flash", "k");
        let err = model.infer("hello").await.unwrap_err();
        assert!(matches!(err, DoclexError::LangExtract { .. }));
    }
}
