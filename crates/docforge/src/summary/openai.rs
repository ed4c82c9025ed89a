//! OpenAI-compatible chat completions over HTTP.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{Completion, CompletionRequest, LlmProvider};
use crate::config::SummaryConfig;
use crate::error::{Error, Result};

/// Resolve the API key: `summary.api_key` first, then the environment
/// variable named by `summary.api_key_env`.
///
/// # Errors
///
/// Returns [`Error::MissingApiKey`] when neither is set.
pub fn resolve_api_key(config: &SummaryConfig) -> Result<String> {
    resolve_api_key_with(config, |name| std::env::var(name).ok())
}

fn resolve_api_key_with(
    config: &SummaryConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    config
        .api_key
        .clone()
        .or_else(|| lookup(&config.api_key_env))
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::MissingApiKey {
            env_var: config.api_key_env.clone(),
        })
}

/// Client for `POST <api_base>/chat/completions`.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Create a provider for `api_base` (e.g. `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_base: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    /// Create a provider from the `[summary]` configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is available or the client cannot be
    /// built.
    pub fn from_config(config: &SummaryConfig) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        Self::new(
            &config.api_base,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
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

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user_message,
        });

        let body = ChatRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(endpoint = %self.endpoint, model = %request.model, "sending completion request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(Error::provider(Some(status.as_u16()), message));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::provider(Some(status.as_u16()), "response contained no choices"))?;

        Ok(Completion {
            content: content.trim().to_string(),
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config_with_key(key: Option<&str>) -> SummaryConfig {
        SummaryConfig {
            api_key: key.map(ToString::to_string),
            api_key_env: "DOCFORGE_TEST_KEY".to_string(),
            ..SummaryConfig::default()
        }
    }

    #[test]
    fn test_api_key_from_config_wins() {
        let config = config_with_key(Some("from-config"));
        let key = resolve_api_key_with(&config, |_| Some("from-env".to_string())).unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_api_key_from_env() {
        let config = config_with_key(None);
        let key = resolve_api_key_with(&config, |name| {
            (name == "DOCFORGE_TEST_KEY").then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_api_key_missing() {
        let config = config_with_key(None);
        let err = resolve_api_key_with(&config, |_| None).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { ref env_var } if env_var == "DOCFORGE_TEST_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = config_with_key(Some("  "));
        assert!(resolve_api_key_with(&config, |_| None).is_err());
    }

    #[test]
    fn test_endpoint_and_debug_redaction() {
        let provider =
            OpenAiProvider::new("https://api.example.com/v1/", "secret", Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.endpoint(), "https://api.example.com/v1/chat/completions");
        let debug = format!("{provider:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("gpt-4o-mini", "Document body")
            .with_system_prompt("Summarize")
            .with_max_tokens(300)
            .with_temperature(0.5)
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 300,
                "messages": [
                    {"role": "system", "content": "Summarize"},
                    {"role": "user", "content": "Document body"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"message": {"role": "assistant", "content": "\n## Overview\n- Things\n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap();
        let completion = provider.complete(request()).await.unwrap();

        assert_eq!(completion.content, "## Overview\n- Things");
        assert_eq!(completion.model, "gpt-4o-mini-2024-07-18");
    }

    #[tokio::test]
    async fn test_complete_http_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&server.uri(), "bad", Duration::from_secs(5)).unwrap();
        let err = provider.complete(request()).await.unwrap_err();

        match err {
            Error::Provider { status, message } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_complete_plain_text_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = provider.complete(request()).await.unwrap_err();

        assert!(err.to_string().contains("HTTP 503"));
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let err = provider.complete(request()).await.unwrap_err();

        assert!(err.is_provider_error());
        assert!(err.to_string().contains("no choices"));
    }
}
