use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("llm extraction disabled (LLM_ENABLED=0)")]
    Disabled,
    #[error("llm request failed: {0}")]
    Http(String),
    #[error("llm returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response missing completion content")]
    EmptyCompletion,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            api_key: String::new(),
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_secs: 5,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        fn provider_defaults(provider: &str) -> (String, String) {
            match provider.to_ascii_lowercase().as_str() {
                "openai" => (
                    "gpt-4o-mini".into(),
                    "https://api.openai.com/v1/chat/completions".into(),
                ),
                "groq" => (
                    "llama-3.1-70b-versatile".into(),
                    "https://api.groq.com/openai/v1/chat/completions".into(),
                ),
                "deepseek" => (
                    "deepseek-chat".into(),
                    "https://api.deepseek.com/v1/chat/completions".into(),
                ),
                _ => (
                    "gpt-4o-mini".into(),
                    "http://localhost:8000/v1/chat/completions".into(),
                ),
            }
        }

        fn provider_api_key(provider: &str) -> Option<String> {
            match provider.to_ascii_lowercase().as_str() {
                "openai" => std::env::var("OPENAI_API_KEY").ok(),
                "groq" => std::env::var("GROQ_API_KEY").ok(),
                "deepseek" => std::env::var("DEEPSEEK_API_KEY").ok(),
                _ => None,
            }
        }

        fn parse_bool(key: &str, default: bool) -> bool {
            match std::env::var(key) {
                Ok(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
                Err(_) => default,
            }
        }

        fn parse_u64(key: &str, default: u64) -> u64 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(default)
        }

        fn parse_u32(key: &str, default: u32) -> u32 {
            std::env::var(key)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(default)
        }

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".into());
        let (default_model, default_endpoint) = provider_defaults(&provider);

        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .or_else(|| provider_api_key(&provider))
            .unwrap_or_default();

        Self {
            enabled: parse_bool("LLM_ENABLED", true),
            provider,
            model: std::env::var("LLM_MODEL").unwrap_or(default_model),
            endpoint: std::env::var("LLM_ENDPOINT").unwrap_or(default_endpoint),
            api_key,
            timeout_secs: parse_u64("LLM_TIMEOUT_SECONDS", 30),
            max_retries: parse_u32("LLM_MAX_RETRIES", 3),
            retry_backoff_secs: parse_u64("LLM_RETRY_BACKOFF_SECONDS", 5),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Thin client for an OpenAI-compatible chat-completions endpoint. Returns
/// the raw completion text; decoding into record fields happens upstream.
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractionError::Http(format!("http client build: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    pub async fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> Result<String, ExtractionError> {
        if !self.config.enabled {
            return Err(ExtractionError::Disabled);
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.1,
        };

        let mut last_error = ExtractionError::Http("no attempts made".into());
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(self.config.retry_backoff_secs)).await;
            }

            match self.try_complete(&request).await {
                Ok(content) => return Ok(content),
                Err(err @ ExtractionError::Status { status, .. }) if status < 500 => {
                    // Client errors will not improve on retry.
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        provider = %self.config.provider,
                        error = %err,
                        "llm completion attempt failed"
                    );
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    async fn try_complete(&self, request: &ChatRequest<'_>) -> Result<String, ExtractionError> {
        let mut builder = self.client.post(&self.config.endpoint).json(request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ExtractionError::Http(format!("POST {}: {e}", self.config.endpoint)))?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".into());
            return Err(ExtractionError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Http(format!("parse completion json: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ExtractionError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        use std::sync::Mutex;
        static ENV_GUARD: Mutex<()> = Mutex::new(());
        let _guard = ENV_GUARD.lock().unwrap();

        let prev: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                match value {
                    Some(v) => unsafe { std::env::set_var(key, v) },
                    None => unsafe { std::env::remove_var(key) },
                }
                (key.to_string(), previous)
            })
            .collect();

        f();

        for (key, previous) in prev {
            if let Some(v) = previous {
                unsafe { std::env::set_var(&key, v) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }

    #[test]
    fn config_reads_env_overrides() {
        with_env(
            &[
                ("LLM_ENABLED", Some("0")),
                ("LLM_PROVIDER", Some("groq")),
                ("LLM_MODEL", Some("mixtral-8x7b")),
                ("LLM_ENDPOINT", Some("https://example.com/v1")),
                ("LLM_API_KEY", Some("secret")),
                ("LLM_TIMEOUT_SECONDS", Some("45")),
                ("LLM_MAX_RETRIES", Some("5")),
                ("LLM_RETRY_BACKOFF_SECONDS", Some("7")),
            ],
            || {
                let cfg = LlmConfig::from_env();
                assert!(!cfg.enabled);
                assert_eq!(cfg.provider, "groq");
                assert_eq!(cfg.model, "mixtral-8x7b");
                assert_eq!(cfg.endpoint, "https://example.com/v1");
                assert_eq!(cfg.api_key, "secret");
                assert_eq!(cfg.timeout_secs, 45);
                assert_eq!(cfg.max_retries, 5);
                assert_eq!(cfg.retry_backoff_secs, 7);
            },
        );
    }

    #[test]
    fn provider_defaults_fill_model_and_endpoint() {
        with_env(
            &[
                ("LLM_PROVIDER", Some("groq")),
                ("LLM_MODEL", None),
                ("LLM_ENDPOINT", None),
                ("LLM_API_KEY", None),
                ("GROQ_API_KEY", Some("groq-secret")),
            ],
            || {
                let cfg = LlmConfig::from_env();
                assert_eq!(cfg.model, "llama-3.1-70b-versatile");
                assert_eq!(
                    cfg.endpoint,
                    "https://api.groq.com/openai/v1/chat/completions"
                );
                assert_eq!(cfg.api_key, "groq-secret");
            },
        );
    }

    #[tokio::test]
    async fn disabled_client_short_circuits() {
        let client = LlmClient::new(LlmConfig {
            enabled: false,
            ..LlmConfig::default()
        })
        .unwrap();

        let err = client.complete("system", "user").await;
        assert!(matches!(err, Err(ExtractionError::Disabled)));
    }
}
