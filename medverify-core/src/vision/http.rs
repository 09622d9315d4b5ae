//! HTTP product namer against an Anthropic-compatible messages endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use tracing::{debug, warn};

use super::{NamerError, ProductNamer};

const NAMING_PROMPT: &str = "Extract only the drug name from this pharmaceutical product. \
     Return just the name, nothing else. Keep hyphens if present.";

/// Configuration for the vision model endpoint.
#[derive(Clone)]
pub struct VisionConfig {
    /// Messages endpoint URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// API key sent in the `x-api-key` header.
    pub api_key: String,
    /// Reply token cap; the answer is a single short name.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl VisionConfig {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            max_tokens: 50,
            timeout_seconds: 20,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Product namer calling a vision-capable model over HTTP.
#[derive(Debug)]
pub struct HttpProductNamer {
    client: reqwest::Client,
    config: VisionConfig,
}

impl HttpProductNamer {
    pub fn new(config: VisionConfig) -> Result<Self, NamerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NamerError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_prompt(text_context: Option<&str>) -> String {
        match text_context {
            Some(text) if !text.trim().is_empty() => format!(
                "{NAMING_PROMPT}\n\nText recognized on the packaging, for context:\n{text}"
            ),
            _ => NAMING_PROMPT.to_string(),
        }
    }

    /// Pull the reply text out of a messages-API response body.
    fn extract_reply(body: &serde_json::Value) -> Result<&str, NamerError> {
        body.get("content")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| NamerError::Parse(format!("unexpected response format: {body}")))
    }
}

#[async_trait]
impl ProductNamer for HttpProductNamer {
    async fn name_product(
        &self,
        image: &[u8],
        text_context: Option<&str>,
    ) -> Result<String, NamerError> {
        let request_body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": "image/jpeg",
                            "data": BASE64.encode(image),
                        }
                    },
                    {
                        "type": "text",
                        "text": Self::build_prompt(text_context),
                    }
                ]
            }]
        });

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "requesting product name");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NamerError::Timeout(self.config.timeout_seconds)
                } else {
                    NamerError::Service(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "vision model returned error");
            return Err(NamerError::Service(format!("HTTP {status}: {body}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NamerError::Parse(e.to_string()))?;

        Ok(Self::extract_reply(&body)?.to_string())
    }
}
