use super::{read_json_body, OracleError, ReplyFormat, ReplyRequest, StructuredOracle};
use crate::config::OpenRouterConfig;
use crate::secrets::SecretString;
use async_trait::async_trait;
use sdk::errors::EngineError;
use serde_json::json;
use std::time::Duration;

/// OpenAI-compatible chat completions client pointed at OpenRouter
pub struct OpenRouterOracle {
    config: OpenRouterConfig,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenRouterOracle {
    pub fn new(
        config: OpenRouterConfig,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn payload(&self, request: &ReplyRequest) -> serde_json::Value {
        let mut payload = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
        });

        if request.format == ReplyFormat::Json {
            payload["response_format"] = json!({"type": "json_object"});
        }

        payload
    }
}

#[async_trait]
impl StructuredOracle for OpenRouterOracle {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn generate_structured_reply(&self, request: &ReplyRequest) -> super::Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.unsecure()),
            )
            .header("Content-Type", "application/json")
            .json(&self.payload(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else if e.is_connect() {
                    OracleError::ProviderUnavailable(format!(
                        "Cannot connect to {}",
                        self.config.base_url
                    ))
                } else {
                    OracleError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => OracleError::AuthenticationFailed(text),
                429 => OracleError::RateLimitExceeded,
                _ => OracleError::InvalidRequest(format!("HTTP {}: {}", status, text)),
            });
        }

        let data: serde_json::Value = read_json_body(response).await?;

        let message = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| OracleError::ParseError("No message in response".to_string()))?;

        message
            .get("content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| OracleError::ParseError("Empty content".to_string()))
    }
}
