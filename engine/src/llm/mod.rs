//! Structured Reply Oracle
//!
//! Every AI call in the triage pipeline goes through the `StructuredOracle`
//! trait: one prompt in, one raw text reply out. Providers (OpenRouter,
//! Ollama) implement it over HTTP; tests substitute scripted stubs.
//!
//! Replies are untrusted text. `extract_json_object` digs a JSON object out of
//! whatever the model produced, whether that is bare JSON, a fenced code block
//! or JSON buried in prose.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::OracleConfig;
use crate::secrets::{SecretManager, OPENROUTER_KEY};

pub mod ollama;
pub mod openrouter;

/// Result type for oracle operations
pub type Result<T> = std::result::Result<T, OracleError>;

/// Errors that can occur during oracle calls
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl OracleError {
    /// True when the call never produced a usable 2xx body.
    ///
    /// The classifier reports these as infrastructure errors; a `ParseError`
    /// means the provider answered but the content was unusable.
    pub fn is_transport(&self) -> bool {
        !matches!(self, OracleError::ParseError(_))
    }
}

impl From<OracleError> for EngineError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Timeout => EngineError::OracleTimeout,
            other => EngineError::Oracle(other.to_string()),
        }
    }
}

/// Shape the reply is requested in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// Ask the provider to constrain output to a JSON object
    Json,

    /// Free text
    Text,
}

/// One outbound oracle call
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    pub prompt: String,
    pub temperature: f64,
    pub format: ReplyFormat,
}

impl ReplyRequest {
    pub fn json(prompt: impl Into<String>, temperature: f64) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            format: ReplyFormat::Json,
        }
    }

    pub fn text(prompt: impl Into<String>, temperature: f64) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            format: ReplyFormat::Text,
        }
    }
}

/// Capability every AI backend provides to the pipeline
#[async_trait]
pub trait StructuredOracle: Send + Sync {
    /// Returns the name of the provider (e.g., "openrouter", "ollama")
    fn name(&self) -> &str;

    /// Returns true if the model runs on this machine
    fn is_local(&self) -> bool;

    /// Send one prompt and return the model's raw reply text.
    ///
    /// Exactly one attempt is made; callers decide what a failure means.
    async fn generate_structured_reply(&self, request: &ReplyRequest) -> Result<String>;
}

/// Build the configured provider.
///
/// The API key is resolved here, once, so that request handling never reads
/// ambient state.
pub fn build_oracle(
    config: &OracleConfig,
    secrets: &SecretManager,
) -> std::result::Result<Arc<dyn StructuredOracle>, EngineError> {
    match config.provider.as_str() {
        "openrouter" => {
            let api_key = secrets.resolve(&config.openrouter.api_key_env, OPENROUTER_KEY)?;
            let oracle =
                openrouter::OpenRouterOracle::new(config.openrouter.clone(), api_key, config.timeout())?;
            Ok(Arc::new(oracle))
        }
        "ollama" => {
            let oracle = ollama::OllamaOracle::new(
                config.ollama.base_url.clone(),
                config.ollama.model.clone(),
                config.timeout(),
            )?;
            Ok(Arc::new(oracle))
        }
        other => Err(EngineError::Config(format!(
            "Unknown oracle provider '{}'",
            other
        ))),
    }
}

/// Receive a 2xx body and decode it.
///
/// Anything that goes wrong while the bytes are still arriving is a transport
/// failure; only text that arrived whole but does not decode is a `ParseError`.
pub(crate) async fn read_json_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let text = response.text().await.map_err(|e| {
        if e.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::NetworkError(format!("Failed to read response body: {}", e))
        }
    })?;

    serde_json::from_str(&text)
        .map_err(|e| OracleError::ParseError(format!("Invalid response body: {}", e)))
}

/// Cap on `{` positions tried when hunting for JSON in prose
const MAX_EMBEDDED_CANDIDATES: usize = 32;

/// Find a JSON object in a model reply.
///
/// Handles:
/// 1. Raw JSON (the whole reply is an object)
/// 2. Fenced JSON (` ```json\n{...}\n``` `, trailing prose allowed)
/// 3. JSON embedded in prose: the first `{` that starts a balanced, parseable
///    object, among the first `MAX_EMBEDDED_CANDIDATES` opening braces
pub fn extract_json_object(content: &str) -> Option<Map<String, Value>> {
    let trimmed = content.trim();

    if let Some(object) = parse_object(trimmed) {
        return Some(object);
    }

    if let Some(inner) = extract_fenced_block(trimmed) {
        if let Some(object) = parse_object(inner.trim()) {
            return Some(object);
        }
    }

    trimmed
        .char_indices()
        .filter(|(_, ch)| *ch == '{')
        .take(MAX_EMBEDDED_CANDIDATES)
        .filter_map(|(pos, _)| extract_balanced_json(&trimmed[pos..]))
        .find_map(parse_object)
}

fn parse_object(s: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(s).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Body of the first markdown code fence in the text.
fn extract_fenced_block(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start = fence_start + 3 + after_opening.find('\n')? + 1;
    let body_end = body_start + content[body_start..].find("```")?;

    (body_start < body_end).then(|| &content[body_start..body_end])
}

/// Balanced `{...}` at the start of `s`, respecting string literals.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
