//! Spelling Normalizer
//!
//! Best-effort correction of plant, pest and disease terminology. Any failure
//! yields the input unchanged.

use std::sync::Arc;
use tracing::{debug, warn};

use super::prompts;
use crate::llm::{ReplyRequest, StructuredOracle};
use crate::secrets::SecretManager;

#[derive(Clone)]
pub struct SpellingNormalizer {
    oracle: Arc<dyn StructuredOracle>,
    temperature: f64,
}

impl SpellingNormalizer {
    pub fn new(oracle: Arc<dyn StructuredOracle>, temperature: f64) -> Self {
        Self {
            oracle,
            temperature,
        }
    }

    /// Correct lower-cased symptom text
    pub async fn normalize(&self, text: &str) -> String {
        let request = ReplyRequest::text(prompts::spelling_correction(text), self.temperature);

        match self.oracle.generate_structured_reply(&request).await {
            Ok(reply) => match clean_reply(&reply) {
                Some(corrected) => {
                    debug!("Corrected symptoms: {:?}", corrected);
                    corrected
                }
                None => {
                    warn!("Empty spelling correction, keeping original text");
                    text.to_string()
                }
            },
            Err(e) => {
                warn!(
                    "Error correcting spelling, keeping original text: {}",
                    SecretManager::scrub(&e.to_string())
                );
                text.to_string()
            }
        }
    }
}

/// Trim the reply and drop one pair of wrapping quotes the model may echo
fn clean_reply(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();

    (!unquoted.is_empty()).then(|| unquoted.to_string())
}
