//! Intent Classifier
//!
//! One oracle call per utterance, asking for `{"category": "<label>"}` at low
//! temperature. Transport failures become `Category::Error`; any reply that
//! cannot be read as a known label becomes `Category::Unrelated`.

use sdk::types::Category;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::prompts;
use crate::llm::{extract_json_object, ReplyRequest, StructuredOracle};
use crate::secrets::SecretManager;

#[derive(Clone)]
pub struct IntentClassifier {
    oracle: Arc<dyn StructuredOracle>,
    temperature: f64,
}

impl IntentClassifier {
    pub fn new(oracle: Arc<dyn StructuredOracle>, temperature: f64) -> Self {
        Self {
            oracle,
            temperature,
        }
    }

    /// Classify one non-empty utterance. Never fails; see module docs.
    pub async fn classify(&self, text: &str) -> Category {
        let request = ReplyRequest::json(prompts::classification(text), self.temperature);

        let reply = match self.oracle.generate_structured_reply(&request).await {
            Ok(reply) => reply,
            Err(e) if e.is_transport() => {
                error!(
                    "Error classifying input via {}: {}",
                    self.oracle.name(),
                    SecretManager::scrub(&e.to_string())
                );
                return Category::Error;
            }
            Err(e) => {
                warn!("Unreadable classification response: {}", e);
                return Category::Unrelated;
            }
        };

        let category = parse_category(&reply);
        debug!("Input classified as: {}", category);
        category
    }
}

/// Read the `category` field of a classifier reply
pub fn parse_category(reply: &str) -> Category {
    let label = extract_json_object(reply)
        .and_then(|object| object.get("category").and_then(|v| v.as_str()).map(str::to_string));

    match label.as_deref().and_then(Category::parse_label) {
        Some(category) => category,
        None => {
            warn!("Error parsing classification response: {:?}", reply);
            Category::Unrelated
        }
    }
}
