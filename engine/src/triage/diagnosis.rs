//! Diagnosis Oracle
//!
//! Asks the oracle for `{"disease", "organic", "chemical", "prevention"}` about
//! symptoms that the knowledge base doesn't know. Failures propagate: there is
//! no fallback past this point.

use sdk::types::{DiagnosisResult, DiagnosisSource};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::prompts;
use crate::llm::{extract_json_object, OracleError, ReplyRequest, StructuredOracle};

const FIELDS: [&str; 4] = ["disease", "organic", "chemical", "prevention"];

#[derive(Clone)]
pub struct DiagnosisOracle {
    oracle: Arc<dyn StructuredOracle>,
    temperature: f64,
}

impl DiagnosisOracle {
    pub fn new(oracle: Arc<dyn StructuredOracle>, temperature: f64) -> Self {
        Self {
            oracle,
            temperature,
        }
    }

    /// Diagnose the user's original, uncorrected symptom text
    pub async fn diagnose(&self, symptoms: &str) -> Result<DiagnosisResult, OracleError> {
        let request = ReplyRequest::json(prompts::diagnosis(symptoms), self.temperature);
        let reply = self.oracle.generate_structured_reply(&request).await?;

        let diagnosis = parse_diagnosis(&reply)?;
        debug!("AI diagnosis: {:?}", diagnosis);
        Ok(diagnosis)
    }
}

/// Read the four diagnosis fields out of an oracle reply.
///
/// All four keys are required. Models sometimes answer with a list of steps
/// instead of a sentence; lists are joined with "; ".
pub fn parse_diagnosis(reply: &str) -> Result<DiagnosisResult, OracleError> {
    let object = extract_json_object(reply)
        .ok_or_else(|| OracleError::ParseError("Diagnosis reply holds no JSON object".into()))?;

    let [disease, organic, chemical, prevention] = FIELDS.map(|key| field_text(&object, key));

    Ok(DiagnosisResult {
        source: DiagnosisSource::Ai,
        disease: disease?,
        organic: organic?,
        chemical: chemical?,
        prevention: prevention?,
    })
}

fn field_text(object: &Map<String, Value>, key: &str) -> Result<String, OracleError> {
    match object.get(key) {
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(Value::Array(items)) => Ok(items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.trim().to_string(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; ")),
        Some(Value::Null) | None => Err(OracleError::ParseError(format!(
            "Diagnosis reply is missing '{}'",
            key
        ))),
        Some(other) => Ok(other.to_string()),
    }
}
