//! Triage domain types
//!
//! Shared between the engine, its HTTP adapter and the CLI. Everything here is
//! plain data: no I/O, no oracle access.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalogued symptom and its treatment plan
///
/// `symptom` is the unique key of the knowledge base. Records are created once
/// from seed data and never modified at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymptomRecord {
    pub symptom: String,
    pub disease: String,
    pub organic_treatment: String,
    pub chemical_treatment: String,
    pub prevention: String,
}

impl SymptomRecord {
    pub fn new(
        symptom: impl Into<String>,
        disease: impl Into<String>,
        organic_treatment: impl Into<String>,
        chemical_treatment: impl Into<String>,
        prevention: impl Into<String>,
    ) -> Self {
        Self {
            symptom: normalize_whitespace(&symptom.into()),
            disease: disease.into(),
            organic_treatment: organic_treatment.into(),
            chemical_treatment: chemical_treatment.into(),
            prevention: prevention.into(),
        }
    }

    /// Same record with the symptom key collapsed to single spaces
    pub fn normalized(mut self) -> Self {
        self.symptom = normalize_whitespace(&self.symptom);
        self
    }

    /// Convert into a diagnosis sourced from the local knowledge base
    pub fn into_diagnosis(self) -> DiagnosisResult {
        DiagnosisResult {
            source: DiagnosisSource::Database,
            disease: self.disease,
            organic: self.organic_treatment,
            chemical: self.chemical_treatment,
            prevention: self.prevention,
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Intent category assigned to one user utterance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Greeting,
    Morning,
    Afternoon,
    Evening,
    Night,
    Farewell,
    Thanks,
    Okay,
    CasualQuestion,
    PlantSymptom,
    Unrelated,

    /// Infrastructure failure while classifying. Never produced by parsing
    /// an oracle reply.
    Error,
}

impl Category {
    /// The nine small-talk categories answered with a canned reply
    pub const CASUAL: [Category; 9] = [
        Category::Greeting,
        Category::Morning,
        Category::Afternoon,
        Category::Evening,
        Category::Night,
        Category::Farewell,
        Category::Thanks,
        Category::Okay,
        Category::CasualQuestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::Morning => "morning",
            Category::Afternoon => "afternoon",
            Category::Evening => "evening",
            Category::Night => "night",
            Category::Farewell => "farewell",
            Category::Thanks => "thanks",
            Category::Okay => "okay",
            Category::CasualQuestion => "casual_question",
            Category::PlantSymptom => "plant_symptom",
            Category::Unrelated => "unrelated",
            Category::Error => "error",
        }
    }

    /// Parse a label emitted by the classifier oracle.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Returns `None` for anything outside the taxonomy, including the
    /// reserved `error` label.
    pub fn parse_label(label: &str) -> Option<Category> {
        let label = label.trim().to_ascii_lowercase();
        Self::CASUAL
            .iter()
            .chain([Category::PlantSymptom, Category::Unrelated].iter())
            .copied()
            .find(|c| c.as_str() == label)
    }

    pub fn is_casual(&self) -> bool {
        Self::CASUAL.contains(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a diagnosis came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisSource {
    Database,
    Ai,
}

/// A diagnosis with treatment advice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosisResult {
    pub source: DiagnosisSource,
    pub disease: String,
    pub organic: String,
    pub chemical: String,
    pub prevention: String,
}

/// Failure class of an error payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Bad or missing user input
    Validation,

    /// A dependency (the AI service) failed
    UpstreamService,

    /// Anything else
    #[default]
    Internal,
}

impl FailureClass {
    /// HTTP status code conventionally associated with this class
    pub fn status_code(&self) -> u16 {
        match self {
            FailureClass::Validation => 400,
            FailureClass::UpstreamService => 502,
            FailureClass::Internal => 500,
        }
    }
}

/// Outward-facing result of analyzing one utterance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Conversational or clarification message
    Message { message: String, is_casual: bool },

    /// A diagnosis from the knowledge base or the AI service
    Diagnosis {
        #[serde(flatten)]
        diagnosis: DiagnosisResult,
        is_casual: bool,
    },

    /// Terminal failure for this request
    Error {
        error: String,
        #[serde(skip)]
        class: FailureClass,
    },
}

impl ResponsePayload {
    pub fn casual(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
            is_casual: true,
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
            is_casual: false,
        }
    }

    pub fn diagnosis(diagnosis: DiagnosisResult) -> Self {
        Self::Diagnosis {
            diagnosis,
            is_casual: false,
        }
    }

    pub fn error(class: FailureClass, error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            class,
        }
    }

    /// Failure class, or `None` for successful payloads
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            Self::Error { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn is_casual(&self) -> bool {
        matches!(self, Self::Message { is_casual: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_label() {
        assert_eq!(Category::parse_label("greeting"), Some(Category::Greeting));
        assert_eq!(
            Category::parse_label("  Casual_Question "),
            Some(Category::CasualQuestion)
        );
        assert_eq!(
            Category::parse_label("plant_symptom"),
            Some(Category::PlantSymptom)
        );
        assert_eq!(Category::parse_label("error"), None);
        assert_eq!(Category::parse_label("weather"), None);
    }

    #[test]
    fn test_casual_set() {
        assert_eq!(Category::CASUAL.len(), 9);
        assert!(Category::Okay.is_casual());
        assert!(!Category::PlantSymptom.is_casual());
        assert!(!Category::Unrelated.is_casual());
        assert!(!Category::Error.is_casual());
    }

    #[test]
    fn test_record_symptom_is_whitespace_normalized() {
        let record = SymptomRecord::new("  yellow   spots\ton leaves ", "Rust", "a", "b", "c");
        assert_eq!(record.symptom, "yellow spots on leaves");
    }

    #[test]
    fn test_message_payload_shape() {
        let payload = ResponsePayload::casual("Hello!");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"message": "Hello!", "is_casual": true})
        );
    }

    #[test]
    fn test_diagnosis_payload_shape() {
        let record = SymptomRecord::new("white powder", "Powdery Mildew", "neem", "sulfur", "airflow");
        let payload = ResponsePayload::diagnosis(record.into_diagnosis());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "source": "database",
                "disease": "Powdery Mildew",
                "organic": "neem",
                "chemical": "sulfur",
                "prevention": "airflow",
                "is_casual": false
            })
        );
    }

    #[test]
    fn test_error_payload_hides_class() {
        let payload = ResponsePayload::error(FailureClass::UpstreamService, "AI service failed");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"error": "AI service failed"})
        );
        assert_eq!(payload.failure_class(), Some(FailureClass::UpstreamService));
        assert_eq!(FailureClass::UpstreamService.status_code(), 502);
    }

    #[test]
    fn test_payload_deserializes_each_shape() {
        let ai: ResponsePayload = serde_json::from_value(json!({
            "source": "ai", "disease": "Unknown", "organic": "-", "chemical": "-",
            "prevention": "More detail needed", "is_casual": false
        }))
        .unwrap();
        assert!(matches!(
            ai,
            ResponsePayload::Diagnosis { ref diagnosis, .. } if diagnosis.source == DiagnosisSource::Ai
        ));

        let err: ResponsePayload = serde_json::from_value(json!({"error": "x"})).unwrap();
        assert_eq!(err.failure_class(), Some(FailureClass::Internal));
    }
}
