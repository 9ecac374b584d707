//! Pipeline Orchestrator
//!
//! Drives one utterance through an explicit state machine:
//!
//! ```text
//! Validating -> Classifying -> Normalizing -> Matching -> Diagnosing -> Responding
//!      |             |              |             |
//!      +-------------+--------------+-------------+------------------> Responding
//! ```
//!
//! Every early exit is a named [`Outcome`]. Small talk and catalogued symptoms
//! never reach the diagnosis oracle; only symptoms missing from the knowledge
//! base pay for the generative call.

use sdk::types::{Category, DiagnosisResult, FailureClass, ResponsePayload, SymptomRecord};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::classifier::IntentClassifier;
use super::diagnosis::DiagnosisOracle;
use super::matcher::{tokenize, KnowledgeBase, MatchOutcome, SymptomMatcher};
use super::normalizer::SpellingNormalizer;
use crate::config::OracleConfig;
use crate::llm::StructuredOracle;
use crate::secrets::SecretManager;

pub const VALIDATION_MESSAGE: &str = "Please describe plant symptoms";
pub const UNRELATED_MESSAGE: &str = "I couldn't understand your input. Please provide valid plant symptoms, such as 'yellow spots on leaves' or 'white powdery substance'.";
pub const NEED_DETAIL_MESSAGE: &str = "Please provide more details about the symptoms.";
pub const CLASSIFIER_FAILURE_MESSAGE: &str =
    "Could not process the request due to an internal error.";
pub const UPSTREAM_FAILURE_MESSAGE: &str =
    "An error occurred while communicating with the AI service.";
pub const INTERNAL_FAILURE_MESSAGE: &str = "An internal server error occurred.";

/// Canned reply for the nine small-talk categories
pub fn casual_reply(category: Category) -> Option<&'static str> {
    Some(match category {
        Category::Greeting => "Hello! I'm here to help with plant disease diagnosis. Please describe any symptoms you're observing.",
        Category::Morning => "Good morning! How can I assist you with your plant health today?",
        Category::Afternoon => "Good afternoon! What plant health issues can I help you with?",
        Category::Evening => "Good evening! I'm ready to assist with any plant disease questions you have.",
        Category::Night => "Good night! If you have any plant health concerns, feel free to ask.",
        Category::CasualQuestion => "I'm just a bot, but I'm ready to help with plant health issues! What symptoms are you seeing?",
        Category::Thanks => "You're welcome! Let me know if you have any other plant health concerns.",
        Category::Farewell => "Goodbye! Feel free to ask if you have more questions about plant diseases later.",
        Category::Okay => "Got it! Please describe any plant symptoms you're observing to continue.",
        Category::PlantSymptom | Category::Unrelated | Category::Error => return None,
    })
}

/// Sampling temperatures for the three oracle calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriageSettings {
    pub classify_temperature: f64,
    pub correction_temperature: f64,
    pub diagnosis_temperature: f64,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self::from(&OracleConfig::default())
    }
}

impl From<&OracleConfig> for TriageSettings {
    fn from(config: &OracleConfig) -> Self {
        Self {
            classify_temperature: config.classify_temperature,
            correction_temperature: config.correction_temperature,
            diagnosis_temperature: config.diagnosis_temperature,
        }
    }
}

/// Pipeline stages, in the order they can be visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Classifying,
    Normalizing,
    Matching,
    Diagnosing,
    Responding,
}

/// Terminal result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Input was empty after trimming
    EmptyInput,

    /// Small talk answered with a canned reply
    Casual(Category),

    /// Classified as unrelated to plant health
    Unrelated,

    /// The classifier's oracle call failed at the transport level
    ClassifierUnavailable,

    /// No alphanumeric tokens after normalization
    NeedsDetail,

    /// Knowledge base hit
    DatabaseMatch(SymptomRecord),

    /// Generated diagnosis for an uncatalogued symptom
    AiDiagnosis(DiagnosisResult),

    /// The diagnosis oracle failed (transport or unreadable reply)
    DiagnosisFailed(String),

    /// Anything else, e.g. a knowledge base failure
    InternalFailure(String),
}

impl Outcome {
    pub fn into_payload(self) -> ResponsePayload {
        match self {
            Outcome::EmptyInput => {
                ResponsePayload::error(FailureClass::Validation, VALIDATION_MESSAGE)
            }
            Outcome::Casual(category) => match casual_reply(category) {
                Some(message) => ResponsePayload::casual(message),
                None => ResponsePayload::error(FailureClass::Internal, INTERNAL_FAILURE_MESSAGE),
            },
            Outcome::Unrelated => ResponsePayload::notice(UNRELATED_MESSAGE),
            Outcome::ClassifierUnavailable => {
                ResponsePayload::error(FailureClass::Internal, CLASSIFIER_FAILURE_MESSAGE)
            }
            Outcome::NeedsDetail => ResponsePayload::notice(NEED_DETAIL_MESSAGE),
            Outcome::DatabaseMatch(record) => ResponsePayload::diagnosis(record.into_diagnosis()),
            Outcome::AiDiagnosis(diagnosis) => ResponsePayload::diagnosis(diagnosis),
            Outcome::DiagnosisFailed(_) => {
                ResponsePayload::error(FailureClass::UpstreamService, UPSTREAM_FAILURE_MESSAGE)
            }
            Outcome::InternalFailure(_) => {
                ResponsePayload::error(FailureClass::Internal, INTERNAL_FAILURE_MESSAGE)
            }
        }
    }
}

/// An outcome together with the stages visited to reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub path: Vec<Stage>,
    pub outcome: Outcome,
}

/// Machine state; each variant carries what the next step needs
enum State {
    Validating(String),
    Classifying(String),
    Normalizing(String),
    Matching { original: String, tokens: Vec<String> },
    Diagnosing(String),
    Responding(Outcome),
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            State::Validating(_) => Stage::Validating,
            State::Classifying(_) => Stage::Classifying,
            State::Normalizing(_) => Stage::Normalizing,
            State::Matching { .. } => Stage::Matching,
            State::Diagnosing(_) => Stage::Diagnosing,
            State::Responding(_) => Stage::Responding,
        }
    }
}

/// The triage pipeline. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct TriagePipeline {
    classifier: IntentClassifier,
    normalizer: SpellingNormalizer,
    matcher: SymptomMatcher,
    diagnosis: DiagnosisOracle,
}

impl TriagePipeline {
    pub fn new(
        oracle: Arc<dyn StructuredOracle>,
        knowledge_base: Arc<dyn KnowledgeBase>,
        settings: TriageSettings,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(oracle.clone(), settings.classify_temperature),
            normalizer: SpellingNormalizer::new(oracle.clone(), settings.correction_temperature),
            matcher: SymptomMatcher::new(knowledge_base),
            diagnosis: DiagnosisOracle::new(oracle, settings.diagnosis_temperature),
        }
    }

    /// `AnalyzeSymptoms`: one utterance in, one payload out
    pub async fn analyze(&self, symptoms: &str) -> ResponsePayload {
        self.run(symptoms).await.outcome.into_payload()
    }

    /// Run the state machine and keep the path taken
    pub async fn run(&self, symptoms: &str) -> Analysis {
        let mut path = Vec::new();
        let mut state = State::Validating(symptoms.to_string());

        loop {
            path.push(state.stage());
            state = match state {
                State::Responding(outcome) => {
                    info!("Triage finished: {} via {:?}", outcome_label(&outcome), path);
                    return Analysis { path, outcome };
                }
                other => self.step(other).await,
            };
        }
    }

    async fn step(&self, state: State) -> State {
        match state {
            State::Validating(raw) => {
                let trimmed = raw.trim();
                debug!("Received input: {:?}", trimmed);
                if trimmed.is_empty() {
                    State::Responding(Outcome::EmptyInput)
                } else {
                    State::Classifying(trimmed.to_string())
                }
            }

            State::Classifying(text) => match self.classifier.classify(&text).await {
                Category::Error => {
                    error!("Classification error occurred");
                    State::Responding(Outcome::ClassifierUnavailable)
                }
                Category::Unrelated => State::Responding(Outcome::Unrelated),
                Category::PlantSymptom => State::Normalizing(text),
                casual => State::Responding(Outcome::Casual(casual)),
            },

            State::Normalizing(original) => {
                let corrected = self.normalizer.normalize(&original.to_lowercase()).await;
                let tokens = tokenize(&corrected);
                if tokens.is_empty() {
                    debug!("No valid words found in input");
                    State::Responding(Outcome::NeedsDetail)
                } else {
                    State::Matching { original, tokens }
                }
            }

            State::Matching { original, tokens } => match self.matcher.lookup(&tokens).await {
                Ok(MatchOutcome::Matched(record)) => {
                    debug!("Database match found: {}", record.disease);
                    State::Responding(Outcome::DatabaseMatch(record))
                }
                Ok(MatchOutcome::NoMatch) => {
                    debug!("No database match for {:?}", tokens);
                    State::Diagnosing(original)
                }
                Ok(MatchOutcome::InsufficientInput) => State::Responding(Outcome::NeedsDetail),
                Err(e) => {
                    error!("Knowledge base lookup failed: {}", e);
                    State::Responding(Outcome::InternalFailure(e.to_string()))
                }
            },

            State::Diagnosing(original) => match self.diagnosis.diagnose(&original).await {
                Ok(diagnosis) => State::Responding(Outcome::AiDiagnosis(diagnosis)),
                Err(e) => {
                    let detail = SecretManager::scrub(&e.to_string());
                    error!("AI diagnosis failed: {}", detail);
                    State::Responding(Outcome::DiagnosisFailed(detail))
                }
            },

            responding @ State::Responding(_) => responding,
        }
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::EmptyInput => "empty_input",
        Outcome::Casual(_) => "casual",
        Outcome::Unrelated => "unrelated",
        Outcome::ClassifierUnavailable => "classifier_unavailable",
        Outcome::NeedsDetail => "needs_detail",
        Outcome::DatabaseMatch(_) => "database_match",
        Outcome::AiDiagnosis(_) => "ai_diagnosis",
        Outcome::DiagnosisFailed(_) => "diagnosis_failed",
        Outcome::InternalFailure(_) => "internal_failure",
    }
}
