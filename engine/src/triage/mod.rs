//! Symptom triage
//!
//! Routes each utterance through the cheapest stage that can answer it:
//! a canned reply for small talk, the local knowledge base for catalogued
//! symptoms, and the diagnosis oracle for everything else.

pub mod classifier;
pub mod diagnosis;
pub mod matcher;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;

pub use classifier::IntentClassifier;
pub use diagnosis::DiagnosisOracle;
pub use matcher::{tokenize, KnowledgeBase, MatchOutcome, MemoryKnowledgeBase, SymptomMatcher};
pub use normalizer::SpellingNormalizer;
pub use pipeline::{casual_reply, Analysis, Outcome, Stage, TriagePipeline, TriageSettings};
