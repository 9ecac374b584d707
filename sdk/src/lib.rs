//! Leafdoc SDK
//!
//! Shared types and errors for the Leafdoc plant triage engine.

/// Error types and handling
pub mod errors;

/// Triage domain types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, LeafdocErrorExt};
pub use types::{
    normalize_whitespace, Category, DiagnosisResult, DiagnosisSource, FailureClass,
    ResponsePayload, SymptomRecord,
};
