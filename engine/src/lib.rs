//! Leafdoc Engine Library
//!
//! This library provides the plant symptom triage pipeline and its adapters.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Knowledge base persistence module
pub mod db;

/// AI oracle abstraction layer
pub mod llm;

/// Triage pipeline: classifier, normalizer, matcher, diagnosis, orchestrator
pub mod triage;

/// HTTP adapter
pub mod server;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
