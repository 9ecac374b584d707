//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use leafdoc_engine::llm::{OracleError, ReplyFormat, ReplyRequest, Result, StructuredOracle};
use leafdoc_engine::triage::{KnowledgeBase, MemoryKnowledgeBase};
use sdk::errors::EngineError;
use sdk::types::SymptomRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Oracle that hands out scripted replies in order and records every request.
///
/// When the script runs dry it answers with a `ParseError`, which every
/// stage treats as a soft failure.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ReplyRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn category(self, label: &str) -> Self {
        self.reply(&format!(r#"{{"category": "{}"}}"#, label))
    }

    pub fn fail(self, error: OracleError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ReplyRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests asking for a JSON reply at `temperature`
    pub fn json_calls_at(&self, temperature: f64) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.format == ReplyFormat::Json && r.temperature == temperature)
            .count()
    }
}

#[async_trait]
impl StructuredOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate_structured_reply(&self, request: &ReplyRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::ParseError("script exhausted".to_string())))
    }
}

pub fn record(symptom: &str, disease: &str) -> SymptomRecord {
    SymptomRecord::new(
        symptom,
        disease,
        format!("{} organic", disease),
        format!("{} chemical", disease),
        format!("{} prevention", disease),
    )
}

/// Small knowledge base mirroring a few bundled records
pub fn knowledge_base() -> MemoryKnowledgeBase {
    MemoryKnowledgeBase::new(vec![
        record("yellow spots on leaves", "Septoria Leaf Spot"),
        record("white powdery substance on leaves", "Powdery Mildew"),
        record("brown spots with yellow halo", "Bacterial Leaf Spot"),
    ])
}

pub const DIAGNOSIS_REPLY: &str = r#"{"disease": "Phosphorus Deficiency", "organic": "Bone meal", "chemical": "Superphosphate", "prevention": "Test soil yearly"}"#;

/// Knowledge base wrapper counting lookups, optionally failing every one
pub struct CountingKnowledgeBase {
    inner: MemoryKnowledgeBase,
    lookups: AtomicUsize,
    fail: bool,
}

impl CountingKnowledgeBase {
    pub fn new(inner: MemoryKnowledgeBase) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(MemoryKnowledgeBase::default())
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeBase for CountingKnowledgeBase {
    async fn find_by_tokens(
        &self,
        tokens: &[String],
    ) -> std::result::Result<Option<SymptomRecord>, EngineError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EngineError::Database("database is locked".to_string()));
        }
        self.inner.find_by_tokens(tokens).await
    }
}
