//! Symptom Matcher
//!
//! Tokenizes corrected symptom text and looks it up in the knowledge base.
//! A record matches when every token appears in its symptom phrase as a whole
//! word (case-insensitive). When several records match, the first in the
//! knowledge base's stable order wins.

use async_trait::async_trait;
use regex::Regex;
use sdk::errors::EngineError;
use sdk::types::SymptomRecord;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("Invalid token pattern"))
}

/// Split text into lower-cased alphanumeric tokens.
///
/// Punctuation and whitespace separate tokens. Order of first appearance is
/// kept and repeats are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// True when every token occurs in `symptom` as a whole word
pub fn record_matches(symptom: &str, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return false;
    }
    let words: HashSet<String> = tokenize(symptom).into_iter().collect();
    tokens.iter().all(|token| words.contains(&token.to_lowercase()))
}

/// Read-only symptom lookup
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// First record, in stable store order, matching all `tokens`.
    ///
    /// Returns `None` for an empty token list.
    async fn find_by_tokens(&self, tokens: &[String])
        -> Result<Option<SymptomRecord>, EngineError>;
}

/// Knowledge base held in memory, ordered by insertion
#[derive(Debug, Clone, Default)]
pub struct MemoryKnowledgeBase {
    records: Vec<SymptomRecord>,
}

impl MemoryKnowledgeBase {
    /// Build from seed records. Later duplicates of a symptom key are dropped.
    pub fn new(records: Vec<SymptomRecord>) -> Self {
        let mut keys = HashSet::new();
        let records = records
            .into_iter()
            .map(SymptomRecord::normalized)
            .filter(|record| keys.insert(record.symptom.clone()))
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl KnowledgeBase for MemoryKnowledgeBase {
    async fn find_by_tokens(
        &self,
        tokens: &[String],
    ) -> Result<Option<SymptomRecord>, EngineError> {
        Ok(self
            .records
            .iter()
            .find(|record| record_matches(&record.symptom, tokens))
            .cloned())
    }
}

/// Result of matching one piece of symptom text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The text held no alphanumeric tokens
    InsufficientInput,

    /// Tokens were found but no record contains all of them
    NoMatch,

    Matched(SymptomRecord),
}

/// Tokenizes text and queries the knowledge base
#[derive(Clone)]
pub struct SymptomMatcher {
    knowledge_base: Arc<dyn KnowledgeBase>,
}

impl SymptomMatcher {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>) -> Self {
        Self { knowledge_base }
    }

    /// Look up already-extracted tokens.
    ///
    /// Empty input is reported as `InsufficientInput` without touching the store.
    pub async fn lookup(&self, tokens: &[String]) -> Result<MatchOutcome, EngineError> {
        if tokens.is_empty() {
            return Ok(MatchOutcome::InsufficientInput);
        }

        Ok(match self.knowledge_base.find_by_tokens(tokens).await? {
            Some(record) => MatchOutcome::Matched(record),
            None => MatchOutcome::NoMatch,
        })
    }

    /// Tokenize `text` and look it up
    pub async fn match_text(&self, text: &str) -> Result<MatchOutcome, EngineError> {
        self.lookup(&tokenize(text)).await
    }
}
