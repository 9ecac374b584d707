//! Integration tests for the triage pipeline
//!
//! The network is replaced by a scripted oracle; the knowledge base is held in
//! memory and counts its lookups.

mod common;

use common::{knowledge_base, CountingKnowledgeBase, ScriptedOracle, DIAGNOSIS_REPLY};
use leafdoc_engine::llm::{OracleError, ReplyFormat};
use leafdoc_engine::triage::pipeline::{
    NEED_DETAIL_MESSAGE, UNRELATED_MESSAGE, UPSTREAM_FAILURE_MESSAGE,
};
use leafdoc_engine::triage::{casual_reply, Outcome, TriagePipeline, TriageSettings};
use sdk::types::{Category, DiagnosisSource, FailureClass, ResponsePayload};
use serde_json::json;
use std::sync::Arc;

fn pipeline(oracle: &Arc<ScriptedOracle>, kb: &Arc<CountingKnowledgeBase>) -> TriagePipeline {
    TriagePipeline::new(oracle.clone(), kb.clone(), TriageSettings::default())
}

fn fixtures(oracle: ScriptedOracle) -> (Arc<ScriptedOracle>, Arc<CountingKnowledgeBase>) {
    (
        Arc::new(oracle),
        Arc::new(CountingKnowledgeBase::new(knowledge_base())),
    )
}

#[tokio::test]
async fn test_casual_categories_return_canned_reply() {
    for category in Category::CASUAL {
        let (oracle, kb) = fixtures(ScriptedOracle::new().category(category.as_str()));
        let payload = pipeline(&oracle, &kb).analyze("hello there").await;

        assert_eq!(
            payload,
            ResponsePayload::casual(casual_reply(category).unwrap()),
            "category {}",
            category
        );
        assert_eq!(oracle.calls(), 1, "only the classifier runs for {}", category);
        assert_eq!(kb.lookups(), 0);
    }
}

#[tokio::test]
async fn test_greeting_payload_shape() {
    let (oracle, kb) = fixtures(ScriptedOracle::new().category("greeting"));
    let payload = pipeline(&oracle, &kb).analyze("helooe").await;

    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({
            "message": "Hello! I'm here to help with plant disease diagnosis. Please describe any symptoms you're observing.",
            "is_casual": true
        })
    );
}

#[tokio::test]
async fn test_unrelated_returns_clarification() {
    let (oracle, kb) = fixtures(ScriptedOracle::new().category("unrelated"));
    let payload = pipeline(&oracle, &kb).analyze("how's the weather").await;

    assert_eq!(payload, ResponsePayload::notice(UNRELATED_MESSAGE));
    assert!(!payload.is_casual());
    assert_eq!(kb.lookups(), 0);
}

#[tokio::test]
async fn test_malformed_classification_is_unrelated() {
    let (oracle, kb) = fixtures(ScriptedOracle::new().reply("I think this is a greeting"));
    let payload = pipeline(&oracle, &kb).analyze("hhh").await;

    assert_eq!(payload, ResponsePayload::notice(UNRELATED_MESSAGE));
}

#[tokio::test]
async fn test_empty_input_is_validation_error_without_calls() {
    for input in ["", "   ", "\n\t"] {
        let (oracle, kb) = fixtures(ScriptedOracle::new());
        let payload = pipeline(&oracle, &kb).analyze(input).await;

        assert_eq!(payload.failure_class(), Some(FailureClass::Validation));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"error": "Please describe plant symptoms"})
        );
        assert_eq!(oracle.calls(), 0);
        assert_eq!(kb.lookups(), 0);
    }
}

#[tokio::test]
async fn test_no_tokens_needs_detail_without_lookup() {
    let (oracle, kb) = fixtures(ScriptedOracle::new().category("plant_symptom").reply("!!!"));
    let payload = pipeline(&oracle, &kb).analyze("!!!").await;

    assert_eq!(payload, ResponsePayload::notice(NEED_DETAIL_MESSAGE));
    assert_eq!(oracle.calls(), 2, "classifier and normalizer only");
    assert_eq!(kb.lookups(), 0);
}

#[tokio::test]
async fn test_database_hit_returns_stored_fields() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("yellow spots on leaves"),
    );
    let payload = pipeline(&oracle, &kb).analyze("yellow spots on leaves").await;

    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({
            "source": "database",
            "disease": "Septoria Leaf Spot",
            "organic": "Septoria Leaf Spot organic",
            "chemical": "Septoria Leaf Spot chemical",
            "prevention": "Septoria Leaf Spot prevention",
            "is_casual": false
        })
    );
    assert_eq!(oracle.calls(), 2, "no diagnosis call on a database hit");
    assert_eq!(kb.lookups(), 1);
}

#[tokio::test]
async fn test_partial_phrase_matches_record() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("White powdery leaves"),
    );
    let payload = pipeline(&oracle, &kb).analyze("whit powdery leafs").await;

    match payload {
        ResponsePayload::Diagnosis { diagnosis, .. } => {
            assert_eq!(diagnosis.source, DiagnosisSource::Database);
            assert_eq!(diagnosis.disease, "Powdery Mildew");
        }
        other => panic!("expected a diagnosis, got {:?}", other),
    }
}

#[tokio::test]
async fn test_database_miss_calls_diagnosis_once() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("curled purple leaves")
            .reply(DIAGNOSIS_REPLY),
    );
    let payload = pipeline(&oracle, &kb).analyze("Curled purple leaves").await;

    match &payload {
        ResponsePayload::Diagnosis { diagnosis, is_casual } => {
            assert_eq!(diagnosis.source, DiagnosisSource::Ai);
            assert_eq!(diagnosis.disease, "Phosphorus Deficiency");
            assert!(!is_casual);
        }
        other => panic!("expected a diagnosis, got {:?}", other),
    }

    assert_eq!(oracle.calls(), 3);
    assert_eq!(oracle.json_calls_at(0.3), 1, "exactly one diagnosis call");
    assert_eq!(kb.lookups(), 1);
}

#[tokio::test]
async fn test_diagnosis_sees_original_text() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("curled purple leaves")
            .reply(DIAGNOSIS_REPLY),
    );
    pipeline(&oracle, &kb).analyze("  Curld PURPLE leeves  ").await;

    let requests = oracle.requests();
    assert_eq!(requests[1].format, ReplyFormat::Text);
    assert!(requests[1].prompt.contains("\"curld purple leeves\""));
    assert!(requests[2].prompt.contains("\"Curld PURPLE leeves\""));
}

#[tokio::test]
async fn test_diagnosis_transport_failure_is_upstream_error() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("blue fuzz on stems")
            .fail(OracleError::Timeout),
    );
    let payload = pipeline(&oracle, &kb).analyze("blue fuzz on stems").await;

    assert_eq!(payload.failure_class(), Some(FailureClass::UpstreamService));
    assert_eq!(
        payload,
        ResponsePayload::error(FailureClass::UpstreamService, UPSTREAM_FAILURE_MESSAGE)
    );
}

#[tokio::test]
async fn test_diagnosis_missing_field_is_upstream_error() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("blue fuzz on stems")
            .reply(r#"{"disease": "Gray Mold", "organic": "remove"}"#),
    );
    let payload = pipeline(&oracle, &kb).analyze("blue fuzz on stems").await;

    assert_eq!(payload.failure_class(), Some(FailureClass::UpstreamService));
}

#[tokio::test]
async fn test_classifier_transport_failure_is_internal_error() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new().fail(OracleError::AuthenticationFailed("bad key".into())),
    );
    let payload = pipeline(&oracle, &kb).analyze("yellow spots").await;

    assert_eq!(payload.failure_class(), Some(FailureClass::Internal));
    assert_eq!(oracle.calls(), 1);
    assert_eq!(kb.lookups(), 0);
}

#[tokio::test]
async fn test_normalizer_failure_falls_back_to_input() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .fail(OracleError::NetworkError("reset".into())),
    );
    let payload = pipeline(&oracle, &kb).analyze("Yellow spots").await;

    match payload {
        ResponsePayload::Diagnosis { diagnosis, .. } => {
            assert_eq!(diagnosis.disease, "Septoria Leaf Spot")
        }
        other => panic!("expected a diagnosis, got {:?}", other),
    }
}

#[tokio::test]
async fn test_knowledge_base_failure_is_internal_error() {
    let oracle = Arc::new(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("yellow spots"),
    );
    let kb = Arc::new(CountingKnowledgeBase::failing());
    let analysis = pipeline(&oracle, &kb).run("yellow spots").await;

    assert!(matches!(analysis.outcome, Outcome::InternalFailure(_)));
    let payload = analysis.outcome.into_payload();
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({"error": "An internal server error occurred."})
    );
    assert_eq!(oracle.calls(), 2, "no diagnosis after a store failure");
}

#[tokio::test]
async fn test_same_input_same_replies_same_payload() {
    let script = || {
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("curled purple leaves")
            .reply(DIAGNOSIS_REPLY)
    };

    let (first_oracle, first_kb) = fixtures(script());
    let (second_oracle, second_kb) = fixtures(script());

    let first = pipeline(&first_oracle, &first_kb)
        .analyze("curled purple leaves")
        .await;
    let second = pipeline(&second_oracle, &second_kb)
        .analyze("curled purple leaves")
        .await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_configured_temperatures_reach_oracle() {
    let (oracle, kb) = fixtures(
        ScriptedOracle::new()
            .category("plant_symptom")
            .reply("curled purple leaves")
            .reply(DIAGNOSIS_REPLY),
    );
    let settings = TriageSettings {
        classify_temperature: 0.0,
        correction_temperature: 0.2,
        diagnosis_temperature: 0.9,
    };
    TriagePipeline::new(oracle.clone(), kb.clone(), settings)
        .analyze("curled purple leaves")
        .await;

    let temperatures: Vec<f64> = oracle.requests().iter().map(|r| r.temperature).collect();
    assert_eq!(temperatures, vec![0.0, 0.2, 0.9]);
}
