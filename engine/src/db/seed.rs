//! Knowledge base seed data
//!
//! Seed files use the `{"diseases": [{symptom, disease, organic_treatment,
//! chemical_treatment, prevention}, ...]}` layout. A copy ships inside the
//! binary and is used whenever no usable seed file is configured.

use sdk::errors::EngineError;
use sdk::types::SymptomRecord;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Seed shipped with the binary
pub const BUNDLED_SEED: &str = include_str!("../../data/plant_diseases.json");

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    diseases: Vec<SymptomRecord>,
}

/// Decode seed JSON into records with whitespace-normalized symptom keys
pub fn parse_seed(json: &str) -> Result<Vec<SymptomRecord>, EngineError> {
    let seed: SeedFile = serde_json::from_str(json)
        .map_err(|e| EngineError::Seed(format!("Could not decode seed data: {}", e)))?;

    Ok(seed
        .diseases
        .into_iter()
        .map(SymptomRecord::normalized)
        .filter(|record| !record.symptom.is_empty())
        .collect())
}

/// Load seed records from `path`, falling back to the bundled seed.
///
/// A missing or undecodable file is logged and never fatal.
pub async fn load_seed(path: Option<&Path>) -> Result<Vec<SymptomRecord>, EngineError> {
    if let Some(path) = path {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => match parse_seed(&contents) {
                Ok(records) => {
                    info!("Loaded {} seed records from {}", records.len(), path.display());
                    return Ok(records);
                }
                Err(e) => warn!("{}; using bundled seed instead", e),
            },
            Err(e) => warn!(
                "Seed file {} not readable ({}); using bundled seed instead",
                path.display(),
                e
            ),
        }
    }

    parse_seed(BUNDLED_SEED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bundled_seed_is_valid() {
        let records = parse_seed(BUNDLED_SEED).unwrap();
        assert!(records.len() >= 10);
        assert!(records.iter().any(|r| r.symptom == "yellow spots on leaves"));
    }

    #[test]
    fn test_parse_seed_normalizes_symptoms() {
        let json = r#"{"diseases": [
            {"symptom": "  curled   leaves ", "disease": "Leaf Curl",
             "organic_treatment": "a", "chemical_treatment": "b", "prevention": "c"},
            {"symptom": "   ", "disease": "Nothing",
             "organic_treatment": "a", "chemical_treatment": "b", "prevention": "c"}
        ]}"#;
        let records = parse_seed(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symptom, "curled leaves");
    }

    #[test]
    fn test_parse_seed_without_diseases_key_is_empty() {
        assert!(parse_seed("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_seed_rejects_garbage() {
        assert!(matches!(parse_seed("not json"), Err(EngineError::Seed(_))));
    }

    #[tokio::test]
    async fn test_load_seed_falls_back_when_missing() {
        let records = load_seed(Some(Path::new("/definitely/not/here.json")))
            .await
            .unwrap();
        assert_eq!(records, parse_seed(BUNDLED_SEED).unwrap());
    }

    #[tokio::test]
    async fn test_load_seed_falls_back_when_undecodable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ broken").unwrap();

        let records = load_seed(Some(file.path())).await.unwrap();
        assert_eq!(records, parse_seed(BUNDLED_SEED).unwrap());
    }

    #[tokio::test]
    async fn test_load_seed_reads_custom_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"diseases": [{{"symptom": "holes in leaves", "disease": "Flea Beetle",
                "organic_treatment": "row covers", "chemical_treatment": "spinosad",
                "prevention": "crop rotation"}}]}}"#
        )
        .unwrap();

        let records = load_seed(Some(file.path())).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].disease, "Flea Beetle");
    }
}
