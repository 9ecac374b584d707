/// Symptom record persistence
///
/// Seeding and read-only lookups over the `diseases` table. All queries are
/// parameterized.
use anyhow::{Context, Result};
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::SymptomRecord;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::triage::matcher::{record_matches, KnowledgeBase};

/// Symptom repository for database operations
#[derive(Clone)]
pub struct SymptomRepository {
    pool: SqlitePool,
}

impl SymptomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of catalogued symptoms
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(id) FROM diseases")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count diseases")
    }

    /// Insert `records` only if the table is empty.
    ///
    /// Duplicate symptom keys within the seed are ignored. Returns the number
    /// of rows inserted (0 when the table was already populated).
    pub async fn seed_if_empty(&self, records: &[SymptomRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await.context("Failed to begin seed")?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM diseases")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count diseases")?;

        if existing > 0 {
            debug!("Knowledge base already holds {} records, skipping seed", existing);
            return Ok(0);
        }

        let mut inserted = 0;
        for record in records {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO diseases
                    (symptom, disease, organic_treatment, chemical_treatment, prevention)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.symptom)
            .bind(&record.disease)
            .bind(&record.organic_treatment)
            .bind(&record.chemical_treatment)
            .bind(&record.prevention)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert symptom '{}'", record.symptom))?;

            inserted += result.rows_affected();
        }

        tx.commit().await.context("Failed to commit seed")?;

        info!("Database initialized with {} records", inserted);
        Ok(inserted)
    }

    /// List records in id order
    pub async fn list(&self, limit: i64) -> Result<Vec<SymptomRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT symptom, disease, organic_treatment, chemical_treatment, prevention
            FROM diseases
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list diseases")?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    /// First record (lowest id) whose symptom contains every token as a whole word.
    ///
    /// A `LIKE` prefilter over a few of the tokens narrows the candidates in
    /// SQL; every token is then confirmed with the same tokenizer the pipeline
    /// uses on user input.
    pub async fn find_by_tokens(&self, tokens: &[String]) -> Result<Option<SymptomRecord>> {
        if tokens.is_empty() {
            return Ok(None);
        }

        let prefilter = prefilter_tokens(tokens);
        let conditions = if prefilter.is_empty() {
            "1".to_string()
        } else {
            vec![r"symptom LIKE ? ESCAPE '\'"; prefilter.len()].join(" AND ")
        };
        let sql = format!(
            "SELECT symptom, disease, organic_treatment, chemical_treatment, prevention \
             FROM diseases WHERE {} ORDER BY id",
            conditions
        );

        let mut query = sqlx::query(&sql);
        for token in &prefilter {
            query = query.bind(format!("%{}%", escape_like(token)));
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to query diseases by tokens")?;

        debug!(
            "{} candidate rows for {} tokens ({} prefiltered)",
            rows.len(),
            tokens.len(),
            prefilter.len()
        );

        Ok(rows
            .iter()
            .map(row_to_record)
            .find(|record| record_matches(&record.symptom, tokens)))
    }
}

/// Most tokens pushed into the SQL prefilter
const MAX_PREFILTER_TOKENS: usize = 8;

/// Tokens safe to hand to `LIKE`, longest first.
///
/// SQLite only folds ASCII case, so tokens with other characters are left to
/// the whole-word check.
fn prefilter_tokens(tokens: &[String]) -> Vec<&str> {
    let mut ascii: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| t.is_ascii())
        .collect();
    ascii.sort_by(|a, b| b.len().cmp(&a.len()));
    ascii.truncate(MAX_PREFILTER_TOKENS);
    ascii
}

#[async_trait]
impl KnowledgeBase for SymptomRepository {
    async fn find_by_tokens(
        &self,
        tokens: &[String],
    ) -> std::result::Result<Option<SymptomRecord>, EngineError> {
        SymptomRepository::find_by_tokens(self, tokens)
            .await
            .map_err(|e| EngineError::Database(format!("{:#}", e)))
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> SymptomRecord {
    SymptomRecord {
        symptom: row.get("symptom"),
        disease: row.get("disease"),
        organic_treatment: row.get("organic_treatment"),
        chemical_treatment: row.get("chemical_treatment"),
        prevention: row.get("prevention"),
    }
}

/// Escape LIKE wildcards so tokens only ever match literally
fn escape_like(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for ch in token.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
