//! Micro-credential persistence operations.
//!
//! Operates on `micro_credentials` and its two child tables,
//! `learning_outcomes` and `prerequisites`. Writes that touch children run
//! in one transaction so a credential is never persisted half-updated.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{parse_column, parse_optional_column};
use crate::state::{CredentialRecord, LearningOutcome, Prerequisite};

const TABLE: &str = "micro_credentials";

/// Insert a credential together with its outcomes and prerequisites.
pub async fn insert(pool: &PgPool, record: &CredentialRecord) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO micro_credentials (id, title, description, program_code, institution_id,
         credential_type, delivery_mode, level, credit_value, credit_type, duration_hours,
         program_url, status, effective_date, expiry_date, is_active, published_at,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
         $18, $19)",
    )
    .bind(record.id)
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.program_code)
    .bind(record.institution_id)
    .bind(record.credential_type.as_str())
    .bind(record.delivery_mode.as_str())
    .bind(record.level.as_str())
    .bind(record.credit_value)
    .bind(record.credit_type.map(|t| t.as_str()))
    .bind(record.duration_hours)
    .bind(&record.program_url)
    .bind(record.status.as_str())
    .bind(record.effective_date)
    .bind(record.expiry_date)
    .bind(record.is_active)
    .bind(record.published_at)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(&mut *tx)
    .await?;

    insert_children(&mut *tx, record).await?;
    tx.commit().await
}

/// Overwrite the editable columns and replace both child lists.
/// Status columns are left to [`update_status`].
pub async fn update(pool: &PgPool, record: &CredentialRecord) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE micro_credentials SET title = $1, description = $2, program_code = $3,
         institution_id = $4, credential_type = $5, delivery_mode = $6, level = $7,
         credit_value = $8, credit_type = $9, duration_hours = $10, program_url = $11,
         effective_date = $12, expiry_date = $13, is_active = $14, updated_at = $15
         WHERE id = $16",
    )
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.program_code)
    .bind(record.institution_id)
    .bind(record.credential_type.as_str())
    .bind(record.delivery_mode.as_str())
    .bind(record.level.as_str())
    .bind(record.credit_value)
    .bind(record.credit_type.map(|t| t.as_str()))
    .bind(record.duration_hours)
    .bind(&record.program_url)
    .bind(record.effective_date)
    .bind(record.expiry_date)
    .bind(record.is_active)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM learning_outcomes WHERE micro_credential_id = $1")
        .bind(record.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM prerequisites WHERE micro_credential_id = $1")
        .bind(record.id)
        .execute(&mut *tx)
        .await?;
    insert_children(&mut *tx, record).await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Persist a workflow transition.
pub async fn update_status(pool: &PgPool, record: &CredentialRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE micro_credentials SET status = $1, is_active = $2, published_at = $3,
         updated_at = $4 WHERE id = $5",
    )
    .bind(record.status.as_str())
    .bind(record.is_active)
    .bind(record.published_at)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a credential. Outcomes and prerequisites cascade.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM micro_credentials WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn insert_children(
    conn: &mut PgConnection,
    record: &CredentialRecord,
) -> Result<(), sqlx::Error> {
    for outcome in &record.learning_outcomes {
        sqlx::query(
            "INSERT INTO learning_outcomes (id, micro_credential_id, description, bloom_level,
             order_index) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(outcome.id)
        .bind(record.id)
        .bind(&outcome.description)
        .bind(&outcome.bloom_level)
        .bind(outcome.order_index)
        .execute(&mut *conn)
        .await?;
    }

    for prerequisite in &record.prerequisites {
        sqlx::query(
            "INSERT INTO prerequisites (id, micro_credential_id, description, is_mandatory,
             order_index) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(prerequisite.id)
        .bind(record.id)
        .bind(&prerequisite.description)
        .bind(prerequisite.is_mandatory)
        .bind(prerequisite.order_index)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Load all credentials, with their children in `order_index` order.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CredentialRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, title, description, program_code, institution_id, credential_type,
         delivery_mode, level, credit_value, credit_type, duration_hours, program_url, status,
         effective_date, expiry_date, is_active, published_at, created_at, updated_at
         FROM micro_credentials ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let outcome_rows = sqlx::query_as::<_, OutcomeRow>(
        "SELECT id, micro_credential_id, description, bloom_level, order_index
         FROM learning_outcomes ORDER BY micro_credential_id, order_index",
    )
    .fetch_all(pool)
    .await?;

    let prerequisite_rows = sqlx::query_as::<_, PrerequisiteRow>(
        "SELECT id, micro_credential_id, description, is_mandatory, order_index
         FROM prerequisites ORDER BY micro_credential_id, order_index",
    )
    .fetch_all(pool)
    .await?;

    let mut outcomes: HashMap<Uuid, Vec<LearningOutcome>> = HashMap::new();
    for row in outcome_rows {
        outcomes
            .entry(row.micro_credential_id)
            .or_default()
            .push(LearningOutcome {
                id: row.id,
                description: row.description,
                bloom_level: row.bloom_level,
                order_index: row.order_index,
            });
    }

    let mut prerequisites: HashMap<Uuid, Vec<Prerequisite>> = HashMap::new();
    for row in prerequisite_rows {
        prerequisites
            .entry(row.micro_credential_id)
            .or_default()
            .push(Prerequisite {
                id: row.id,
                description: row.description,
                is_mandatory: row.is_mandatory,
                order_index: row.order_index,
            });
    }

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            row.into_record(
                outcomes.remove(&id).unwrap_or_default(),
                prerequisites.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    program_code: String,
    institution_id: Uuid,
    credential_type: String,
    delivery_mode: String,
    level: String,
    credit_value: Option<f64>,
    credit_type: Option<String>,
    duration_hours: Option<i32>,
    program_url: Option<String>,
    status: String,
    effective_date: Option<DateTime<Utc>>,
    expiry_date: Option<DateTime<Utc>>,
    is_active: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    id: Uuid,
    micro_credential_id: Uuid,
    description: String,
    bloom_level: Option<String>,
    order_index: i32,
}

#[derive(sqlx::FromRow)]
struct PrerequisiteRow {
    id: Uuid,
    micro_credential_id: Uuid,
    description: String,
    is_mandatory: bool,
    order_index: i32,
}

impl CredentialRow {
    fn into_record(
        self,
        learning_outcomes: Vec<LearningOutcome>,
        prerequisites: Vec<Prerequisite>,
    ) -> Option<CredentialRecord> {
        let id = self.id;
        Some(CredentialRecord {
            id,
            title: self.title,
            description: self.description,
            program_code: self.program_code,
            institution_id: self.institution_id,
            credential_type: parse_column(TABLE, "credential_type", id, &self.credential_type)?,
            delivery_mode: parse_column(TABLE, "delivery_mode", id, &self.delivery_mode)?,
            level: parse_column(TABLE, "level", id, &self.level)?,
            credit_value: self.credit_value,
            credit_type: parse_optional_column(TABLE, "credit_type", id, self.credit_type.as_deref())
                .ok()?,
            duration_hours: self.duration_hours,
            program_url: self.program_url,
            status: parse_column(TABLE, "status", id, &self.status)?,
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            is_active: self.is_active,
            published_at: self.published_at,
            learning_outcomes,
            prerequisites,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcred_core::{CredentialLevel, DeliveryMode};
    use mcred_state::CredentialStatus;

    fn row() -> CredentialRow {
        let now = Utc::now();
        CredentialRow {
            id: Uuid::new_v4(),
            title: "Applied AI".into(),
            description: None,
            program_code: "AI-200".into(),
            institution_id: Uuid::new_v4(),
            credential_type: "MICRO_MASTERS".into(),
            delivery_mode: "SELF_PACED".into(),
            level: "POSTGRADUATE".into(),
            credit_value: Some(30.0),
            credit_type: None,
            duration_hours: Some(300),
            program_url: None,
            status: "PUBLISHED".into(),
            effective_date: None,
            expiry_date: None,
            is_active: true,
            published_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_maps_to_record_with_children() {
        let outcome = LearningOutcome {
            id: Uuid::new_v4(),
            description: "Train a model".into(),
            bloom_level: None,
            order_index: 0,
        };
        let record = row().into_record(vec![outcome.clone()], Vec::new()).unwrap();
        assert_eq!(record.status, CredentialStatus::Published);
        assert_eq!(record.delivery_mode, DeliveryMode::SelfPaced);
        assert_eq!(record.level, CredentialLevel::Postgraduate);
        assert_eq!(record.learning_outcomes, vec![outcome]);
        assert!(record.prerequisites.is_empty());
    }

    #[test]
    fn unknown_level_skips_row() {
        let mut bad = row();
        bad.level = "GRANDMASTER".into();
        assert!(bad.into_record(Vec::new(), Vec::new()).is_none());
    }
}
