//! Recognition persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `recognitions` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{parse_column, parse_optional_column};
use crate::state::RecognitionRecord;

const TABLE: &str = "recognitions";

pub async fn insert(pool: &PgPool, record: &RecognitionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO recognitions (id, micro_credential_id, recognizing_institution_id,
         recognition_type, transcript_method, credits_awarded, credit_type, equivalent_course,
         notes, effective_date, expiry_date, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(record.id)
    .bind(record.micro_credential_id)
    .bind(record.recognizing_institution_id)
    .bind(record.recognition_type.as_str())
    .bind(record.transcript_method.as_str())
    .bind(record.credits_awarded)
    .bind(record.credit_type.map(|t| t.as_str()))
    .bind(&record.equivalent_course)
    .bind(&record.notes)
    .bind(record.effective_date)
    .bind(record.expiry_date)
    .bind(record.is_active)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite every mutable column, including `is_active`.
pub async fn update(pool: &PgPool, record: &RecognitionRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE recognitions SET micro_credential_id = $1, recognizing_institution_id = $2,
         recognition_type = $3, transcript_method = $4, credits_awarded = $5, credit_type = $6,
         equivalent_course = $7, notes = $8, effective_date = $9, expiry_date = $10,
         is_active = $11, updated_at = $12
         WHERE id = $13",
    )
    .bind(record.micro_credential_id)
    .bind(record.recognizing_institution_id)
    .bind(record.recognition_type.as_str())
    .bind(record.transcript_method.as_str())
    .bind(record.credits_awarded)
    .bind(record.credit_type.map(|t| t.as_str()))
    .bind(&record.equivalent_course)
    .bind(&record.notes)
    .bind(record.effective_date)
    .bind(record.expiry_date)
    .bind(record.is_active)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM recognitions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all recognitions into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<RecognitionRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RecognitionRow>(
        "SELECT id, micro_credential_id, recognizing_institution_id, recognition_type,
         transcript_method, credits_awarded, credit_type, equivalent_course, notes,
         effective_date, expiry_date, is_active, created_at, updated_at
         FROM recognitions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(RecognitionRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct RecognitionRow {
    id: Uuid,
    micro_credential_id: Uuid,
    recognizing_institution_id: Uuid,
    recognition_type: String,
    transcript_method: String,
    credits_awarded: Option<f64>,
    credit_type: Option<String>,
    equivalent_course: Option<String>,
    notes: Option<String>,
    effective_date: Option<DateTime<Utc>>,
    expiry_date: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecognitionRow {
    fn into_record(self) -> Option<RecognitionRecord> {
        let id = self.id;
        Some(RecognitionRecord {
            id,
            micro_credential_id: self.micro_credential_id,
            recognizing_institution_id: self.recognizing_institution_id,
            recognition_type: parse_column(TABLE, "recognition_type", id, &self.recognition_type)?,
            transcript_method: parse_column(
                TABLE,
                "transcript_method",
                id,
                &self.transcript_method,
            )?,
            credits_awarded: self.credits_awarded,
            credit_type: parse_optional_column(TABLE, "credit_type", id, self.credit_type.as_deref())
                .ok()?,
            equivalent_course: self.equivalent_course,
            notes: self.notes,
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
