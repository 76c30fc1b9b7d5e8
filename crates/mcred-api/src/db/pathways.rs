//! Pathway persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `pathways` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_column;
use crate::state::PathwayRecord;

const TABLE: &str = "pathways";

pub async fn insert(pool: &PgPool, record: &PathwayRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO pathways (id, name, description, source_institution_id,
         target_institution_id, micro_credential_id, pathway_type, status, credits_transferred,
         requirements, approved_at, effective_date, expiry_date, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.source_institution_id)
    .bind(record.target_institution_id)
    .bind(record.micro_credential_id)
    .bind(record.pathway_type.as_str())
    .bind(record.status.as_str())
    .bind(record.credits_transferred)
    .bind(&record.requirements)
    .bind(record.approved_at)
    .bind(record.effective_date)
    .bind(record.expiry_date)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite the editable columns. Status is left to [`update_status`].
pub async fn update(pool: &PgPool, record: &PathwayRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pathways SET name = $1, description = $2, source_institution_id = $3,
         target_institution_id = $4, micro_credential_id = $5, pathway_type = $6,
         credits_transferred = $7, requirements = $8, effective_date = $9, expiry_date = $10,
         updated_at = $11
         WHERE id = $12",
    )
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.source_institution_id)
    .bind(record.target_institution_id)
    .bind(record.micro_credential_id)
    .bind(record.pathway_type.as_str())
    .bind(record.credits_transferred)
    .bind(&record.requirements)
    .bind(record.effective_date)
    .bind(record.expiry_date)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Persist a workflow transition.
pub async fn update_status(pool: &PgPool, record: &PathwayRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE pathways SET status = $1, approved_at = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(record.status.as_str())
    .bind(record.approved_at)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pathways WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all pathways into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<PathwayRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PathwayRow>(
        "SELECT id, name, description, source_institution_id, target_institution_id,
         micro_credential_id, pathway_type, status, credits_transferred, requirements,
         approved_at, effective_date, expiry_date, created_at, updated_at
         FROM pathways ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(PathwayRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct PathwayRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    source_institution_id: Uuid,
    target_institution_id: Uuid,
    micro_credential_id: Uuid,
    pathway_type: String,
    status: String,
    credits_transferred: Option<f64>,
    requirements: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    effective_date: Option<DateTime<Utc>>,
    expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PathwayRow {
    fn into_record(self) -> Option<PathwayRecord> {
        let id = self.id;
        Some(PathwayRecord {
            id,
            name: self.name,
            description: self.description,
            source_institution_id: self.source_institution_id,
            target_institution_id: self.target_institution_id,
            micro_credential_id: self.micro_credential_id,
            pathway_type: parse_column(TABLE, "pathway_type", id, &self.pathway_type)?,
            status: parse_column(TABLE, "status", id, &self.status)?,
            credits_transferred: self.credits_transferred,
            requirements: self.requirements,
            approved_at: self.approved_at,
            effective_date: self.effective_date,
            expiry_date: self.expiry_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
