//! Institution persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `institutions` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::parse_column;
use crate::state::InstitutionRecord;

const TABLE: &str = "institutions";

/// Insert a new institution record.
pub async fn insert(pool: &PgPool, record: &InstitutionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO institutions (id, name, code, institution_type, country, website,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.code)
    .bind(record.institution_type.as_str())
    .bind(&record.country)
    .bind(&record.website)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite every mutable column.
pub async fn update(pool: &PgPool, record: &InstitutionRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE institutions SET name = $1, code = $2, institution_type = $3, country = $4,
         website = $5, updated_at = $6 WHERE id = $7",
    )
    .bind(&record.name)
    .bind(&record.code)
    .bind(record.institution_type.as_str())
    .bind(&record.country)
    .bind(&record.website)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM institutions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all institutions into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<InstitutionRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InstitutionRow>(
        "SELECT id, name, code, institution_type, country, website, created_at, updated_at
         FROM institutions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(InstitutionRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct InstitutionRow {
    id: Uuid,
    name: String,
    code: String,
    institution_type: String,
    country: Option<String>,
    website: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InstitutionRow {
    fn into_record(self) -> Option<InstitutionRecord> {
        let institution_type =
            parse_column(TABLE, "institution_type", self.id, &self.institution_type)?;
        Some(InstitutionRecord {
            id: self.id,
            name: self.name,
            code: self.code,
            institution_type,
            country: self.country,
            website: self.website,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcred_core::InstitutionType;

    fn row(kind: &str) -> InstitutionRow {
        let now = Utc::now();
        InstitutionRow {
            id: Uuid::new_v4(),
            name: "Wintec".into(),
            code: "WINTEC".into(),
            institution_type: kind.into(),
            country: Some("NZ".into()),
            website: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_maps_to_record() {
        let record = row("POLYTECHNIC").into_record().unwrap();
        assert_eq!(record.institution_type, InstitutionType::Polytechnic);
        assert_eq!(record.country.as_deref(), Some("NZ"));
    }

    #[test]
    fn row_with_unknown_type_is_skipped() {
        assert!(row("MONASTERY").into_record().is_none());
    }
}
