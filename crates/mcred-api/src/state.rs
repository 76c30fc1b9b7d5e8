//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! Every entity type lives in a thread-safe in-memory [`Store`]. When a
//! Postgres pool is configured, handlers write through to the database
//! after the in-memory commit, and [`AppState::hydrate_from_db`] reloads
//! the stores on startup. Without a pool the service is in-memory only,
//! which is also how tests construct it.
//!
//! Read-validate-write sequences (status transitions, code uniqueness)
//! run inside a single write-lock section via [`Store::try_update`] or
//! [`Store::write_with`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mcred_core::{
    CredentialLevel, CredentialType, CreditType, DeliveryMode, InstitutionType, PathwayType,
    RecognitionType, SortKey, Sortable, TranscriptMethod,
};
use mcred_state::{CredentialStatus, PathwayStatus};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because we never hold the lock across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// Snapshot of all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Snapshot of the records matching `pred`.
    pub fn list_where(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    pub fn count_where(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.data.read().values().filter(|r| pred(r)).count()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure may inspect the current record, check preconditions,
    /// mutate it, and return `Ok(R)` or `Err(E)`; it runs under one write
    /// lock. The closure must leave the record untouched when it fails.
    ///
    /// Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Run `f` with exclusive access to the whole map, for checks that span
    /// records (uniqueness) followed by a write.
    pub fn write_with<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Records ------------------------------------------------------------------

/// An education or training provider. Referenced by credentials,
/// recognitions, and pathways; never embedded in them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionRecord {
    pub id: Uuid,
    pub name: String,
    /// Unique, upper-case short code.
    pub code: String,
    pub institution_type: InstitutionType,
    pub country: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stated learning outcome of a micro-credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearningOutcome {
    pub id: Uuid,
    pub description: String,
    pub bloom_level: Option<String>,
    /// 0-based position in submission order.
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prerequisite {
    pub id: Uuid,
    pub description: String,
    pub is_mandatory: bool,
    pub order_index: i32,
}

/// A micro-credential program offered by an institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Unique, upper-case program code.
    pub program_code: String,
    pub institution_id: Uuid,
    pub credential_type: CredentialType,
    pub delivery_mode: DeliveryMode,
    pub level: CredentialLevel,
    pub credit_value: Option<f64>,
    pub credit_type: Option<CreditType>,
    pub duration_hours: Option<i32>,
    pub program_url: Option<String>,
    pub status: CredentialStatus,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub learning_outcomes: Vec<LearningOutcome>,
    pub prerequisites: Vec<Prerequisite>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One institution's recognition of another's micro-credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionRecord {
    pub id: Uuid,
    pub micro_credential_id: Uuid,
    pub recognizing_institution_id: Uuid,
    pub recognition_type: RecognitionType,
    pub transcript_method: TranscriptMethod,
    pub credits_awarded: Option<f64>,
    pub credit_type: Option<CreditType>,
    pub equivalent_course: Option<String>,
    pub notes: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A transfer route carrying a micro-credential from a source to a
/// target institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathwayRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub source_institution_id: Uuid,
    pub target_institution_id: Uuid,
    pub micro_credential_id: Uuid,
    pub pathway_type: PathwayType,
    pub status: PathwayStatus,
    pub credits_transferred: Option<f64>,
    pub requirements: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sortable for InstitutionRecord {
    const SORT_FIELDS: &'static [&'static str] = &["createdAt", "updatedAt", "name", "code"];

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "createdAt" => SortKey::Time(self.created_at),
            "updatedAt" => SortKey::Time(self.updated_at),
            "name" => SortKey::text(&self.name),
            "code" => SortKey::text(&self.code),
            _ => SortKey::Missing,
        }
    }

    fn sort_id(&self) -> Uuid {
        self.id
    }
}

impl Sortable for CredentialRecord {
    const SORT_FIELDS: &'static [&'static str] = &[
        "createdAt",
        "updatedAt",
        "title",
        "programCode",
        "creditValue",
        "durationHours",
        "status",
        "publishedAt",
        "effectiveDate",
    ];

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "createdAt" => SortKey::Time(self.created_at),
            "updatedAt" => SortKey::Time(self.updated_at),
            "title" => SortKey::text(&self.title),
            "programCode" => SortKey::text(&self.program_code),
            "creditValue" => SortKey::opt_number(self.credit_value),
            "durationHours" => self
                .duration_hours
                .map_or(SortKey::Missing, |h| SortKey::Int(i64::from(h))),
            "status" => SortKey::text(self.status.as_str()),
            "publishedAt" => SortKey::opt_time(self.published_at),
            "effectiveDate" => SortKey::opt_time(self.effective_date),
            _ => SortKey::Missing,
        }
    }

    fn sort_id(&self) -> Uuid {
        self.id
    }
}

impl Sortable for RecognitionRecord {
    const SORT_FIELDS: &'static [&'static str] = &[
        "createdAt",
        "updatedAt",
        "creditsAwarded",
        "recognitionType",
        "effectiveDate",
    ];

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "createdAt" => SortKey::Time(self.created_at),
            "updatedAt" => SortKey::Time(self.updated_at),
            "creditsAwarded" => SortKey::opt_number(self.credits_awarded),
            "recognitionType" => SortKey::text(self.recognition_type.as_str()),
            "effectiveDate" => SortKey::opt_time(self.effective_date),
            _ => SortKey::Missing,
        }
    }

    fn sort_id(&self) -> Uuid {
        self.id
    }
}

impl Sortable for PathwayRecord {
    const SORT_FIELDS: &'static [&'static str] = &[
        "createdAt",
        "updatedAt",
        "name",
        "status",
        "creditsTransferred",
        "approvedAt",
    ];

    fn sort_key(&self, field: &str) -> SortKey {
        match field {
            "createdAt" => SortKey::Time(self.created_at),
            "updatedAt" => SortKey::Time(self.updated_at),
            "name" => SortKey::text(&self.name),
            "status" => SortKey::text(self.status.as_str()),
            "creditsTransferred" => SortKey::opt_number(self.credits_transferred),
            "approvedAt" => SortKey::opt_time(self.approved_at),
            _ => SortKey::Missing,
        }
    }

    fn sort_id(&self) -> Uuid {
        self.id
    }
}

// -- Configuration ------------------------------------------------------------

/// Environment variable was present but unusable.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Application configuration.
///
/// Custom `Debug` redacts the auth token and database URL.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared bearer secret. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Postgres connection string. If `None`, the service is in-memory only.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
}

impl AppConfig {
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;

    /// Read `PORT`, `AUTH_TOKEN`, `DATABASE_URL`, `DB_MAX_CONNECTIONS`, and
    /// `LOG_FORMAT` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                expected: "a port number",
                value: v,
            })?,
            None => Self::DEFAULT_PORT,
        };

        let db_max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(v) => match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DB_MAX_CONNECTIONS",
                        expected: "a positive integer",
                        value: v,
                    })
                }
            },
            None => Self::DEFAULT_DB_MAX_CONNECTIONS,
        };

        let log_json = var("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            port,
            auth_token: var("AUTH_TOKEN"),
            database_url: var("DATABASE_URL"),
            db_max_connections,
            log_json,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            auth_token: None,
            database_url: None,
            db_max_connections: Self::DEFAULT_DB_MAX_CONNECTIONS,
            log_json: false,
        }
    }
}

// -- Application State ----------------------------------------------------------

/// Shared application state. Clone-friendly via `Arc` internals in each `Store`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub institutions: Store<InstitutionRecord>,
    pub credentials: Store<CredentialRecord>,
    pub recognitions: Store<RecognitionRecord>,
    pub pathways: Store<PathwayRecord>,

    /// PostgreSQL connection pool for write-through persistence.
    /// `None` means in-memory-only mode.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            institutions: Store::new(),
            credentials: Store::new(),
            recognitions: Store::new(),
            pathways: Store::new(),
            db_pool,
            config,
        }
    }

    /// Load every persisted record into the in-memory stores.
    ///
    /// Called once on startup when a database pool is available.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let institutions = crate::db::institutions::load_all(pool).await?;
        let institution_count = institutions.len();
        for record in institutions {
            self.institutions.insert(record.id, record);
        }

        let credentials = crate::db::credentials::load_all(pool).await?;
        let credential_count = credentials.len();
        for record in credentials {
            self.credentials.insert(record.id, record);
        }

        let recognitions = crate::db::recognitions::load_all(pool).await?;
        let recognition_count = recognitions.len();
        for record in recognitions {
            self.recognitions.insert(record.id, record);
        }

        let pathways = crate::db::pathways::load_all(pool).await?;
        let pathway_count = pathways.len();
        for record in pathways {
            self.pathways.insert(record.id, record);
        }

        tracing::info!(
            institutions = institution_count,
            credentials = credential_count,
            recognitions = recognition_count,
            pathways = pathway_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_institution(id: Uuid, code: &str) -> InstitutionRecord {
        let now = Utc::now();
        InstitutionRecord {
            id,
            name: format!("Institution {code}"),
            code: code.to_string(),
            institution_type: InstitutionType::University,
            country: None,
            website: None,
            created_at: now,
            updated_at: now,
        }
    }

    // -- Store tests ----------------------------------------------------------

    #[test]
    fn store_new_creates_empty_store() {
        let store: Store<InstitutionRecord> = Store::new();
        assert!(store.is_empty());
        assert!(store.list().is_empty());
    }

    #[test]
    fn store_insert_and_get_roundtrip() {
        let store = Store::new();
        let id = Uuid::new_v4();
        assert!(store.insert(id, sample_institution(id, "UOA")).is_none());

        let fetched = store.get(&id).unwrap();
        assert_eq!(fetched.code, "UOA");
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_try_update_propagates_closure_error() {
        let store = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, sample_institution(id, "UOA"));

        let result: Option<Result<(), &str>> = store.try_update(&id, |_| Err("refused"));
        assert_eq!(result, Some(Err("refused")));

        let result: Option<Result<String, &str>> = store.try_update(&id, |i| {
            i.name = "Renamed".into();
            Ok(i.name.clone())
        });
        assert_eq!(result, Some(Ok("Renamed".to_string())));
        assert_eq!(store.get(&id).unwrap().name, "Renamed");

        let missing: Option<Result<(), &str>> = store.try_update(&Uuid::new_v4(), |_| Ok(()));
        assert!(missing.is_none());
    }

    #[test]
    fn store_write_with_sees_whole_map() {
        let store = Store::new();
        let a = Uuid::new_v4();
        store.insert(a, sample_institution(a, "AAA"));

        let b = Uuid::new_v4();
        let inserted = store.write_with(|map| {
            if map.values().any(|i| i.code == "AAA") {
                false
            } else {
                map.insert(b, sample_institution(b, "AAA"));
                true
            }
        });
        assert!(!inserted);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_predicates() {
        let store = Store::new();
        for code in ["A1", "A2", "B1"] {
            let id = Uuid::new_v4();
            store.insert(id, sample_institution(id, code));
        }
        assert_eq!(store.count_where(|i| i.code == "B1"), 1);
        assert_eq!(store.count_where(|i| i.code.starts_with('A')), 2);
        assert_eq!(store.list_where(|i| i.code == "A2").len(), 1);
    }

    #[test]
    fn store_remove_deletes_item() {
        let store = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, sample_institution(id, "UOA"));
        assert_eq!(store.remove(&id).unwrap().id, id);
        assert!(store.is_empty());
        assert!(store.remove(&id).is_none());
    }

    #[test]
    fn store_clone_shares_data() {
        let store = Store::new();
        let clone = store.clone();
        let id = Uuid::new_v4();
        store.insert(id, sample_institution(id, "UOA"));
        assert!(clone.contains(&id));
    }

    // -- Sortable --------------------------------------------------------------

    #[test]
    fn every_sort_field_has_a_key() {
        let inst = sample_institution(Uuid::new_v4(), "UOA");
        for field in InstitutionRecord::SORT_FIELDS {
            assert_ne!(inst.sort_key(field), SortKey::Missing, "{field}");
        }
        assert_eq!(inst.sort_key("password"), SortKey::Missing);
    }

    // -- Config ----------------------------------------------------------------

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn config_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert!(config.database_url.is_none());
        assert_eq!(config.db_max_connections, 20);
        assert!(!config.log_json);
    }

    #[test]
    fn config_reads_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/mcred"),
            ("DB_MAX_CONNECTIONS", "5"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.db_max_connections, 5);
        assert!(config.log_json);
    }

    #[test]
    fn config_blank_values_are_unset() {
        let config = AppConfig::from_lookup(lookup(&[("AUTH_TOKEN", "  ")])).unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn config_rejects_bad_numbers() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(AppConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "0")])).is_err());
    }

    #[test]
    fn config_debug_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(&[
            ("AUTH_TOKEN", "super-secret-token"),
            ("DATABASE_URL", "postgres://user:pw@db/mcred"),
        ]))
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(!debug.contains("pw@db"));
        assert!(debug.contains("[REDACTED]"));
    }
}
