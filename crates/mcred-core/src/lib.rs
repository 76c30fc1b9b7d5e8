//! # mcred-core: Foundational Types for the Micro-Credential Registry
//!
//! Leaf crate of the workspace. Defines the closed vocabularies used by
//! every payload (credential types, delivery modes, recognition types, ...),
//! the field-level validation primitives that collect every violation of a
//! payload, and the list-query machinery shared by all list endpoints:
//! an explicit `(field, predicate)` [`Filter`] and deterministic
//! [`paginate`]-ing with totals computed under the same filter.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mcred-*` crates.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Enumerations serialize as their SCREAMING_SNAKE wire literal.

pub mod error;
pub mod filter;
pub mod pagination;
pub mod validate;
pub mod vocabulary;

pub use error::{FieldError, UnknownVariant, ValidationErrors};
pub use filter::{contains_ignore_case, Filter};
pub use pagination::{paginate, Page, PageMeta, PageRequest, SortKey, SortOrder, Sortable};
pub use validate::FieldChecks;
pub use vocabulary::{
    CredentialLevel, CredentialType, CreditType, DeliveryMode, InstitutionType, PathwayType,
    RecognitionType, TranscriptMethod,
};
