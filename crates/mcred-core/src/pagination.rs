//! # Pagination
//!
//! List endpoints accept `page`, `limit`, `sortBy` and `sortOrder` as raw
//! query strings. [`PageRequest::parse`] coerces them into typed values,
//! recording a field error for each bad parameter, and [`paginate`] applies
//! a [`Filter`], sorts, and slices one page.
//!
//! ## Invariants
//!
//! - `total` is the count of records matching the filter, not the page size.
//! - `totalPages == ceil(total / limit)` (0 when nothing matches).
//! - Ordering is total: ties on the sort field are broken by record id,
//!   so walking pages `1..=totalPages` visits every matching record exactly once.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::filter::Filter;
use crate::validate::FieldChecks;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("must be 'asc' or 'desc', got '{other}'")),
        }
    }
}

/// A validated page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub sort_by: &'static str,
    pub sort_order: SortOrder,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;
    pub const DEFAULT_SORT: &'static str = "createdAt";

    /// Defaults for an entity whose sortable fields are `sort_fields`.
    pub fn defaults(sort_fields: &'static [&'static str]) -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            sort_by: default_sort(sort_fields),
            sort_order: SortOrder::Desc,
        }
    }

    /// Coerce raw query values, recording every bad parameter in `checks`.
    /// Invalid parameters fall back to their defaults so that parsing can
    /// continue; callers must consult `checks` before using the result.
    pub fn parse(
        checks: &mut FieldChecks,
        page: Option<&str>,
        limit: Option<&str>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        sort_fields: &'static [&'static str],
    ) -> Self {
        let mut request = Self::defaults(sort_fields);

        if let Some(raw) = non_blank(page) {
            match raw.parse::<u32>() {
                Ok(p) if p >= 1 => request.page = p,
                _ => {
                    checks.fail("page", "must be a positive integer");
                }
            }
        }

        if let Some(raw) = non_blank(limit) {
            match raw.parse::<u32>() {
                Ok(l) if (1..=Self::MAX_LIMIT).contains(&l) => request.limit = l,
                _ => {
                    checks.fail(
                        "limit",
                        format!("must be an integer between 1 and {}", Self::MAX_LIMIT),
                    );
                }
            }
        }

        if let Some(raw) = non_blank(sort_by) {
            match sort_fields.iter().find(|f| **f == raw) {
                Some(field) => request.sort_by = *field,
                None => {
                    checks.fail(
                        "sortBy",
                        format!("must be one of: {}", sort_fields.join(", ")),
                    );
                }
            }
        }

        if let Some(order) = checks.parse_param::<SortOrder>("sortOrder", sort_order) {
            request.sort_order = order;
        }

        request
    }

    /// Number of matching records preceding this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn default_sort(sort_fields: &'static [&'static str]) -> &'static str {
    sort_fields
        .iter()
        .find(|f| **f == PageRequest::DEFAULT_SORT)
        .or_else(|| sort_fields.first())
        .copied()
        .unwrap_or(PageRequest::DEFAULT_SORT)
}

/// Comparable projection of one record field.
///
/// Missing values sort before present ones. Text compares case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Int(i64),
    Number(f64),
    Text(String),
    Time(DateTime<Utc>),
}

impl SortKey {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_lowercase())
    }

    pub fn opt_number(v: Option<f64>) -> Self {
        v.map_or(Self::Missing, Self::Number)
    }

    pub fn opt_time(v: Option<DateTime<Utc>>) -> Self {
        v.map_or(Self::Missing, Self::Time)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Int(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
            Self::Time(_) => 4,
        }
    }

    /// Total order over keys.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Records that can be listed through [`paginate`].
pub trait Sortable {
    /// camelCase names accepted by `sortBy`.
    const SORT_FIELDS: &'static [&'static str];

    /// Key for one of [`Self::SORT_FIELDS`]. Unknown names yield [`SortKey::Missing`].
    fn sort_key(&self, field: &str) -> SortKey;

    /// Tie-breaker.
    fn sort_id(&self) -> Uuid;
}

/// Pagination metadata returned alongside every list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit_wide = u64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit_wide),
        }
    }
}

/// One page of records plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    /// Transform the rows while keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Filter, sort and slice `items` into the requested page.
pub fn paginate<T: Sortable>(
    items: impl IntoIterator<Item = T>,
    filter: &Filter<T>,
    request: &PageRequest,
) -> Page<T> {
    let mut matched: Vec<T> = items.into_iter().filter(|r| filter.matches(r)).collect();
    let total = matched.len() as u64;

    let field = request.sort_by;
    matched.sort_by(|a, b| {
        let by_field = a.sort_key(field).compare(&b.sort_key(field));
        let by_field = match request.sort_order {
            SortOrder::Asc => by_field,
            SortOrder::Desc => by_field.reverse(),
        };
        by_field.then_with(|| a.sort_id().cmp(&b.sort_id()))
    });

    let data = matched
        .into_iter()
        .skip(request.offset())
        .take(request.limit as usize)
        .collect();

    Page {
        data,
        pagination: PageMeta::new(request.page, request.limit, total),
    }
}
