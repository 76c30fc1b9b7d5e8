//! # Field Validation
//!
//! [`FieldChecks`] applies one rule per call and records every failure
//! instead of stopping at the first, so request DTOs can describe all of
//! their constraints in a flat sequence of checks:
//!
//! ```ignore
//! let mut checks = FieldChecks::new();
//! checks
//!     .required_text("title", &self.title, 1, 200)
//!     .optional_url("programUrl", self.program_url.as_deref());
//! checks.finish()
//! ```
//!
//! The same accumulator parses list-query strings (`parse_param`), so bad
//! pagination and filter parameters are reported together.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::ValidationErrors;

/// Accumulating field-rule checker.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: ValidationErrors,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an arbitrary failure.
    pub fn fail(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push(field, message);
        self
    }

    /// Non-empty (after trimming) string of `min..=max` characters.
    pub fn required_text(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            self.errors.push(field, "is required");
        } else if len < min {
            self.errors
                .push(field, format!("must be at least {min} characters"));
        } else if len > max {
            self.errors
                .push(field, format!("must be at most {max} characters"));
        }
        self
    }

    /// Like [`required_text`](Self::required_text), but absent values pass.
    pub fn optional_text(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> &mut Self {
        if let Some(v) = value {
            self.required_text(field, v, min, max);
        }
        self
    }

    /// Identifier-style code: ASCII letters, digits, and the given extra
    /// punctuation only, with `min..=max` characters.
    pub fn code(
        &mut self,
        field: &str,
        value: &str,
        min: usize,
        max: usize,
        extra: &[char],
    ) -> &mut Self {
        let trimmed = value.trim();
        let before = self.errors.len();
        self.required_text(field, trimmed, min, max);
        if self.errors.len() == before
            && !trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || extra.contains(&c))
        {
            let allowed: String = extra.iter().collect();
            self.errors.push(
                field,
                format!("may only contain letters, digits and '{allowed}'"),
            );
        }
        self
    }

    pub fn optional_code(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
        extra: &[char],
    ) -> &mut Self {
        if let Some(v) = value {
            self.code(field, v, min, max, extra);
        }
        self
    }

    /// Finite number within `min..=max`.
    pub fn number_range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) -> &mut Self {
        if let Some(v) = value {
            if !v.is_finite() {
                self.errors.push(field, "must be a finite number");
            } else if v < min || v > max {
                self.errors
                    .push(field, format!("must be between {min} and {max}"));
            }
        }
        self
    }

    pub fn integer_range(&mut self, field: &str, value: Option<i32>, min: i32, max: i32) -> &mut Self {
        if let Some(v) = value {
            if v < min || v > max {
                self.errors
                    .push(field, format!("must be between {min} and {max}"));
            }
        }
        self
    }

    /// Absolute `http`/`https` URL with a host.
    pub fn optional_url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(raw) = value {
            match url::Url::parse(raw.trim()) {
                Ok(u) if matches!(u.scheme(), "http" | "https") && u.host().is_some() => {}
                Ok(_) => {
                    self.errors.push(field, "must be an http or https URL");
                }
                Err(e) => {
                    self.errors.push(field, format!("must be a valid URL ({e})"));
                }
            }
        }
        self
    }

    /// When both dates are present, `expiry` must be strictly later.
    pub fn date_order(
        &mut self,
        expiry_field: &str,
        effective: Option<DateTime<Utc>>,
        expiry: Option<DateTime<Utc>>,
    ) -> &mut Self {
        if let (Some(start), Some(end)) = (effective, expiry) {
            if end <= start {
                self.errors
                    .push(expiry_field, "must be later than effectiveDate");
            }
        }
        self
    }

    /// Fold in the violations of a nested payload (list items and the like).
    pub fn nested(&mut self, prefix: &str, errors: ValidationErrors) -> &mut Self {
        self.errors.extend_nested(prefix, errors);
        self
    }

    /// Parse an optional query-string value, recording a failure when it
    /// does not parse. Blank values count as absent.
    pub fn parse_param<T>(&mut self, field: &str, raw: Option<&str>) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                self.errors.push(field, e.to_string());
                None
            }
        }
    }

    /// `true` / `false` (any case).
    pub fn parse_bool_param(&mut self, field: &str, raw: Option<&str>) -> Option<bool> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        match raw.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                self.errors.push(field, "must be 'true' or 'false'");
                None
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        self.errors.into_result()
    }
}
