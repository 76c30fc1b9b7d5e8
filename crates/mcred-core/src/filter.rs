//! # Record Filters
//!
//! A [`Filter`] is an explicit list of `(field, predicate)` clauses,
//! built conditionally from optional query parameters: a clause is only
//! added when its parameter is present, and a record matches when every
//! clause holds. An empty filter matches everything.

use std::fmt;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

struct Clause<T> {
    field: &'static str,
    predicate: Predicate<T>,
}

/// Conjunction of per-field predicates over `T`.
pub struct Filter<T> {
    clauses: Vec<Clause<T>>,
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("fields", &self.fields())
            .finish()
    }
}

impl<T> Filter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `predicate(record, value)` as a clause when `value` is present.
    pub fn with<V>(
        mut self,
        field: &'static str,
        value: Option<V>,
        predicate: impl Fn(&T, &V) -> bool + Send + Sync + 'static,
    ) -> Self
    where
        T: 'static,
        V: Send + Sync + 'static,
    {
        if let Some(v) = value {
            self.clauses.push(Clause {
                field,
                predicate: Box::new(move |record: &T| predicate(record, &v)),
            });
        }
        self
    }

    /// Equality clause on a projected field.
    pub fn eq<V>(
        self,
        field: &'static str,
        value: Option<V>,
        project: impl Fn(&T) -> V + Send + Sync + 'static,
    ) -> Self
    where
        T: 'static,
        V: PartialEq + Send + Sync + 'static,
    {
        self.with(field, value, move |record, wanted| project(record) == *wanted)
    }

    /// Whether `record` satisfies every clause.
    pub fn matches(&self, record: &T) -> bool {
        self.clauses.iter().all(|c| (c.predicate)(record))
    }

    /// Names of the fields carrying a clause, in insertion order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.clauses.iter().map(|c| c.field).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Case-insensitive substring test. `needle` must already be lowercase.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        kind: &'static str,
        title: &'static str,
        active: bool,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { kind: "A", title: "Data Science Basics", active: true },
            Row { kind: "B", title: "Applied Data Ethics", active: false },
            Row { kind: "A", title: "Welding", active: false },
        ]
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f: Filter<Row> = Filter::new();
        assert!(f.is_empty());
        assert_eq!(rows().iter().filter(|r| f.matches(r)).count(), 3);
    }

    #[test]
    fn absent_values_add_no_clause() {
        let f = Filter::new()
            .eq("kind", None::<&'static str>, |r: &Row| r.kind)
            .eq("active", None::<bool>, |r: &Row| r.active);
        assert!(f.is_empty());
    }

    #[test]
    fn clauses_are_conjunctive() {
        let f = Filter::new()
            .eq("kind", Some("A"), |r: &Row| r.kind)
            .eq("active", Some(false), |r: &Row| r.active);
        assert_eq!(f.fields(), vec!["kind", "active"]);
        let hits: Vec<_> = rows().into_iter().filter(|r| f.matches(r)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Welding");
    }

    #[test]
    fn search_is_case_insensitive() {
        let f = Filter::new().with(
            "search",
            Some("DATA".to_lowercase()),
            |r: &Row, needle: &String| contains_ignore_case(r.title, needle),
        );
        assert_eq!(rows().iter().filter(|r| f.matches(r)).count(), 2);
    }
}
