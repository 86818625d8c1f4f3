//! Record Store - keyed access to domain records
//!
//! The engine never talks to booking backends directly; tools go
//! through this interface. "No results" from a search is an empty list,
//! never an error. Mutations against missing records surface as
//! [`RecordError::NotFound`], which tools hand back to the model as an
//! error tool-result rather than failing the turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory;

pub use memory::MemoryRecordStore;

/// Travel domains the store is partitioned by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Flight,
    Hotel,
    CarRental,
    Excursion,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Domain::Flight => "flight",
            Domain::Hotel => "hotel",
            Domain::CarRental => "car-rental",
            Domain::Excursion => "excursion",
        };
        write!(f, "{name}")
    }
}

/// A domain record - stable id plus free-form fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Field lookup as a string, if present
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Comparison operator for one filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact match
    Eq,
    /// Case-insensitive substring match on string fields
    Contains,
}

/// Conjunctive filter over record fields
///
/// An empty filter matches every record in the domain.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, FilterOp, serde_json::Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.clauses.push((field.to_string(), FilterOp::Eq, value.into()));
        self
    }

    pub fn contains(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.clauses.push((field.to_string(), FilterOp::Contains, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check whether a record satisfies every clause
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|(field, op, expected)| {
            let actual = if field == "id" {
                Some(serde_json::Value::String(record.id.clone()))
            } else {
                record.fields.get(field).cloned()
            };

            let Some(actual) = actual else {
                return false;
            };

            match op {
                FilterOp::Eq => &actual == expected,
                FilterOp::Contains => match (actual.as_str(), expected.as_str()) {
                    (Some(a), Some(e)) => a.to_lowercase().contains(&e.to_lowercase()),
                    _ => false,
                },
            }
        })
    }
}

/// Errors raised by record store operations
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("No {domain} record found with id {id}")]
    NotFound { domain: Domain, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Keyed read/write access to domain records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Search a domain; empty result is Ok, not an error
    async fn find(&self, domain: Domain, filter: &Filter) -> Result<Vec<Record>, RecordError>;

    /// Create a record; the store assigns the id if `payload` has none
    async fn create(&self, domain: Domain, payload: Record) -> Result<Record, RecordError>;

    /// Merge `payload` fields into an existing record
    async fn update(&self, domain: Domain, id: &str, payload: serde_json::Value) -> Result<Record, RecordError>;

    /// Cancel (mark and return) an existing record
    async fn cancel(&self, domain: Domain, id: &str) -> Result<Record, RecordError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_eq_matches() {
        let record = Record::new("f-1").with("departure_airport", "ZRH").with("seats", 3);

        assert!(Filter::new().eq("departure_airport", "ZRH").matches(&record));
        assert!(Filter::new().eq("seats", 3).matches(&record));
        assert!(!Filter::new().eq("departure_airport", "BSL").matches(&record));
    }

    #[test]
    fn test_filter_contains_is_case_insensitive() {
        let record = Record::new("h-1").with("location", "Zurich City Center");

        assert!(Filter::new().contains("location", "zurich").matches(&record));
        assert!(!Filter::new().contains("location", "basel").matches(&record));
    }

    #[test]
    fn test_filter_missing_field_does_not_match() {
        let record = Record::new("x");
        assert!(!Filter::new().eq("anything", 1).matches(&record));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let record = Record::new("x");
        assert!(Filter::new().matches(&record));
    }

    #[test]
    fn test_filter_on_id() {
        let record = Record::new("f-7");
        assert!(Filter::new().eq("id", "f-7").matches(&record));
    }
}
