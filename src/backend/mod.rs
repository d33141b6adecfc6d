//! Hosted table access
//!
//! [`RestBackend`] is the seam between the playlist service and storage:
//! [`RestClient`] talks to the hosted REST API, [`MemoryBackend`] keeps
//! rows in process for tests.

mod memory;
mod rest;

pub use memory::{Call, MemoryBackend, Operation};
pub use rest::RestClient;

use serde_json::Value;

use crate::error::Result;
use crate::rows::Table;

/// Equality filter on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    /// Column and ascending flag
    pub order: Option<(String, bool)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), true));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Row-level operations on the two playlist tables.
///
/// Rows cross this boundary as JSON objects; typing happens in the service.
pub trait RestBackend: Send + Sync {
    fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>>;

    /// Insert one or more rows in a single request.
    fn insert(&self, table: Table, rows: Vec<Value>) -> Result<()>;

    /// Apply `patch` to every row matching `filter`.
    fn update(&self, table: Table, filter: &Filter, patch: Value) -> Result<()>;

    fn delete(&self, table: Table, filter: &Filter) -> Result<()>;
}
