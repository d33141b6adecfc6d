use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;

use super::{Filter, Query, RestBackend};
use crate::error::{Error, Result};
use crate::mapping::iso_timestamp;
use crate::rows::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

/// One recorded request. `rows` is the number of rows sent or matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: Operation,
    pub table: Table,
    pub filters: Vec<Filter>,
    pub rows: usize,
}

struct FailureRule {
    operation: Operation,
    table: Table,
    filter: Option<Filter>,
    message: String,
}

#[derive(Default)]
struct State {
    tables: HashMap<Table, Vec<Value>>,
    calls: Vec<Call>,
    failures: Vec<FailureRule>,
    next_id: u64,
}

/// In-memory backend for tests and offline runs.
///
/// Behaves like the hosted tables for the operations the service uses and
/// records every call so tests can assert on request counts.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| column_text(row, &f.column).as_deref() == Some(f.value.as_str()))
}

fn compare(a: &Value, b: &Value, column: &str) -> std::cmp::Ordering {
    match (a.get(column), b.get(column)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        _ => column_text(a, column).cmp(&column_text(b, column)),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Backend("memory backend lock poisoned".to_string()))
    }

    /// Make every `operation` on `table` fail, optionally only for matching filters.
    pub fn fail_on(&self, operation: Operation, table: Table, filter: Option<Filter>, message: &str) {
        if let Ok(mut state) = self.lock() {
            state.failures.push(FailureRule {
                operation,
                table,
                filter,
                message: message.to_string(),
            });
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.lock() {
            state.failures.clear();
        }
    }

    /// Seed rows directly, bypassing call recording.
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        if let Ok(mut state) = self.lock() {
            state.tables.entry(table).or_default().extend(rows);
        }
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock()
            .map(|state| state.tables.get(&table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().map(|state| state.calls.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, operation: Operation, table: Table) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation && c.table == table)
            .collect()
    }

    fn record(&self, operation: Operation, table: Table, filters: &[Filter], rows: usize) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock()?;
        state.calls.push(Call {
            operation,
            table,
            filters: filters.to_vec(),
            rows,
        });

        let failure = state.failures.iter().find(|rule| {
            rule.operation == operation
                && rule.table == table
                && rule.filter.as_ref().map_or(true, |f| filters.contains(f))
        });
        if let Some(rule) = failure {
            return Err(Error::Backend(rule.message.clone()));
        }
        Ok(state)
    }
}

impl RestBackend for MemoryBackend {
    fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        let state = self.record(Operation::Select, table, &query.filters, 0)?;
        let mut rows: Vec<Value> = state
            .tables
            .get(&table)
            .map(|rows| rows.iter().filter(|r| matches(r, &query.filters)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, ascending)) = &query.order {
            rows.sort_by(|a, b| compare(a, b, column));
            if !ascending {
                rows.reverse();
            }
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn insert(&self, table: Table, rows: Vec<Value>) -> Result<()> {
        let mut state = self.record(Operation::Insert, table, &[], rows.len())?;
        let now = iso_timestamp(Utc::now());

        let mut prepared = Vec::with_capacity(rows.len());
        for mut row in rows {
            let Some(object) = row.as_object_mut() else {
                return Err(Error::Backend(format!("{} insert expects objects", table)));
            };
            if !object.contains_key("id") {
                state.next_id += 1;
                object.insert("id".to_string(), Value::String(format!("row-{}", state.next_id)));
            }
            object.entry("created_at").or_insert_with(|| Value::String(now.clone()));
            object.entry("updated_at").or_insert_with(|| Value::String(now.clone()));
            prepared.push(row);
        }

        let existing = state.tables.entry(table).or_default();
        for row in &prepared {
            if let Some(id) = column_text(row, "id") {
                if existing.iter().any(|r| column_text(r, "id").as_deref() == Some(id.as_str())) {
                    return Err(Error::Backend(format!(
                        "duplicate key value violates unique constraint \"{}_pkey\"",
                        table
                    )));
                }
            }
        }
        existing.extend(prepared);
        Ok(())
    }

    fn update(&self, table: Table, filter: &Filter, patch: Value) -> Result<()> {
        let filters = std::slice::from_ref(filter);
        let mut state = self.record(Operation::Update, table, filters, 1)?;
        let Some(fields) = patch.as_object() else {
            return Err(Error::Backend(format!("{} update expects an object", table)));
        };

        if let Some(rows) = state.tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|r| matches(r, filters)) {
                if let Some(object) = row.as_object_mut() {
                    for (key, value) in fields {
                        object.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    fn delete(&self, table: Table, filter: &Filter) -> Result<()> {
        let filters = std::slice::from_ref(filter);
        let mut state = self.record(Operation::Delete, table, filters, 0)?;
        if let Some(rows) = state.tables.get_mut(&table) {
            rows.retain(|r| !matches(r, filters));
        }
        Ok(())
    }
}
