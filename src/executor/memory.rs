//! In-process query executor over named collections
//!
//! Evaluates the common subset of query options against records held in
//! memory: equality and `$ne`/`$lt`/`$lte`/`$gt`/`$gte`/`$in`/`$exists`
//! constraints, ordering, skip, limit and field selection. Useful as a
//! stand-in backend for tests and demos.

use crate::error::{QueryCacheError, Result};
use crate::executor::QueryExecutor;
use crate::query::{QueryOptions, Record};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Records returned when a query sets no limit
pub const DEFAULT_LIMIT: u64 = 100;

#[derive(Debug, Default)]
pub struct MemoryQueryExecutor {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    failure: RwLock<Option<String>>,
    find_calls: AtomicUsize,
    elevated_calls: AtomicUsize,
}

impl MemoryQueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, assigning an object id and timestamps if missing
    pub async fn insert(&self, mut record: Record) -> Record {
        let now = Utc::now();
        if record.object_id.is_none() {
            record.object_id = Some(Uuid::new_v4().simple().to_string());
        }
        record.created_at.get_or_insert(now);
        record.updated_at = Some(now);

        self.collections
            .write()
            .await
            .entry(record.class_name.clone())
            .or_default()
            .push(record.clone());

        record
    }

    /// Remove every record of a collection, returning how many were held
    pub async fn clear_collection(&self, collection: &str) -> usize {
        self.collections
            .write()
            .await
            .remove(collection)
            .map_or(0, |records| records.len())
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Make every following `find` fail with `message`, or succeed again with `None`
    pub async fn set_failure(&self, message: Option<String>) {
        *self.failure.write().await = message;
    }

    /// Number of `find` calls received so far
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of `find` calls that asked for elevated access
    pub fn elevated_calls(&self) -> usize {
        self.elevated_calls.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for MemoryQueryExecutor {
    async fn find(
        &self,
        collection: &str,
        options: &QueryOptions,
        use_elevated_access: bool,
    ) -> Result<Vec<Record>> {
        self.find_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if use_elevated_access {
            self.elevated_calls.fetch_add(1, AtomicOrdering::SeqCst);
        }

        if let Some(message) = self.failure.read().await.clone() {
            return Err(QueryCacheError::ExecutionError(message));
        }

        let mut matched = Vec::new();
        if let Some(records) = self.collections.read().await.get(collection) {
            for record in records {
                if matches_constraints(record, options.constraints())? {
                    matched.push(record.clone());
                }
            }
        }

        let order = options.order_keys();
        if !order.is_empty() {
            matched.sort_by(|a, b| compare_by_keys(a, b, &order));
        }

        let skip = options.skip_value().unwrap_or(0) as usize;
        let limit = options.limit_value().unwrap_or(DEFAULT_LIMIT) as usize;
        let mut results: Vec<Record> = matched.into_iter().skip(skip).take(limit).collect();

        let selected = options.selected_keys();
        if !selected.is_empty() {
            for record in &mut results {
                record.fields.retain(|name, _| selected.contains(name));
            }
        }

        debug!("Found {} records in {}", results.len(), collection);
        Ok(results)
    }
}

fn matches_constraints(record: &Record, constraints: Option<&Map<String, Value>>) -> Result<bool> {
    let Some(constraints) = constraints else {
        return Ok(true);
    };

    for (field, condition) in constraints {
        let actual = record.attribute(field);

        let operators = condition
            .as_object()
            .filter(|ops| !ops.is_empty() && ops.keys().all(|op| op.starts_with('$')));

        let matched = match operators {
            Some(ops) => {
                let mut all = true;
                for (op, expected) in ops {
                    if !apply_operator(op, actual.as_ref(), expected)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            None => actual.as_ref() == Some(condition),
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn apply_operator(op: &str, actual: Option<&Value>, expected: &Value) -> Result<bool> {
    let ordering = || actual.and_then(|actual| compare_values(actual, expected));

    let matched = match op {
        "$ne" => actual != Some(expected),
        "$in" => match (actual, expected.as_array()) {
            (Some(actual), Some(candidates)) => candidates.contains(actual),
            _ => false,
        },
        "$exists" => expected.as_bool() == Some(actual.is_some()),
        "$lt" => ordering() == Some(Ordering::Less),
        "$lte" => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        "$gt" => ordering() == Some(Ordering::Greater),
        "$gte" => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        other => {
            return Err(QueryCacheError::ExecutionError(format!(
                "unsupported query operator: {}",
                other
            )))
        }
    };

    Ok(matched)
}

/// Order two JSON values of the same kind; mixed kinds are unordered
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_by_keys(a: &Record, b: &Record, keys: &[String]) -> Ordering {
    for key in keys {
        let (field, descending) = match key.strip_prefix('-') {
            Some(field) => (field, true),
            None => (key.as_str(), false),
        };

        // Missing values sort first
        let ordering = match (a.attribute(field), b.attribute(field)) {
            (Some(x), Some(y)) => compare_values(&x, &y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        let ordering = if descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
