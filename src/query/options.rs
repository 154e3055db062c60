//! Query option accumulation
//!
//! [`QueryOptions`] is the mutable set of parameters that describe what a
//! query returns. Options are stored as a name → JSON value mapping using the
//! same option names a Parse-style backend expects (`where`, `limit`, `skip`,
//! `order`, `include`, `keys`). Any other name can be set through
//! [`QueryOptions::set`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Option holding the field constraints
pub const WHERE: &str = "where";
/// Option holding the maximum number of records
pub const LIMIT: &str = "limit";
/// Option holding the number of records to skip
pub const SKIP: &str = "skip";
/// Option holding the comma-separated sort keys (`-` prefix = descending)
pub const ORDER: &str = "order";
/// Option holding the comma-separated relations to include
pub const INCLUDE: &str = "include";
/// Option holding the comma-separated fields to return
pub const KEYS: &str = "keys";

/// Mutable set of query options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryOptions {
    options: BTreeMap<String, Value>,
}

impl QueryOptions {
    /// Create an empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw option value, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Get a raw option value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Remove an option, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.options.remove(name)
    }

    /// Remove every option
    pub fn clear(&mut self) {
        self.options.clear();
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Iterate over options in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.options.iter()
    }

    /// Require `field` to equal `value`
    pub fn equal_to(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let (field, value) = (field.into(), value.into());
        self.update_where(|clause| {
            clause.insert(field, value);
        });
        self
    }

    pub fn not_equal_to(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.add_condition(field, "$ne", value.into())
    }

    pub fn less_than(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.add_condition(field, "$lt", value.into())
    }

    pub fn less_than_or_equal_to(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_condition(field, "$lte", value.into())
    }

    pub fn greater_than(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.add_condition(field, "$gt", value.into())
    }

    pub fn greater_than_or_equal_to(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add_condition(field, "$gte", value.into())
    }

    /// Require `field` to be one of `values`
    pub fn contained_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.add_condition(field, "$in", Value::Array(values))
    }

    pub fn exists(&mut self, field: impl Into<String>) -> &mut Self {
        self.add_condition(field, "$exists", Value::Bool(true))
    }

    pub fn does_not_exist(&mut self, field: impl Into<String>) -> &mut Self {
        self.add_condition(field, "$exists", Value::Bool(false))
    }

    /// Limit the number of returned records
    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.set(LIMIT, n)
    }

    /// Skip the first `n` matching records
    pub fn skip(&mut self, n: u64) -> &mut Self {
        self.set(SKIP, n)
    }

    /// Sort ascending by `key`, replacing any previous ordering
    pub fn ascending(&mut self, key: impl Into<String>) -> &mut Self {
        let key: String = key.into();
        self.set(ORDER, key)
    }

    /// Sort descending by `key`, replacing any previous ordering
    pub fn descending(&mut self, key: impl Into<String>) -> &mut Self {
        let key: String = key.into();
        self.set(ORDER, format!("-{}", key))
    }

    /// Add an ascending sort key after the existing ones
    pub fn add_ascending(&mut self, key: impl Into<String>) -> &mut Self {
        self.append_list(ORDER, key.into())
    }

    /// Add a descending sort key after the existing ones
    pub fn add_descending(&mut self, key: impl Into<String>) -> &mut Self {
        let key: String = key.into();
        self.append_list(ORDER, format!("-{}", key))
    }

    /// Include a related object in the result
    pub fn include_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.append_list(INCLUDE, key.into())
    }

    /// Restrict the returned fields
    pub fn select<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.set(KEYS, keys.join(","))
    }

    /// Field constraints, if any were added
    pub fn constraints(&self) -> Option<&Map<String, Value>> {
        self.options.get(WHERE).and_then(Value::as_object)
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.options.get(LIMIT).and_then(Value::as_u64)
    }

    pub fn skip_value(&self) -> Option<u64> {
        self.options.get(SKIP).and_then(Value::as_u64)
    }

    /// Sort keys in priority order, `-` prefixed when descending
    pub fn order_keys(&self) -> Vec<String> {
        self.list(ORDER)
    }

    pub fn include_keys(&self) -> Vec<String> {
        self.list(INCLUDE)
    }

    pub fn selected_keys(&self) -> Vec<String> {
        self.list(KEYS)
    }

    /// Serialize with every object key sorted, at every nesting level
    ///
    /// Equal option sets always produce identical output, whatever order
    /// options and constraints were added in.
    pub fn to_canonical_json(&self) -> Result<String> {
        let canonical: Map<String, Value> = self
            .options
            .iter()
            .map(|(name, value)| (name.clone(), canonicalize(value)))
            .collect();

        Ok(serde_json::to_string(&Value::Object(canonical))?)
    }

    /// Apply `f` to the where clause, replacing a non-object clause with an empty one
    fn update_where(&mut self, f: impl FnOnce(&mut Map<String, Value>)) {
        let mut clause = match self.options.remove(WHERE) {
            Some(Value::Object(clause)) => clause,
            _ => Map::new(),
        };
        f(&mut clause);
        self.options.insert(WHERE.to_string(), Value::Object(clause));
    }

    fn add_condition(&mut self, field: impl Into<String>, op: &str, value: Value) -> &mut Self {
        let field = field.into();
        self.update_where(|clause| {
            // An earlier equal_to on the same field is replaced by the operator map
            let mut ops = match clause.remove(&field) {
                Some(Value::Object(ops)) => ops,
                _ => Map::new(),
            };
            ops.insert(op.to_string(), value);
            clause.insert(field, Value::Object(ops));
        });
        self
    }

    fn append_list(&mut self, name: &str, item: String) -> &mut Self {
        let mut items = self.list(name);
        items.push(item);
        self.set(name, items.join(","))
    }

    fn list(&self, name: &str) -> Vec<String> {
        self.options
            .get(name)
            .and_then(Value::as_str)
            .map(|s| {
                s.split(',')
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Rebuild a JSON value with object keys inserted in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
