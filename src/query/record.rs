//! Records returned by query execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single object returned by a query
///
/// Field values are kept as JSON so records of any shape, including nested
/// objects and arrays, survive a trip through the cache unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Collection the record belongs to
    pub class_name: String,

    /// Backend identifier, absent for records that were never stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// User-defined fields
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record for a collection
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            created_at: None,
            updated_at: None,
            fields: Map::new(),
        }
    }

    /// Set the object id
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    /// Set a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a field or one of the built-in attributes by name
    ///
    /// `objectId`, `createdAt` and `updatedAt` resolve to the record metadata,
    /// so filters and sort keys can target them like regular fields.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "objectId" => self.object_id.clone().map(Value::String),
            "createdAt" => self.created_at.map(|t| Value::String(t.to_rfc3339())),
            "updatedAt" => self.updated_at.map(|t| Value::String(t.to_rfc3339())),
            _ => self.fields.get(name).cloned(),
        }
    }
}
