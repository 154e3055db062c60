//! Serialized form of a cached result set

use crate::cache::types::CacheValue;
use crate::error::Result;
use crate::query::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached query result wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedQueryResult {
    /// Collection the records were read from
    pub collection: String,

    pub records: Vec<Record>,

    /// Number of records in result
    pub record_count: usize,

    pub cached_at: DateTime<Utc>,

    /// Query execution time (for metrics)
    pub execution_time_ms: u64,
}

impl CachedQueryResult {
    pub fn new(collection: impl Into<String>, records: Vec<Record>, execution_time_ms: u64) -> Self {
        let record_count = records.len();
        Self {
            collection: collection.into(),
            records,
            record_count,
            cached_at: Utc::now(),
            execution_time_ms,
        }
    }

    /// A decoded envelope is only trusted when its record count matches
    pub fn is_consistent(&self) -> bool {
        self.record_count == self.records.len()
    }

    pub fn to_cache_value(&self) -> Result<CacheValue> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_cache_value(value: &str) -> Result<Self> {
        Ok(serde_json::from_str(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryCacheError;
    use serde_json::json;

    #[test]
    fn test_round_trip_empty() {
        let result = CachedQueryResult::new("Widgets", Vec::new(), 12);

        let value = result.to_cache_value().unwrap();
        let decoded = CachedQueryResult::from_cache_value(&value).unwrap();

        assert_eq!(decoded, result);
        assert!(decoded.records.is_empty());
        assert!(decoded.is_consistent());
    }

    #[test]
    fn test_round_trip_records() {
        let records: Vec<Record> = (0..5)
            .map(|i| {
                Record::new("Widgets")
                    .with_object_id(format!("id{}", i))
                    .with_field("String", format!("String{}", i))
            })
            .collect();
        let result = CachedQueryResult::new("Widgets", records.clone(), 3);

        let decoded =
            CachedQueryResult::from_cache_value(&result.to_cache_value().unwrap()).unwrap();
        assert_eq!(decoded.records, records);
        assert_eq!(decoded.record_count, 5);
    }

    #[test]
    fn test_round_trip_nested_fields() {
        let mut record = Record::new("Widgets").with_object_id("nested");
        record.created_at = Some(Utc::now());
        record.set("owner", json!({"__type": "Pointer", "className": "_User", "objectId": "u1"}));
        record.set("matrix", json!([[1, 2], [3, 4]]));
        record.set("ratio", 0.25);
        record.set("missing", serde_json::Value::Null);

        let result = CachedQueryResult::new("Widgets", vec![record.clone()], 0);
        let decoded =
            CachedQueryResult::from_cache_value(&result.to_cache_value().unwrap()).unwrap();

        assert_eq!(decoded.records[0], record);
    }

    #[test]
    fn test_round_trip_exact_floats() {
        let values = [
            -1.1193133179981887e-17,
            6.100029174392375e177,
            -2.9582464636439276e262,
            7.616581843686657e288,
            f64::MIN_POSITIVE,
            f64::MAX,
            0.1 + 0.2,
        ];
        let records: Vec<Record> = values
            .iter()
            .map(|&x| Record::new("Samples").with_field("x", x))
            .collect();
        let result = CachedQueryResult::new("Samples", records.clone(), 0);

        let decoded =
            CachedQueryResult::from_cache_value(&result.to_cache_value().unwrap()).unwrap();
        assert_eq!(decoded.records, records);
        for (record, &x) in decoded.records.iter().zip(values.iter()) {
            assert_eq!(record.get("x").and_then(|v| v.as_f64()), Some(x));
        }
    }

    #[test]
    fn test_inconsistent_count() {
        let mut result = CachedQueryResult::new("Widgets", vec![Record::new("Widgets")], 0);
        result.record_count = 4;
        assert!(!result.is_consistent());
    }

    #[test]
    fn test_garbage_value() {
        let err = CachedQueryResult::from_cache_value("not a result").unwrap_err();
        assert!(matches!(err, QueryCacheError::SerializationError(_)));
    }
}
