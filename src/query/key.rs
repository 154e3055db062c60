//! Cache key derivation

use crate::error::Result;
use crate::query::options::QueryOptions;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

/// Deterministic digest identifying a (collection, options) pair
///
/// The key is `hex(sha256(collection ++ canonical_json(options)))`. It is
/// never stored by the decorator: every cache check derives it again from the
/// live options, so mutating the options moves the query to a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a collection and its current options
    pub fn derive(collection: &str, options: &QueryOptions) -> Result<Self> {
        let canonical = options.to_canonical_json()?;

        let mut hasher = Sha256::new();
        hasher.update(collection.as_bytes());
        hasher.update(canonical.as_bytes());
        let key = hex::encode(hasher.finalize());

        debug!("Derived cache key {} for {} {}", key, collection, canonical);
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}
