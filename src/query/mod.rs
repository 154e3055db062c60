//! Query description: options, returned records and the derived cache key

pub mod key;
pub mod options;
pub mod record;

pub use key::CacheKey;
pub use options::QueryOptions;
pub use record::Record;
