//! Error types for the engine crate.

use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed error a map function may fail with.
pub type MapError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in store and index operations.
///
/// Lookup misses are not errors; absent keys resolve to `None` or an
/// empty list.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Key collation failed (unsupported key or foreign token).
    #[error("collation error: {0}")]
    Collate(#[from] facetdb_collate::CollateError),

    /// A caller-supplied map function failed during recompute.
    ///
    /// The store's own write has already committed; the named index was
    /// left untouched for the failing record.
    #[error("map function of index '{index}' failed on record '{record}': {source}")]
    MapFunction {
        /// Index whose map function failed.
        index: String,
        /// Record being recomputed.
        record: String,
        /// The map function's error.
        #[source]
        source: MapError,
    },

    /// An index with this name is already registered.
    #[error("index already exists: {name}")]
    IndexExists {
        /// The conflicting index name.
        name: String,
    },

    /// No index with this name is registered.
    #[error("index not found: {name}")]
    IndexNotFound {
        /// The missing index name.
        name: String,
    },

    /// A path expression is empty or does not fit the addressed value.
    #[error("invalid path '{path}': {message}")]
    InvalidPath {
        /// The offending path expression.
        path: String,
        /// Why it was rejected.
        message: String,
    },
}

impl CoreError {
    /// Create a map-function error.
    pub fn map_function(
        index: impl Into<String>,
        record: impl Into<String>,
        source: MapError,
    ) -> Self {
        Self::MapFunction {
            index: index.into(),
            record: record.into(),
            source,
        }
    }

    /// Create an invalid-path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }
}
