//! Document store with change-driven index maintenance.

use crate::derived::{Derived, Emission, Emitter, MapFn};
use crate::error::{CoreError, CoreResult, MapError};
use crate::path;
use crate::registry::IndexRegistry;
use facetdb_collate::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A path-addressable document store with derived indexes.
///
/// The store owns the raw record-key → record-value mapping plus every
/// registered [`Derived`] index. Each mutation commits the raw write
/// and then notifies the indexes for exactly one top-level record key,
/// however deep the touched path was, so indexes always recompute a
/// record's whole contribution.
///
/// The model is single-threaded and synchronous: every mutation
/// performs its full recompute before returning, and reads never
/// trigger recomputation.
///
/// # Example
///
/// ```
/// use facetdb_core::{Emission, Store, Value};
///
/// let mut store = Store::from_records([("a", 23), ("b", 12)]);
/// store.derived("inverted", |k, v, _emit| {
///     Ok(Emission::Pair(v.clone(), Value::from(k)))
/// })?;
///
/// let inverted = store.index("inverted").unwrap();
/// assert_eq!(inverted.get(&Value::from(12))?, Some(Value::from("b")));
/// # Ok::<(), facetdb_core::CoreError>(())
/// ```
#[derive(Default)]
pub struct Store {
    records: BTreeMap<String, Value>,
    indexes: IndexRegistry,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            indexes: IndexRegistry::new(),
        }
    }

    /// Create a store pre-populated with records.
    pub fn from_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            records: records
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            indexes: IndexRegistry::new(),
        }
    }

    /// Read the value at `path`, or `None` if it does not exist.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = path::parse(path).ok()?;
        let (top, rest) = segments.split_first()?;
        let record = self.records.get(top)?;
        if rest.is_empty() {
            Some(record)
        } else {
            path::get(record, rest)
        }
    }

    /// Write `value` at `path`, creating intermediate containers for
    /// nested paths, then recompute the touched record's contribution
    /// in every index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPath`] if the path does not fit the
    /// record, or propagates a map-function failure from the recompute.
    /// The raw write commits before indexes run, so on a map-function
    /// failure the store is updated and the failing index untouched.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> CoreResult<()> {
        let (top, rest) = Self::split_path(path)?;
        if rest.is_empty() {
            self.records.insert(top.clone(), value.into());
        } else {
            let mut record = self.records.get(&top).cloned().unwrap_or(Value::Null);
            path::set(&mut record, path, &rest, value.into())?;
            self.records.insert(top.clone(), record);
        }
        self.changed(&top)
    }

    /// Remove the value at `path` (the whole record for a one-segment
    /// path), then recompute the touched record's contribution.
    pub fn delete(&mut self, path: &str) -> CoreResult<()> {
        let (top, rest) = Self::split_path(path)?;
        if rest.is_empty() {
            self.records.remove(&top);
        } else if let Some(record) = self.records.get_mut(&top) {
            path::delete(record, &rest);
        }
        self.changed(&top)
    }

    /// Append `value` to the array at `path`, creating the array if the
    /// path is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPath`] if an existing value at
    /// `path` is not an array.
    pub fn push(&mut self, path: &str, value: impl Into<Value>) -> CoreResult<()> {
        let items = match self.get(path) {
            None => vec![value.into()],
            Some(Value::Array(items)) => {
                let mut items = items.clone();
                items.push(value.into());
                items
            }
            Some(_) => {
                return Err(CoreError::invalid_path(path, "push target is not an array"));
            }
        };
        self.set(path, Value::Array(items))
    }

    /// Swap the entire store contents.
    ///
    /// Notifies once per key removed from the old contents, then once
    /// per key present in the new contents.
    pub fn replace<I, K, V>(&mut self, contents: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let old_keys: Vec<String> = self.records.keys().cloned().collect();
        self.records.clear();
        for key in &old_keys {
            self.changed(key)?;
        }

        self.records = contents
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let new_keys: Vec<String> = self.records.keys().cloned().collect();
        for key in &new_keys {
            self.changed(key)?;
        }
        debug!(removed = old_keys.len(), added = new_keys.len(), "replaced store contents");
        Ok(())
    }

    /// Register a derived index under `name` and back-fill it from
    /// every current record, so it is immediately query-consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexExists`] if the name is taken, or the
    /// first failure raised during back-fill.
    pub fn derived<F>(&mut self, name: &str, map_fn: F) -> CoreResult<()>
    where
        F: Fn(&str, &Value, &mut Emitter) -> Result<Emission, MapError> + Send + Sync + 'static,
    {
        let index = self.indexes.register(name, Box::new(map_fn))?;
        for (key, value) in &self.records {
            index.recompute(key, Some(value))?;
        }
        debug!(index = %name, records = self.records.len(), "registered derived index");
        Ok(())
    }

    /// Replace the map function of index `name` and rebuild it from
    /// scratch. The result is observably identical to a brand-new index
    /// registered with `map_fn` over the same contents.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexNotFound`] for an unknown name, or the
    /// first failure raised during the rebuild.
    pub fn replace_fn<F>(&mut self, name: &str, map_fn: F) -> CoreResult<()>
    where
        F: Fn(&str, &Value, &mut Emitter) -> Result<Emission, MapError> + Send + Sync + 'static,
    {
        let index = self.indexes.get_mut(name)?;
        index.reset_with_fn(Box::new(map_fn));
        for (key, value) in &self.records {
            index.recompute(key, Some(value))?;
        }
        debug!(index = %name, "replaced map function and rebuilt");
        Ok(())
    }

    /// Query handle for the index registered under `name`.
    pub fn index(&self, name: &str) -> Option<&Derived> {
        self.indexes.get(name)
    }

    /// Names of every registered index.
    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.indexes.names()
    }

    /// Number of registered indexes.
    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    /// Every record key currently in the store.
    pub fn record_keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Every (record key, record value) pair.
    pub fn records(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn split_path(path: &str) -> CoreResult<(String, Vec<String>)> {
        let mut segments = path::parse(path)?;
        let top = segments.remove(0);
        Ok((top, segments))
    }

    /// Fan a change to `key` out to every registered index.
    fn changed(&mut self, key: &str) -> CoreResult<()> {
        self.indexes.fan_out(key, self.records.get(key))
    }
}
