//! Index registry: binds derived indexes to a store and fans out
//! change notifications.

use crate::derived::{Derived, MapFn};
use crate::error::{CoreError, CoreResult};
use facetdb_collate::Value;
use std::collections::HashMap;
use tracing::trace;

/// The set of derived indexes registered on one store.
///
/// Its only behavior beyond bookkeeping is the fan-out: when a record
/// changes, every index recomputes that record's contribution. Fan-out
/// order across indexes is unspecified; each index's recompute is
/// self-contained, so the order has no observable effect.
#[derive(Default)]
pub(crate) struct IndexRegistry {
    indexes: HashMap<String, Derived>,
}

impl IndexRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a new index. Fails if the name is taken.
    pub(crate) fn register(&mut self, name: &str, map_fn: Box<MapFn>) -> CoreResult<&mut Derived> {
        if self.indexes.contains_key(name) {
            return Err(CoreError::IndexExists {
                name: name.to_string(),
            });
        }
        Ok(self
            .indexes
            .entry(name.to_string())
            .or_insert_with(|| Derived::new(name, map_fn)))
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Derived> {
        self.indexes.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> CoreResult<&mut Derived> {
        self.indexes
            .get_mut(name)
            .ok_or_else(|| CoreError::IndexNotFound {
                name: name.to_string(),
            })
    }

    /// Recompute `record`'s contribution in every registered index.
    pub(crate) fn fan_out(&mut self, record: &str, value: Option<&Value>) -> CoreResult<()> {
        trace!(record = %record, indexes = self.indexes.len(), "fanning out change");
        for index in self.indexes.values_mut() {
            index.recompute(record, value)?;
        }
        Ok(())
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.indexes.len()
    }
}
