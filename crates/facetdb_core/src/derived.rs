//! Derived index: an incrementally-maintained projection of the store
//! under one map function.

use crate::error::{CoreError, CoreResult, MapError};
use facetdb_collate::{decode_key, encode_key, CollatedKey, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Shorthand emission returned by a map function that never called
/// [`Emitter::emit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// Contribute nothing for this record.
    Skip,
    /// Emit the record's own value under this index key.
    Key(Value),
    /// Emit an explicit (index key, value) pair.
    Pair(Value, Value),
}

/// Emission capability handed to a map function.
///
/// Each call appends one derived entry for the record under
/// recomputation. Emissions are buffered and committed only if the map
/// function returns successfully, so a failing function leaves the
/// index untouched.
pub struct Emitter {
    buffer: Vec<(CollatedKey, Value)>,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Emit a derived entry under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Collate`] if `key` cannot be collated
    /// (e.g. it contains NaN).
    pub fn emit(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> CoreResult<()> {
        let key = key.into();
        let token = encode_key(&key)?;
        self.buffer.push((token, value.into()));
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// A caller-supplied map function.
///
/// Invoked as `fn(record_key, record_value, emitter)`. The function may
/// call [`Emitter::emit`] zero or more times; if it emits at least
/// once, its return value is ignored. Otherwise the returned
/// [`Emission`] is applied as shorthand.
pub type MapFn = dyn Fn(&str, &Value, &mut Emitter) -> Result<Emission, MapError> + Send + Sync;

/// One derived entry: an emitted value plus the record that produced it.
struct Entry {
    value: Value,
    source_key: String,
    source: Value,
}

/// A derived index over a document store.
///
/// Holds the map function, the entry table keyed by collated index key,
/// and a reverse-link table from record key to the index keys that
/// record currently contributes to. The reverse links make invalidation
/// proportional to one record's output rather than the whole index.
///
/// Indexes are created and kept consistent by
/// [`Store`](crate::Store); this type only exposes queries.
pub struct Derived {
    name: String,
    map_fn: Box<MapFn>,
    entries: BTreeMap<CollatedKey, Vec<Entry>>,
    by_source: HashMap<String, Vec<CollatedKey>>,
}

impl Derived {
    pub(crate) fn new(name: impl Into<String>, map_fn: Box<MapFn>) -> Self {
        Self {
            name: name.into(),
            map_fn,
            entries: BTreeMap::new(),
            by_source: HashMap::new(),
        }
    }

    /// This index's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First emitted value under `key`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Collate`] if `key` cannot be collated.
    pub fn get(&self, key: &Value) -> CoreResult<Option<Value>> {
        let token = encode_key(key)?;
        Ok(self
            .entries
            .get(&token)
            .and_then(|list| list.first())
            .map(|entry| entry.value.clone()))
    }

    /// Every emitted value under `key`, in emission order.
    ///
    /// Order across contributing records is the order records were last
    /// recomputed, not a sort of the values.
    pub fn get_all(&self, key: &Value) -> CoreResult<Vec<Value>> {
        let token = encode_key(key)?;
        Ok(self
            .entries
            .get(&token)
            .map(|list| list.iter().map(|entry| entry.value.clone()).collect())
            .unwrap_or_default())
    }

    /// The contributing record value of the first entry under `key`.
    pub fn get_source(&self, key: &Value) -> CoreResult<Option<Value>> {
        let token = encode_key(key)?;
        Ok(self
            .entries
            .get(&token)
            .and_then(|list| list.first())
            .map(|entry| entry.source.clone()))
    }

    /// Every contributing record value under `key`, in emission order.
    pub fn get_all_sources(&self, key: &Value) -> CoreResult<Vec<Value>> {
        let token = encode_key(key)?;
        Ok(self
            .entries
            .get(&token)
            .map(|list| list.iter().map(|entry| entry.source.clone()).collect())
            .unwrap_or_default())
    }

    /// Every distinct index key currently present, decoded back to
    /// structured form, in ascending collation order.
    pub fn keys(&self) -> CoreResult<Vec<Value>> {
        self.entries
            .keys()
            .map(|token| decode_key(token.as_bytes()).map_err(CoreError::from))
            .collect()
    }

    /// Number of distinct index keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute `record`'s contribution against `value` (`None` when
    /// the record was removed).
    ///
    /// Emissions are buffered first; the old contribution is cleared
    /// and the new one committed only once the map function has
    /// returned successfully. On failure the index is exactly as it was
    /// before the call.
    pub(crate) fn recompute(&mut self, record: &str, value: Option<&Value>) -> CoreResult<()> {
        let mut buffered = Vec::new();
        if let Some(value) = value {
            let mut emitter = Emitter::new();
            let shorthand = (self.map_fn)(record, value, &mut emitter)
                .map_err(|source| CoreError::map_function(&self.name, record, source))?;
            if emitter.is_empty() {
                match shorthand {
                    Emission::Pair(key, emitted) => emitter.emit(key, emitted)?,
                    Emission::Key(key) => emitter.emit(key, value.clone())?,
                    Emission::Skip => {}
                }
            }
            buffered = emitter.buffer;
        }

        let cleared = self.clear_source(record);
        let emitted = buffered.len();

        if !buffered.is_empty() {
            let links = self.by_source.entry(record.to_string()).or_default();
            for (token, emitted_value) in buffered {
                links.push(token.clone());
                self.entries.entry(token).or_default().push(Entry {
                    value: emitted_value,
                    source_key: record.to_string(),
                    source: value.cloned().unwrap_or(Value::Null),
                });
            }
        }

        debug!(
            index = %self.name,
            record = %record,
            cleared,
            emitted,
            "recomputed record contribution"
        );
        Ok(())
    }

    /// Remove every entry citing `record` and its reverse links.
    /// Returns the number of entries removed.
    fn clear_source(&mut self, record: &str) -> usize {
        let Some(tokens) = self.by_source.remove(record) else {
            return 0;
        };
        let mut removed = 0;
        for token in tokens {
            if let Some(list) = self.entries.get_mut(&token) {
                let before = list.len();
                list.retain(|entry| entry.source_key != record);
                removed += before - list.len();
                if list.is_empty() {
                    self.entries.remove(&token);
                }
            }
        }
        removed
    }

    /// Swap in a new map function and drop every contribution; the
    /// caller re-feeds all records afterwards.
    pub(crate) fn reset_with_fn(&mut self, map_fn: Box<MapFn>) {
        self.map_fn = map_fn;
        self.entries.clear();
        self.by_source.clear();
    }

    #[cfg(test)]
    pub(crate) fn assert_reverse_links_consistent(&self) {
        for (record, tokens) in &self.by_source {
            assert!(!tokens.is_empty(), "record {record} has an empty link list");
            for token in tokens {
                let list = self
                    .entries
                    .get(token)
                    .unwrap_or_else(|| panic!("record {record} links to a missing key"));
                assert!(
                    list.iter().any(|e| &e.source_key == record),
                    "record {record} links to a key without its entry"
                );
            }
        }
        for (token, list) in &self.entries {
            assert!(!list.is_empty());
            for entry in list {
                let links = self.by_source.get(&entry.source_key).expect("missing links");
                assert!(links.contains(token), "entry not reverse-linked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inverted() -> Derived {
        Derived::new(
            "inverted",
            Box::new(|k, v, _emit| Ok(Emission::Pair(v.clone(), Value::from(k)))),
        )
    }

    #[test]
    fn pair_shorthand_emits_once() {
        let mut idx = inverted();
        idx.recompute("a", Some(&Value::from(23))).unwrap();
        assert_eq!(idx.get(&Value::from(23)).unwrap(), Some(Value::from("a")));
        assert_eq!(idx.get_source(&Value::from(23)).unwrap(), Some(Value::from(23)));
        idx.assert_reverse_links_consistent();
    }

    #[test]
    fn key_shorthand_emits_record_value() {
        let mut idx = Derived::new(
            "by_color",
            Box::new(|_k, v, _emit| {
                Ok(v.get("color").cloned().map(Emission::Key).unwrap_or(Emission::Skip))
            }),
        );
        let record = Value::map(vec![
            ("color".to_string(), Value::from("yellow")),
            ("name".to_string(), Value::from("bananas")),
        ]);
        idx.recompute("4398756", Some(&record)).unwrap();
        assert_eq!(idx.get(&Value::from("yellow")).unwrap(), Some(record.clone()));
        assert_eq!(idx.get_source(&Value::from("yellow")).unwrap(), Some(record));
    }

    #[test]
    fn explicit_emit_ignores_return() {
        let mut idx = Derived::new(
            "fanout",
            Box::new(|_k, v, emit| {
                for item in v.as_array().unwrap() {
                    emit.emit(item.clone(), Value::from(1))?;
                }
                // Emitted above, so this shorthand must be ignored.
                Ok(Emission::Key(Value::from("ignored")))
            }),
        );
        idx.recompute("r", Some(&Value::Array(vec![Value::from("x"), Value::from("y")])))
            .unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.get(&Value::from("ignored")).unwrap(), None);
    }

    #[test]
    fn skip_emits_nothing() {
        let mut idx = Derived::new("empty", Box::new(|_k, _v, _emit| Ok(Emission::Skip)));
        idx.recompute("r", Some(&Value::from(1))).unwrap();
        assert!(idx.is_empty());
        assert!(idx.keys().unwrap().is_empty());
    }

    #[test]
    fn multiplicity_keeps_call_order() {
        let mut idx = Derived::new(
            "dup",
            Box::new(|_k, _v, emit| {
                emit.emit(Value::from("same"), Value::from("first"))?;
                emit.emit(Value::from("same"), Value::from("second"))?;
                Ok(Emission::Skip)
            }),
        );
        idx.recompute("r", Some(&Value::Null)).unwrap();
        assert_eq!(
            idx.get_all(&Value::from("same")).unwrap(),
            vec![Value::from("first"), Value::from("second")]
        );
        assert_eq!(idx.get(&Value::from("same")).unwrap(), Some(Value::from("first")));
        idx.assert_reverse_links_consistent();
    }

    #[test]
    fn removal_clears_contribution() {
        let mut idx = inverted();
        idx.recompute("a", Some(&Value::from(23))).unwrap();
        idx.recompute("b", Some(&Value::from(12))).unwrap();
        idx.recompute("a", None).unwrap();
        assert_eq!(idx.get(&Value::from(23)).unwrap(), None);
        assert_eq!(idx.get(&Value::from(12)).unwrap(), Some(Value::from("b")));
        assert_eq!(idx.keys().unwrap(), vec![Value::from(12)]);
        idx.assert_reverse_links_consistent();
    }

    #[test]
    fn failed_map_function_leaves_index_untouched() {
        let mut idx = Derived::new(
            "flaky",
            Box::new(|k, v, emit| {
                emit.emit(v.clone(), Value::from(k))?;
                if k == "bad" {
                    return Err("boom".into());
                }
                Ok(Emission::Skip)
            }),
        );
        idx.recompute("good", Some(&Value::from(1))).unwrap();
        let err = idx.recompute("bad", Some(&Value::from(2))).unwrap_err();
        assert!(matches!(err, CoreError::MapFunction { .. }));
        // The emission buffered before the failure was not committed.
        assert_eq!(idx.get(&Value::from(2)).unwrap(), None);
        assert_eq!(idx.get(&Value::from(1)).unwrap(), Some(Value::from("good")));
        idx.assert_reverse_links_consistent();
    }

    #[test]
    fn failed_recompute_keeps_previous_contribution() {
        let mut idx = Derived::new(
            "flaky",
            Box::new(|_k, v, emit| {
                if v.as_number() == Some(0.0) {
                    return Err("refused".into());
                }
                emit.emit(v.clone(), Value::from("ok"))?;
                Ok(Emission::Skip)
            }),
        );
        idx.recompute("r", Some(&Value::from(7))).unwrap();
        assert!(idx.recompute("r", Some(&Value::from(0))).is_err());
        // Old contribution survives because nothing was cleared.
        assert_eq!(idx.get(&Value::from(7)).unwrap(), Some(Value::from("ok")));
    }

    #[test]
    fn nan_key_from_emit_is_a_collate_error() {
        let mut idx = Derived::new(
            "nan",
            Box::new(|_k, _v, emit| {
                emit.emit(Value::Number(f64::NAN), Value::Null)?;
                Ok(Emission::Skip)
            }),
        );
        let err = idx.recompute("r", Some(&Value::Null)).unwrap_err();
        // The emit failure propagates through the map function wrapper.
        assert!(matches!(err, CoreError::MapFunction { .. }));
        assert!(idx.is_empty());
    }

    #[test]
    fn keys_enumerate_in_collation_order() {
        let mut idx = inverted();
        idx.recompute("a", Some(&Value::from("zebra"))).unwrap();
        idx.recompute("b", Some(&Value::from(5))).unwrap();
        idx.recompute("c", Some(&Value::Bool(true))).unwrap();
        assert_eq!(
            idx.keys().unwrap(),
            vec![Value::Bool(true), Value::from(5), Value::from("zebra")]
        );
    }
}
