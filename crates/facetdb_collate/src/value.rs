//! Dynamic key/document value type.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A dynamic structured value.
///
/// `Value` is used both for document contents in the store and for index
/// keys chosen by map functions. Every variant has a position in the
/// collation order except `Number(NaN)`, which is rejected at encode time.
///
/// Map entries are kept sorted by key so that equal maps encode to
/// identical tokens; use [`Value::map`] or [`Value::insert`] rather than
/// constructing `Value::Map` with unsorted pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null / absence.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value. `-0.0` is normalized to `0.0` by the constructors
    /// so numerically equal keys collate identically.
    Number(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Keyed mapping with string keys, sorted by key.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Create a number value, normalizing `-0.0` to `0.0`.
    pub fn number(n: f64) -> Self {
        Value::Number(if n == 0.0 { 0.0 } else { n })
    }

    /// Create a map value with entries sorted by key.
    ///
    /// Duplicate keys keep the last occurrence.
    pub fn map(pairs: Vec<(String, Value)>) -> Self {
        let mut sorted = pairs;
        // Stable sort, then keep the last of each run of equal keys.
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted.reverse();
        sorted.dedup_by(|a, b| a.0 == b.0);
        sorted.reverse();
        Value::Map(sorted)
    }

    /// Compare two values under the collation order.
    ///
    /// Cross-type order, lowest to highest: null, booleans (false before
    /// true), numbers, strings, arrays, maps. Arrays compare element-wise
    /// with a strict prefix sorting first; maps compare entry-wise (key
    /// string, then value). This is the same total order the encoded
    /// tokens have under byte comparison.
    pub fn cmp_collated(&self, other: &Self) -> Ordering {
        let rank = self.type_rank();
        let other_rank = other.type_rank();
        if rank != other_rank {
            return rank.cmp(&other_rank);
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => {
                Self::normalize(*a).total_cmp(&Self::normalize(*b))
            }
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => {
                for (av, bv) in a.iter().zip(b.iter()) {
                    let ord = av.cmp_collated(bv);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Map(a), Value::Map(b)) => {
                for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                    let key_ord = ak.cmp(bk);
                    if key_ord != Ordering::Equal {
                        return key_ord;
                    }
                    let val_ord = av.cmp_collated(bv);
                    if val_ord != Ordering::Equal {
                        return val_ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => unreachable!("ranks matched"),
        }
    }

    pub(crate) fn normalize(n: f64) -> f64 {
        if n == 0.0 {
            0.0
        } else {
            n
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
            Value::Array(_) => 4,
            Value::Map(_) => 5,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as a number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array slice, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a mutable array, if it is one.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value's map entries, if it is a map.
    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a key in this map value, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Map(pairs) => pairs
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace an entry in this map value, keeping entries
    /// sorted by key. Returns the previous value, if any.
    ///
    /// Does nothing and returns `None` if this value is not a map.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let Value::Map(pairs) = self else { return None };
        let key = key.into();
        match pairs.binary_search_by(|(k, _)| k.as_str().cmp(&key)) {
            Ok(i) => Some(std::mem::replace(&mut pairs[i].1, value)),
            Err(i) => {
                pairs.insert(i, (key, value));
                None
            }
        }
    }

    /// Remove an entry from this map value. Returns the removed value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let Value::Map(pairs) = self else { return None };
        match pairs.binary_search_by(|(k, _)| k.as_str().cmp(key)) {
            Ok(i) => Some(pairs.remove(i).1),
            Err(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        // Lossy above 2^53, like every double-based document model.
        #[allow(clippy::cast_precision_loss)]
        Value::number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
