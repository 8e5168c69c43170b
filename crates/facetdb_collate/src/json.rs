//! Conversion between [`Value`] and `serde_json::Value`.
//!
//! Available behind the `json` feature. Handy for building fixtures with
//! `serde_json::json!` and for exporting query results.

use crate::value::Value;

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            // Numbers outside f64 range degrade; NaN cannot appear in JSON.
            serde_json::Value::Number(n) => Value::number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => {
                Value::map(entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_object_becomes_sorted_map() {
        let v = Value::from(json!({"b": 2, "a": {"nested": [1, true, null]}}));
        let pairs = v.as_map().unwrap();
        assert_eq!(pairs[0].0, "a");
        assert_eq!(pairs[1].0, "b");
        assert_eq!(pairs[1].1, Value::from(2));
        assert_eq!(
            v.get("a").unwrap().get("nested").unwrap(),
            &Value::Array(vec![Value::from(1), Value::Bool(true), Value::Null])
        );
    }

    #[test]
    fn back_to_json() {
        let v = Value::from(json!({"name": "bananas", "color": "yellow"}));
        let json = serde_json::Value::from(&v);
        assert_eq!(json, json!({"color": "yellow", "name": "bananas"}));
    }

    #[test]
    fn non_finite_numbers_export_as_null() {
        // JSON has no representation for these, so the conversion is
        // infallible but lossy here.
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let json = serde_json::Value::from(&Value::Number(n));
            assert_eq!(json, serde_json::Value::Null);
        }
    }
}
