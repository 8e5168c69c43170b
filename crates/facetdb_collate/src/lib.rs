//! # FacetDB Collate
//!
//! Order-preserving collation encoding for heterogeneous structured keys.
//!
//! This crate converts [`Value`] keys into byte-comparable tokens and
//! back, guaranteeing one stable total order across types:
//!
//! ```text
//! null < false < true < numbers < strings < arrays < maps
//! ```
//!
//! Numbers order numerically across sign and magnitude, strings by
//! code point, arrays element-wise (a strict prefix sorts first), and
//! maps entry-wise in sorted key order.
//!
//! ## Guarantees
//!
//! - **Round-trip**: `decode_key(encode_key(k)) == k` for every
//!   encodable key.
//! - **Order preservation**: `encode_key(a) < encode_key(b)` by byte
//!   comparison iff `a` precedes `b` under [`Value::cmp_collated`].
//! - Equal keys encode to identical tokens.
//!
//! ## Usage
//!
//! ```
//! use facetdb_collate::{decode_key, encode_key, Value};
//!
//! let key = Value::Array(vec![Value::from("fruta"), Value::from("uva")]);
//! let token = encode_key(&key).unwrap();
//! assert_eq!(decode_key(token.as_bytes()).unwrap(), key);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
#[cfg(feature = "json")]
mod json;
mod key;
mod value;

pub use decoder::{decode_key, CollationDecoder};
pub use encoder::{encode_key, tags, CollationEncoder};
pub use error::{CollateError, CollateResult};
pub use key::CollatedKey;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<f64>()
                .prop_filter("NaN is not collatable", |n| !n.is_nan())
                .prop_map(Value::from),
            "[a-zA-Z0-9\u{e0}-\u{ff} ]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{0,4}", inner), 0..4).prop_map(Value::map),
            ]
        })
    }

    proptest! {
        #[test]
        fn roundtrip(key in arb_value()) {
            let token = encode_key(&key).unwrap();
            prop_assert_eq!(decode_key(token.as_bytes()).unwrap(), key);
        }

        #[test]
        fn order_preservation(a in arb_value(), b in arb_value()) {
            let ta = encode_key(&a).unwrap();
            let tb = encode_key(&b).unwrap();
            prop_assert_eq!(ta.cmp(&tb), a.cmp_collated(&b));
        }

        #[test]
        fn equal_keys_identical_tokens(a in arb_value()) {
            let ta = encode_key(&a).unwrap();
            let tb = encode_key(&a.clone()).unwrap();
            prop_assert_eq!(ta, tb);
        }
    }

    #[test]
    fn pinned_cross_type_ladder() {
        let ladder = [
            Value::Null,
            Value::Bool(false),
            Value::Bool(true),
            Value::Number(f64::NEG_INFINITY),
            Value::from(-1),
            Value::from(0),
            Value::from(0.5),
            Value::from(12),
            Value::from(23),
            Value::from(""),
            Value::from("a"),
            Value::from("a\0"),
            Value::from("ab"),
            Value::Array(vec![]),
            Value::Array(vec![Value::Null]),
            Value::Array(vec![Value::from("fruta"), Value::from("uva")]),
            Value::map(vec![]),
            Value::map(vec![("k".to_string(), Value::Null)]),
        ];
        for (i, a) in ladder.iter().enumerate() {
            for (j, b) in ladder.iter().enumerate() {
                let ta = encode_key(a).unwrap();
                let tb = encode_key(b).unwrap();
                assert_eq!(ta.cmp(&tb), i.cmp(&j), "{a:?} vs {b:?}");
                assert_eq!(a.cmp_collated(b), i.cmp(&j), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn sorting_tokens_sorts_keys() {
        let mut tokens: Vec<CollatedKey> = [
            Value::from("b"),
            Value::from(23.0),
            Value::from(12.0),
            Value::Bool(true),
            Value::Array(vec![Value::from(1)]),
        ]
        .iter()
        .map(|v| encode_key(v).unwrap())
        .collect();
        tokens.sort();
        let decoded: Vec<Value> = tokens
            .iter()
            .map(|t| decode_key(t.as_bytes()).unwrap())
            .collect();
        assert_eq!(
            decoded,
            vec![
                Value::Bool(true),
                Value::from(12.0),
                Value::from(23.0),
                Value::from("b"),
                Value::Array(vec![Value::from(1)]),
            ]
        );
    }
}
