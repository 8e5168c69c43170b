//! Order-preserving key encoder.

use crate::error::{CollateError, CollateResult};
use crate::key::CollatedKey;
use crate::value::Value;

/// Type tags for the collation encoding.
///
/// Tag bytes define the cross-type sort order; the gaps between values
/// leave room for future types without reshuffling. The terminator byte
/// `0x00` is below every tag so a composite that is a strict prefix of
/// another sorts first.
pub mod tags {
    /// End of an array or map.
    pub const TERMINATOR: u8 = 0x00;
    /// Null sorts first among values.
    pub const NULL: u8 = 0x05;
    /// Boolean false.
    pub const FALSE: u8 = 0x09;
    /// Boolean true.
    pub const TRUE: u8 = 0x0a;
    /// Number (8-byte total-order transform).
    pub const NUMBER: u8 = 0x15;
    /// Text string (escaped, terminator-framed).
    pub const TEXT: u8 = 0x21;
    /// Array of values.
    pub const ARRAY: u8 = 0x31;
    /// Map with string keys.
    pub const MAP: u8 = 0x41;
}

/// Escape marker: a payload `0x00` becomes `0x00 0xff`.
///
/// `0xff` is above every tag byte, so a string with an embedded NUL
/// sorts after the same string followed by any further element, which
/// matches code-point order.
pub(crate) const ESCAPED_NUL: u8 = 0xff;

/// Encode a key into its byte-comparable collation token.
///
/// For any two encodable keys `a` and `b`, `a` precedes `b` under the
/// canonical order if and only if `encode_key(a) < encode_key(b)` by
/// byte comparison. Equal keys encode identically.
///
/// # Errors
///
/// Returns [`CollateError::UnsupportedKey`] if the key contains a NaN
/// number.
pub fn encode_key(key: &Value) -> CollateResult<CollatedKey> {
    let mut encoder = CollationEncoder::new();
    encoder.encode(key)?;
    Ok(encoder.into_key())
}

/// An incremental collation encoder.
pub struct CollationEncoder {
    buffer: Vec<u8>,
}

impl CollationEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value, appending its token bytes to the buffer.
    pub fn encode(&mut self, value: &Value) -> CollateResult<()> {
        match value {
            Value::Null => {
                self.buffer.push(tags::NULL);
                Ok(())
            }
            Value::Bool(b) => {
                self.buffer.push(if *b { tags::TRUE } else { tags::FALSE });
                Ok(())
            }
            Value::Number(n) => self.encode_number(*n),
            Value::Text(s) => {
                self.buffer.push(tags::TEXT);
                self.encode_text_payload(s);
                Ok(())
            }
            Value::Array(items) => {
                self.buffer.push(tags::ARRAY);
                for item in items {
                    self.encode(item)?;
                }
                self.buffer.push(tags::TERMINATOR);
                Ok(())
            }
            Value::Map(pairs) => self.encode_map(pairs),
        }
    }

    /// Consume this encoder and return the encoded key.
    pub fn into_key(self) -> CollatedKey {
        CollatedKey::from_bytes(self.buffer)
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn encode_number(&mut self, n: f64) -> CollateResult<()> {
        if n.is_nan() {
            return Err(CollateError::unsupported_key("NaN has no collation order"));
        }
        // IEEE-754 total-order transform: non-negative floats get the
        // sign bit flipped, negative floats get every bit flipped. The
        // resulting big-endian bytes compare in numeric order across
        // sign and magnitude.
        let bits = Value::normalize(n).to_bits();
        let transformed = if bits & (1 << 63) == 0 {
            bits ^ (1 << 63)
        } else {
            !bits
        };
        self.buffer.push(tags::NUMBER);
        self.buffer.extend_from_slice(&transformed.to_be_bytes());
        Ok(())
    }

    fn encode_text_payload(&mut self, s: &str) {
        for &byte in s.as_bytes() {
            if byte == 0x00 {
                self.buffer.push(0x00);
                self.buffer.push(ESCAPED_NUL);
            } else {
                self.buffer.push(byte);
            }
        }
        self.buffer.push(tags::TERMINATOR);
    }

    fn encode_map(&mut self, pairs: &[(String, Value)]) -> CollateResult<()> {
        self.buffer.push(tags::MAP);
        // Entries are encoded in sorted key order regardless of how the
        // map was built, so equal maps always produce identical tokens.
        let mut sorted: Vec<&(String, Value)> = pairs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in sorted {
            self.buffer.push(tags::TEXT);
            self.encode_text_payload(key);
            self.encode(value)?;
        }
        self.buffer.push(tags::TERMINATOR);
        Ok(())
    }
}

impl Default for CollationEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(v: &Value) -> CollatedKey {
        encode_key(v).unwrap()
    }

    #[test]
    fn equal_keys_encode_identically() {
        let a = Value::map(vec![
            ("x".to_string(), Value::from(1)),
            ("y".to_string(), Value::from(2)),
        ]);
        let b = Value::map(vec![
            ("y".to_string(), Value::from(2)),
            ("x".to_string(), Value::from(1)),
        ]);
        assert_eq!(enc(&a), enc(&b));
    }

    #[test]
    fn negative_zero_encodes_as_zero() {
        assert_eq!(enc(&Value::Number(-0.0)), enc(&Value::Number(0.0)));
    }

    #[test]
    fn nan_is_rejected() {
        let err = encode_key(&Value::Number(f64::NAN)).unwrap_err();
        assert!(matches!(err, CollateError::UnsupportedKey { .. }));
        assert!(!err.is_malformed_token());
    }

    #[test]
    fn nan_inside_composite_is_rejected() {
        let key = Value::Array(vec![Value::from(1), Value::Number(f64::NAN)]);
        assert!(encode_key(&key).is_err());
    }

    #[test]
    fn number_order_survives_sign_and_magnitude() {
        let numbers = [
            f64::NEG_INFINITY,
            -1.0e300,
            -20.0,
            -2.5,
            -1.0,
            -0.001,
            0.0,
            0.001,
            1.0,
            2.5,
            20.0,
            1.0e300,
            f64::INFINITY,
        ];
        for pair in numbers.windows(2) {
            assert!(
                enc(&Value::Number(pair[0])) < enc(&Value::Number(pair[1])),
                "{} should encode below {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn cross_type_order_matches_tags() {
        let order = [
            Value::Null,
            Value::Bool(false),
            Value::Bool(true),
            Value::from(-5),
            Value::from(1_000_000),
            Value::from("zzz"),
            Value::Array(vec![Value::from("a")]),
            Value::map(vec![("a".to_string(), Value::Null)]),
        ];
        for pair in order.windows(2) {
            assert!(enc(&pair[0]) < enc(&pair[1]));
        }
    }

    #[test]
    fn string_prefix_sorts_first() {
        assert!(enc(&Value::from("a")) < enc(&Value::from("aa")));
        assert!(enc(&Value::from("aa")) < enc(&Value::from("ab")));
        assert!(enc(&Value::from("ab")) < enc(&Value::from("b")));
    }

    #[test]
    fn embedded_nul_orders_by_code_point() {
        // '\0' < 'b', and "a" is a strict prefix of "a\0".
        assert!(enc(&Value::from("a")) < enc(&Value::from("a\0")));
        assert!(enc(&Value::from("a\0")) < enc(&Value::from("ab")));
    }

    #[test]
    fn array_prefix_sorts_first() {
        let a = Value::Array(vec![Value::from("x")]);
        let b = Value::Array(vec![Value::from("x"), Value::Null]);
        assert!(enc(&a) < enc(&b));
        // An element of an array still beats a longer first element.
        let c = Value::Array(vec![Value::from("xx")]);
        assert!(enc(&b) < enc(&c));
    }

    #[test]
    fn map_entries_compare_key_then_value() {
        let a = Value::map(vec![("a".to_string(), Value::from(1))]);
        let b = Value::map(vec![("a".to_string(), Value::from(2))]);
        let c = Value::map(vec![("b".to_string(), Value::from(0))]);
        assert!(enc(&a) < enc(&b));
        assert!(enc(&b) < enc(&c));
    }
}
