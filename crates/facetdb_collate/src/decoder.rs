//! Collation token decoder.

use crate::encoder::{tags, ESCAPED_NUL};
use crate::error::{CollateError, CollateResult};
use crate::value::Value;

/// Decode a collation token back into its structured key.
///
/// This is the strict inverse of [`encode_key`] on tokens the encoder
/// produced: `decode_key(encode_key(k)) == k` for every encodable `k`.
///
/// # Errors
///
/// Returns a malformed-token error on foreign input: an unknown tag,
/// truncated payload, invalid escape, non-UTF-8 text, a NaN number
/// payload, or trailing bytes after the top-level value.
///
/// [`encode_key`]: crate::encode_key
pub fn decode_key(token: &[u8]) -> CollateResult<Value> {
    let mut decoder = CollationDecoder::new(token);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CollateError::TrailingBytes {
            count: decoder.remaining().len(),
        });
    }
    Ok(value)
}

/// A cursor-based collation decoder.
pub struct CollationDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CollationDecoder<'a> {
    /// Create a new decoder over the given token bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> CollateResult<Value> {
        let tag = self.read_byte()?;
        match tag {
            tags::NULL => Ok(Value::Null),
            tags::FALSE => Ok(Value::Bool(false)),
            tags::TRUE => Ok(Value::Bool(true)),
            tags::NUMBER => self.decode_number(),
            tags::TEXT => self.decode_text().map(Value::Text),
            tags::ARRAY => self.decode_array(),
            tags::MAP => self.decode_map(),
            other => Err(CollateError::UnknownTag { tag: other }),
        }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get the remaining unconsumed bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    #[inline]
    fn read_byte(&mut self) -> CollateResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CollateError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn peek_byte(&self) -> CollateResult<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(CollateError::UnexpectedEof)
    }

    fn decode_number(&mut self) -> CollateResult<Value> {
        if self.pos + 8 > self.data.len() {
            return Err(CollateError::UnexpectedEof);
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 8]);
        self.pos += 8;

        // Inverse of the total-order transform.
        let transformed = u64::from_be_bytes(bytes);
        let bits = if transformed & (1 << 63) != 0 {
            transformed ^ (1 << 63)
        } else {
            !transformed
        };
        let n = f64::from_bits(bits);
        if n.is_nan() {
            return Err(CollateError::MalformedNumber);
        }
        Ok(Value::Number(n))
    }

    fn decode_text(&mut self) -> CollateResult<String> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.read_byte()?;
            if byte != 0x00 {
                bytes.push(byte);
                continue;
            }
            // 0x00 is either the terminator or an escape introducer.
            match self.peek_byte() {
                Ok(ESCAPED_NUL) => {
                    self.pos += 1;
                    bytes.push(0x00);
                }
                _ => break,
            }
        }
        String::from_utf8(bytes).map_err(|_| CollateError::InvalidUtf8)
    }

    fn decode_array(&mut self) -> CollateResult<Value> {
        let mut items = Vec::new();
        while self.peek_byte()? != tags::TERMINATOR {
            items.push(self.decode()?);
        }
        self.pos += 1;
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self) -> CollateResult<Value> {
        let mut pairs: Vec<(String, Value)> = Vec::new();
        while self.peek_byte()? != tags::TERMINATOR {
            let key_tag = self.read_byte()?;
            if key_tag != tags::TEXT {
                return Err(CollateError::UnknownTag { tag: key_tag });
            }
            let key = self.decode_text()?;
            // The encoder emits entries in strictly ascending key order;
            // anything else is a foreign token, and accepting it would
            // yield a map whose re-encoding disagrees with the token.
            if let Some((prev, _)) = pairs.last() {
                if *prev >= key {
                    return Err(CollateError::UnsortedMapKeys);
                }
            }
            let value = self.decode()?;
            pairs.push((key, value));
        }
        self.pos += 1;
        Ok(Value::Map(pairs))
    }
}
