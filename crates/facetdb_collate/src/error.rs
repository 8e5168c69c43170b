//! Error types for the collation crate.

use thiserror::Error;

/// Result type for collation operations.
pub type CollateResult<T> = Result<T, CollateError>;

/// Errors that can occur while encoding or decoding collation tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollateError {
    /// The key contains a value that has no position in the collation
    /// order (currently only NaN numbers).
    #[error("key is not collatable: {message}")]
    UnsupportedKey {
        /// Description of the offending value.
        message: String,
    },

    /// The token ended before a complete value was read.
    #[error("unexpected end of token")]
    UnexpectedEof,

    /// The token starts a value with a byte that is not a known type tag.
    #[error("unknown type tag: 0x{tag:02x}")]
    UnknownTag {
        /// The unrecognized tag byte.
        tag: u8,
    },

    /// A text payload is not valid UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    /// A number payload decodes to a value with no collation position.
    #[error("number payload is not a collatable number")]
    MalformedNumber,

    /// A map payload has keys out of sorted order or duplicated.
    ///
    /// The encoder always emits map entries in strictly ascending key
    /// order, so such a token cannot have been produced by it.
    #[error("map keys are not in strictly ascending order")]
    UnsortedMapKeys,

    /// The token contains bytes after the top-level value.
    #[error("{count} trailing bytes after value")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        count: usize,
    },
}

impl CollateError {
    /// Create an unsupported-key error.
    pub fn unsupported_key(message: impl Into<String>) -> Self {
        Self::UnsupportedKey {
            message: message.into(),
        }
    }

    /// Whether this error describes a token that was not produced by the
    /// encoder (as opposed to a key that cannot be encoded).
    pub fn is_malformed_token(&self) -> bool {
        !matches!(self, Self::UnsupportedKey { .. })
    }
}
