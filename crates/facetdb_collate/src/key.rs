//! Byte-comparable encoded key.

/// An encoded collation token.
///
/// `CollatedKey` wraps the byte form produced by [`encode_key`]
/// (crate-level). Its `Ord` is plain byte comparison, which by the
/// collation contract equals the canonical order of the original keys.
///
/// [`encode_key`]: crate::encode_key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollatedKey(Vec<u8>);

impl CollatedKey {
    /// Wrap raw token bytes.
    ///
    /// The bytes are not validated here; [`decode_key`] rejects foreign
    /// input when the token is read back.
    ///
    /// [`decode_key`]: crate::decode_key
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The token bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the token, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CollatedKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_bytes() {
        let a = CollatedKey::from_bytes(vec![0x01]);
        let b = CollatedKey::from_bytes(vec![0x01, 0x00]);
        let c = CollatedKey::from_bytes(vec![0x02]);
        assert!(a < b);
        assert!(b < c);
    }
}
