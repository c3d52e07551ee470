use sha2::{Digest, Sha256};

use crate::codec::text;
use crate::core::error::{Error, Result};

/// Key of an inverted index: a fixed-width encoding plus a bucket hash.
/// All-zero encoded bytes are reserved for "empty slot", so no real key may
/// encode to them.
pub trait IndexKey {
    const SIZE: usize;

    fn encode(&self) -> Result<Vec<u8>>;

    fn bucket(&self, buckets: u32) -> u32;
}

/// Numeric ids (document ids, relation sides) hash by plain modulus.
impl IndexKey for u32 {
    const SIZE: usize = 4;

    fn encode(&self) -> Result<Vec<u8>> {
        if *self == 0 {
            return Err(Error::integrity(
                "key 0 collides with the empty slot encoding".to_string(),
            ));
        }
        Ok(self.to_le_bytes().to_vec())
    }

    fn bucket(&self, buckets: u32) -> u32 {
        self % buckets
    }
}

pub const WORD_KEY_LEN: usize = 32;

/// Fixed-width text key for the word-search indexes. Short tokens cluster
/// badly under cheap hashes, so the bucket comes from a Sha256 digest of the
/// stored form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordKey(pub String);

impl WordKey {
    pub fn new(word: impl Into<String>) -> Self {
        WordKey(word.into())
    }

    /// The stored form: truncated to the key width on a char boundary.
    /// Hashing and comparison both use this, so insert and lookup agree.
    fn stored(&self) -> &str {
        text::truncate_to_boundary(&self.0, WORD_KEY_LEN)
    }
}

impl IndexKey for WordKey {
    const SIZE: usize = WORD_KEY_LEN;

    fn encode(&self) -> Result<Vec<u8>> {
        let stored = self.stored();
        if stored.is_empty() {
            return Err(Error::integrity(
                "empty word key collides with the empty slot encoding".to_string(),
            ));
        }
        let mut buf = vec![0u8; WORD_KEY_LEN];
        buf[..stored.len()].copy_from_slice(stored.as_bytes());
        Ok(buf)
    }

    fn bucket(&self, buckets: u32) -> u32 {
        let digest = Sha256::digest(self.stored().as_bytes());
        let word = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        word % buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn zero_id_key_is_rejected() {
        assert_eq!(0u32.encode().unwrap_err().kind, ErrorKind::Integrity);
        assert_eq!(7u32.encode().unwrap(), vec![7, 0, 0, 0]);
    }

    #[test]
    fn id_bucket_is_modulus() {
        assert_eq!(10u32.bucket(8), 2);
        assert_eq!(8u32.bucket(8), 0);
    }

    #[test]
    fn word_key_is_nul_padded() {
        let key = WordKey::new("meeple");
        let bytes = key.encode().unwrap();
        assert_eq!(bytes.len(), WORD_KEY_LEN);
        assert_eq!(&bytes[..6], b"meeple");
        assert!(bytes[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_word_key_is_rejected() {
        assert_eq!(
            WordKey::new("").encode().unwrap_err().kind,
            ErrorKind::Integrity
        );
    }

    #[test]
    fn oversized_words_share_a_stored_form() {
        let long = "w".repeat(WORD_KEY_LEN + 10);
        let exact = "w".repeat(WORD_KEY_LEN);
        let a = WordKey::new(long.clone());
        let b = WordKey::new(exact);
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
        assert_eq!(a.bucket(4096), b.bucket(4096));
    }

    #[test]
    fn word_bucket_is_stable() {
        let key = WordKey::new("strategy");
        assert_eq!(key.bucket(4096), key.bucket(4096));
        assert!(key.bucket(4096) < 4096);
    }
}
