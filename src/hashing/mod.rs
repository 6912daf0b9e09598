//! Cache key derivation.
//!
//! A [`CacheKey`] is the full 32-byte BLAKE3 digest of a (chunk, criterion, model)
//! triple. A key match is treated as an exact match.
//!
//! Every field is length-prefixed before it is fed to the hasher. Plain
//! separators would let `("a:b", "c")` and `("a", "b:c")` serialize identically.

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::transcript::Chunk;

/// Deterministic digest identifying a (chunk, criterion, model) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derives the key for scoring `chunk` against `criterion` with `model`.
    pub fn derive(chunk: &Chunk, criterion: &str, model: &str) -> Self {
        let mut hasher = Hasher::new();

        update_len(&mut hasher, chunk.len());
        for message in chunk.messages() {
            update_field(&mut hasher, message.speaker.as_bytes());
            update_field(&mut hasher, message.text.as_bytes());
        }
        update_field(&mut hasher, criterion.as_bytes());
        update_field(&mut hasher, model.as_bytes());

        Self(*hasher.finalize().as_bytes())
    }

    /// Wraps a precomputed digest.
    #[inline]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the lowercase hex form of the digest.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[inline]
fn update_len(hasher: &mut Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

#[inline]
fn update_field(hasher: &mut Hasher, bytes: &[u8]) {
    update_len(hasher, bytes.len());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Message;
    use std::collections::HashSet;

    fn chunk(pairs: &[(&str, &str)]) -> Chunk {
        Chunk::new(
            0,
            pairs
                .iter()
                .map(|(speaker, text)| Message::new(*speaker, *text))
                .collect(),
        )
    }

    #[test]
    fn test_derive_determinism() {
        let c = chunk(&[("alice", "hello"), ("bob", "hi there")]);

        let key1 = CacheKey::derive(&c, "greetings", "model-a");
        let key2 = CacheKey::derive(&c, "greetings", "model-a");
        let key3 = CacheKey::derive(&c.clone(), "greetings", "model-a");

        assert_eq!(key1, key2);
        assert_eq!(key2, key3);
    }

    #[test]
    fn test_derive_sensitivity() {
        let base_chunk = chunk(&[("alice", "hello"), ("bob", "hi there")]);
        let base = CacheKey::derive(&base_chunk, "greetings", "model-a");

        let changed_text = chunk(&[("alice", "hello"), ("bob", "hi there!")]);
        let changed_speaker = chunk(&[("alice", "hello"), ("carol", "hi there")]);
        let reordered = chunk(&[("bob", "hi there"), ("alice", "hello")]);

        let keys = [
            base,
            CacheKey::derive(&changed_text, "greetings", "model-a"),
            CacheKey::derive(&changed_speaker, "greetings", "model-a"),
            CacheKey::derive(&reordered, "greetings", "model-a"),
            CacheKey::derive(&base_chunk, "farewells", "model-a"),
            CacheKey::derive(&base_chunk, "greetings", "model-b"),
        ];
        let unique: HashSet<_> = keys.iter().collect();

        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_derive_ignores_position_and_timestamp() {
        let a = Chunk::new(0, vec![Message::new("alice", "hello")]);
        let b = Chunk::new(
            50,
            vec![Message::new("alice", "hello").with_timestamp("2024-01-01 10:00")],
        );

        assert_eq!(
            CacheKey::derive(&a, "criterion", "m"),
            CacheKey::derive(&b, "criterion", "m")
        );
    }

    #[test]
    fn test_length_prefix_prevents_boundary_shift() {
        let a = chunk(&[("a:b", "c")]);
        let b = chunk(&[("a", "b:c")]);
        assert_ne!(
            CacheKey::derive(&a, "x", "m"),
            CacheKey::derive(&b, "x", "m")
        );

        let c = chunk(&[("a", "b")]);
        assert_ne!(
            CacheKey::derive(&c, "xy", "z"),
            CacheKey::derive(&c, "x", "yz")
        );
    }

    #[test]
    fn test_empty_chunk_has_nonzero_key() {
        let key = CacheKey::derive(&Chunk::new(0, vec![]), "", "");
        assert!(!key.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_hex_display() {
        let key = CacheKey::derive(&chunk(&[("a", "b")]), "c", "d");
        let hex = key.to_string();

        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(CacheKey::from_bytes(*key.as_bytes()), key);
    }
}
