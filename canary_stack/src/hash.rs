//! Rolling checksum used to detect silent corruption of the stack.
//!
//! The algorithm is the classic multiply-by-33-and-add accumulator seeded with
//! 5381. It is deterministic and cheap, and it is not meant to resist an
//! adversary.

/// Width of every checksum the stack stores.
pub type Checksum = u64;

/// Initial accumulator value.
pub const HASH_SEED: Checksum = 5381;

/// Computes the checksum of a byte range.
#[must_use]
pub fn checksum(bytes: &[u8]) -> Checksum {
    Hasher::new().update(bytes).finish()
}

/// Incremental form of [`checksum`], for hashing several fields without
/// concatenating them first.
///
/// Feeding the same bytes in any split yields the same result as a single
/// call to [`checksum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hasher {
    state: Checksum,
}

impl Hasher {
    #[must_use]
    pub const fn new() -> Self {
        Self { state: HASH_SEED }
    }

    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        self.state = bytes.iter().fold(self.state, |acc, &byte| {
            acc.wrapping_mul(33).wrapping_add(Checksum::from(byte))
        });
        self
    }

    #[must_use]
    pub fn finish(&self) -> Checksum {
        self.state
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_seed() {
        assert_eq!(checksum(&[]), HASH_SEED);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(checksum(b"a"), 5381 * 33 + 97);
        assert_eq!(checksum(b"ab"), (5381 * 33 + 97) * 33 + 98);
    }

    #[test]
    fn test_high_bytes_are_unsigned() {
        assert_eq!(checksum(&[0xFF]), 5381 * 33 + 255);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = b"left canary|payload|right canary";
        let mut hasher = Hasher::new();
        hasher.update(&data[..5]).update(&data[5..17]).update(&data[17..]);
        assert_eq!(hasher.finish(), checksum(data));
    }

    #[test]
    fn test_single_bit_flip_changes_checksum() {
        let original = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut flipped = original;
        flipped[3] ^= 0b0000_0100;
        assert_ne!(checksum(&original), checksum(&flipped));
    }

    #[test]
    fn test_long_input_wraps_without_panicking() {
        let data = vec![0xABu8; 64 * 1024];
        assert_eq!(checksum(&data), checksum(&data));
    }
}
