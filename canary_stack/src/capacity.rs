//! Growth and shrink arithmetic, and the guarded slot buffer it resizes.
//!
//! Buffer layout: [left canary][payload slots][right canary]
//! The canary sections are `guard` bytes wide each (zero when the stack is
//! unguarded). Slots and canaries are stored little-endian so that the data
//! checksum is identical on every platform.

use crate::error::StackError;
use crate::sentinel::{Canary, Elem, CANARY_BYTES, CANARY_LIVE, ELEM_BYTES, ELEM_POISON};

/// Capacity is multiplied by this on growth and divided by it on shrink.
pub const GROWTH_FACTOR: usize = 2;

/// Growth is anticipatory: it fires when the next push would fill the buffer.
#[must_use]
pub fn needs_growth(size: usize, capacity: usize) -> bool {
    size.checked_add(1) == Some(capacity)
}

/// Evaluated on the pre-pop size against the pre-shrink capacity.
#[must_use]
pub fn needs_shrink(size: usize, capacity: usize) -> bool {
    size <= capacity / (2 * GROWTH_FACTOR)
}

/// Returns `None` if the grown capacity does not fit in `usize`.
#[must_use]
pub fn grown(capacity: usize) -> Option<usize> {
    capacity.checked_mul(GROWTH_FACTOR)
}

#[must_use]
pub fn shrunk(capacity: usize) -> usize {
    (capacity / GROWTH_FACTOR).max(1)
}

/// A single allocation holding every slot plus the two data canaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    guard: usize,
}

impl SlotBuffer {
    /// Allocates `capacity` poisoned slots framed by `guard` canary bytes on
    /// each side.
    ///
    /// # Errors
    ///
    /// Returns `StackError::AllocationFailure` if the byte size overflows or
    /// the allocator refuses the request.
    pub fn allocate(capacity: usize, guard: usize) -> Result<Self, StackError> {
        let failure = StackError::AllocationFailure { capacity };
        let length = capacity
            .checked_mul(ELEM_BYTES)
            .and_then(|payload| payload.checked_add(2 * guard))
            .ok_or_else(|| failure.clone())?;

        let mut bytes = Vec::new();
        bytes.try_reserve_exact(length).map_err(|_| failure)?;
        bytes.resize(length, 0);

        let mut buffer = Self {
            bytes,
            capacity,
            guard,
        };
        buffer.poison_from(0);
        buffer.set_left_canary(CANARY_LIVE);
        buffer.set_right_canary(CANARY_LIVE);
        Ok(buffer)
    }

    /// Allocates a buffer of `new_capacity` slots and copies the first `keep`
    /// elements into it. Everything past `keep` is poison.
    ///
    /// `self` is left untouched, so a failed allocation leaves the caller with
    /// its old, still valid, buffer.
    ///
    /// # Errors
    ///
    /// Same as [`SlotBuffer::allocate`].
    pub fn resized(&self, new_capacity: usize, keep: usize) -> Result<Self, StackError> {
        let mut next = Self::allocate(new_capacity, self.guard)?;
        let keep = keep.min(self.capacity).min(new_capacity);
        let end = keep * ELEM_BYTES;
        next.payload_mut()[..end].copy_from_slice(&self.payload()[..end]);
        Ok(next)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_guarded(&self) -> bool {
        self.guard >= CANARY_BYTES
    }

    /// Raw bytes of the whole allocation, canaries included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn payload(&self) -> &[u8] {
        &self.bytes[self.guard..self.bytes.len() - self.guard]
    }

    fn payload_mut(&mut self) -> &mut [u8] {
        let end = self.bytes.len() - self.guard;
        &mut self.bytes[self.guard..end]
    }

    /// Reads the slot at `index`, poison included.
    ///
    /// Returns `None` if `index` is not below the capacity.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn get(&self, index: usize) -> Option<Elem> {
        if index >= self.capacity {
            return None;
        }
        let start = index * ELEM_BYTES;
        let window = &self.payload()[start..start + ELEM_BYTES];
        Some(Elem::from_le_bytes(
            window.try_into().expect("Window is one element wide"),
        ))
    }

    /// Stores `value` at `index` and returns what the slot held before.
    ///
    /// Returns `None`, writing nothing, if `index` is not below the capacity.
    pub fn replace(&mut self, index: usize, value: Elem) -> Option<Elem> {
        let previous = self.get(index)?;
        let start = index * ELEM_BYTES;
        self.payload_mut()[start..start + ELEM_BYTES].copy_from_slice(&value.to_le_bytes());
        Some(previous)
    }

    /// Fills every slot from `start` to the end with poison.
    pub fn poison_from(&mut self, start: usize) {
        let from = start.min(self.capacity) * ELEM_BYTES;
        for window in self.payload_mut()[from..].chunks_exact_mut(ELEM_BYTES) {
            window.copy_from_slice(&ELEM_POISON.to_le_bytes());
        }
    }

    /// Iterates over every slot, poison included.
    pub fn slots(&self) -> impl Iterator<Item = Elem> + '_ {
        (0..self.capacity).filter_map(move |index| self.get(index))
    }

    #[must_use]
    pub fn left_canary(&self) -> Option<Canary> {
        self.canary_at(0)
    }

    #[must_use]
    pub fn right_canary(&self) -> Option<Canary> {
        self.canary_at(self.bytes.len() - self.guard)
    }

    pub(crate) fn set_left_canary(&mut self, value: Canary) {
        self.write_canary(0, value);
    }

    pub(crate) fn set_right_canary(&mut self, value: Canary) {
        let offset = self.bytes.len() - self.guard;
        self.write_canary(offset, value);
    }

    #[allow(clippy::expect_used)]
    fn canary_at(&self, offset: usize) -> Option<Canary> {
        if !self.is_guarded() {
            return None;
        }
        let window = &self.bytes[offset..offset + CANARY_BYTES];
        Some(Canary::from_le_bytes(
            window.try_into().expect("Window is one canary wide"),
        ))
    }

    fn write_canary(&mut self, offset: usize, value: Canary) {
        if self.is_guarded() {
            self.bytes[offset..offset + CANARY_BYTES].copy_from_slice(&value.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_is_anticipatory() {
        assert!(needs_growth(0, 1));
        assert!(needs_growth(3, 4));
        assert!(!needs_growth(2, 4));
        assert!(!needs_growth(usize::MAX, usize::MAX));
        assert_eq!(grown(4), Some(8));
        assert_eq!(grown(usize::MAX), None);
    }

    #[test]
    fn test_shrink_threshold_is_a_quarter() {
        assert!(needs_shrink(2, 8));
        assert!(!needs_shrink(3, 8));
        assert!(!needs_shrink(1, 2));
        assert_eq!(shrunk(8), 4);
        assert_eq!(shrunk(1), 1);
    }

    #[test]
    fn test_shrink_keeps_room_for_the_top_element() {
        for capacity in 1..256 {
            for size in 1..capacity {
                if needs_shrink(size, capacity) {
                    assert!(size < shrunk(capacity), "size {size}, capacity {capacity}");
                }
            }
        }
    }

    #[test]
    fn test_allocate_poisons_and_guards() {
        let buffer = SlotBuffer::allocate(3, CANARY_BYTES).unwrap();
        assert_eq!(buffer.capacity(), 3);
        assert_eq!(buffer.as_bytes().len(), 3 * ELEM_BYTES + 2 * CANARY_BYTES);
        assert!(buffer.slots().all(|slot| slot == ELEM_POISON));
        assert_eq!(buffer.left_canary(), Some(CANARY_LIVE));
        assert_eq!(buffer.right_canary(), Some(CANARY_LIVE));
    }

    #[test]
    fn test_unguarded_buffer_has_no_canaries() {
        let buffer = SlotBuffer::allocate(2, 0).unwrap();
        assert_eq!(buffer.as_bytes().len(), 2 * ELEM_BYTES);
        assert_eq!(buffer.left_canary(), None);
        assert_eq!(buffer.right_canary(), None);
    }

    #[test]
    fn test_replace_returns_previous_value() {
        let mut buffer = SlotBuffer::allocate(2, CANARY_BYTES).unwrap();
        assert_eq!(buffer.replace(1, -7), Some(ELEM_POISON));
        assert_eq!(buffer.replace(1, 8), Some(-7));
        assert_eq!(buffer.get(1), Some(8));
        assert_eq!(buffer.replace(2, 1), None);
        assert_eq!(buffer.right_canary(), Some(CANARY_LIVE));
    }

    #[test]
    fn test_resize_preserves_prefix_and_poisons_the_rest() {
        let mut buffer = SlotBuffer::allocate(4, CANARY_BYTES).unwrap();
        for (i, value) in [10, 20, 30].into_iter().enumerate() {
            buffer.replace(i, value);
        }

        let grown = buffer.resized(8, 3).unwrap();
        let slots: Vec<Elem> = grown.slots().collect();
        assert_eq!(&slots[..3], &[10, 20, 30]);
        assert!(slots[3..].iter().all(|&slot| slot == ELEM_POISON));
        assert_eq!(grown.right_canary(), Some(CANARY_LIVE));

        let shrunk = grown.resized(2, 1).unwrap();
        assert_eq!(shrunk.slots().collect::<Vec<_>>(), vec![10, ELEM_POISON]);
    }

    #[test]
    fn test_absurd_capacity_fails_allocation() {
        assert_eq!(
            SlotBuffer::allocate(usize::MAX / 2, CANARY_BYTES).unwrap_err(),
            StackError::AllocationFailure {
                capacity: usize::MAX / 2
            }
        );
    }
}
