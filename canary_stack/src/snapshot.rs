//! Plain-data picture of a stack, handed to whatever renders diagnostics.

use crate::faults::Faults;
use crate::hash::Checksum;
use crate::provenance::Provenance;
use crate::sentinel::{is_poison, Canary, Elem};
use crate::stack::StackState;

/// One slot of the buffer as seen by a diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Value(Elem),
    Poison,
}

impl Slot {
    #[must_use]
    pub const fn of(value: Elem) -> Self {
        if is_poison(value) {
            Self::Poison
        } else {
            Self::Value(value)
        }
    }

    #[must_use]
    pub const fn value(self) -> Option<Elem> {
        match self {
            Self::Value(value) => Some(value),
            Self::Poison => None,
        }
    }
}

/// A checksum as stored in the stack next to the value recomputed now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashPair {
    pub stored: Checksum,
    pub computed: Checksum,
}

impl HashPair {
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.stored == self.computed
    }
}

/// Protection state of a guarded stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardReport {
    /// Left and right header canaries
    pub struct_canaries: [Canary; 2],
    /// Left and right buffer canaries, absent once the buffer is gone
    pub data_canaries: Option<[Canary; 2]>,
    pub struct_hash: HashPair,
    /// Absent once the buffer is gone
    pub data_hash: Option<HashPair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: StackState,
    pub size: usize,
    pub capacity: usize,
    /// Every slot of the buffer; empty if the buffer is gone
    pub slots: Vec<Slot>,
    /// `None` for unguarded stacks
    pub guards: Option<GuardReport>,
    pub provenance: Provenance,
    /// Result of the most recent verification pass
    pub faults: Faults,
}

impl Snapshot {
    /// Slots below `size`, clamped to what the buffer actually holds.
    #[must_use]
    pub fn live_slots(&self) -> &[Slot] {
        &self.slots[..self.size.min(self.slots.len())]
    }
}
