//! Compile-time choice between a guarded and an unguarded stack.

use core::fmt::Debug;

use crate::capacity::SlotBuffer;
use crate::faults::Faults;
use crate::hash::{checksum, Checksum};
use crate::sentinel::{is_live_canary, Canary, CANARY_BYTES, CANARY_DESTROYED, CANARY_LIVE};
use crate::snapshot::{GuardReport, HashPair};
use crate::stack::Header;

/// Integrity protection applied by a [`Stack`](crate::Stack).
///
/// The stack calls [`seal`](Protection::seal) after every mutation and
/// [`check`](Protection::check) on every verification pass.
pub trait Protection: Debug + Default {
    /// Canary bytes reserved on each side of the slot buffer.
    const GUARD_BYTES: usize;

    /// Records checksums of the current header and buffer.
    fn seal(&mut self, header: &Header, buffer: Option<&SlotBuffer>);

    /// Reports every canary or checksum that no longer matches.
    fn check(&self, header: &Header, buffer: Option<&SlotBuffer>) -> Faults;

    /// Marks the header canaries as destroyed.
    fn tombstone(&mut self);

    fn report(&self, header: &Header, buffer: Option<&SlotBuffer>) -> Option<GuardReport>;
}

/// Header and buffer canaries plus checksums over both.
///
/// The two header canaries are ordinary fields and the compiler may place
/// them anywhere in the stack's layout, so they do not bracket the header in
/// memory. They detect tampering through [`Stack::tamper`](crate::Stack) and
/// stray writes into the guard itself; the header checksum covers the rest.
/// The data canaries do frame the slots, inside the buffer allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guarded {
    pub(crate) left_canary: Canary,
    pub(crate) right_canary: Canary,
    pub(crate) struct_hash: Checksum,
    pub(crate) data_hash: Checksum,
}

impl Default for Guarded {
    fn default() -> Self {
        Self {
            left_canary: CANARY_LIVE,
            right_canary: CANARY_LIVE,
            struct_hash: 0,
            data_hash: 0,
        }
    }
}

fn data_checksum(buffer: Option<&SlotBuffer>) -> Checksum {
    buffer.map_or(0, |buffer| checksum(buffer.as_bytes()))
}

impl Protection for Guarded {
    const GUARD_BYTES: usize = CANARY_BYTES;

    fn seal(&mut self, header: &Header, buffer: Option<&SlotBuffer>) {
        self.struct_hash = header.checksum();
        self.data_hash = data_checksum(buffer);
    }

    fn check(&self, header: &Header, buffer: Option<&SlotBuffer>) -> Faults {
        let mut faults = Faults::empty();
        if !is_live_canary(self.left_canary) {
            faults |= Faults::LEFT_STRUCT_CANARY;
        }
        if !is_live_canary(self.right_canary) {
            faults |= Faults::RIGHT_STRUCT_CANARY;
        }
        if header.checksum() != self.struct_hash {
            faults |= Faults::STRUCT_HASH;
        }

        if let Some(buffer) = buffer {
            if !buffer.left_canary().is_some_and(is_live_canary) {
                faults |= Faults::LEFT_DATA_CANARY;
            }
            if !buffer.right_canary().is_some_and(is_live_canary) {
                faults |= Faults::RIGHT_DATA_CANARY;
            }
            if checksum(buffer.as_bytes()) != self.data_hash {
                faults |= Faults::DATA_HASH;
            }
        }
        faults
    }

    fn tombstone(&mut self) {
        self.left_canary = CANARY_DESTROYED;
        self.right_canary = CANARY_DESTROYED;
    }

    fn report(&self, header: &Header, buffer: Option<&SlotBuffer>) -> Option<GuardReport> {
        let data_canaries =
            buffer.and_then(|buffer| Some([buffer.left_canary()?, buffer.right_canary()?]));
        Some(GuardReport {
            struct_canaries: [self.left_canary, self.right_canary],
            data_canaries,
            struct_hash: HashPair {
                stored: self.struct_hash,
                computed: header.checksum(),
            },
            data_hash: buffer.map(|buffer| HashPair {
                stored: self.data_hash,
                computed: checksum(buffer.as_bytes()),
            }),
        })
    }
}

/// No canaries and no checksums; only the structural checks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unguarded;

impl Protection for Unguarded {
    const GUARD_BYTES: usize = 0;

    fn seal(&mut self, _header: &Header, _buffer: Option<&SlotBuffer>) {}

    fn check(&self, _header: &Header, _buffer: Option<&SlotBuffer>) -> Faults {
        Faults::empty()
    }

    fn tombstone(&mut self) {}

    fn report(&self, _header: &Header, _buffer: Option<&SlotBuffer>) -> Option<GuardReport> {
        None
    }
}
