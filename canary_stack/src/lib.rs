//! `canary_stack`: a growable stack that checks its own integrity.
//!
//! Every `Stack` verifies itself after each operation and accumulates what it
//! finds in a [`Faults`] bitset instead of stopping at the first problem.
//! With the default [`Guarded`] protection it also carries:
//!
//! - two canaries around the header and two around the slot buffer
//! - a checksum over the header fields and one over the whole buffer
//! - the [`Provenance`] of the stack, for diagnostics
//!
//! Buffer layout: [left canary][slots][right canary], a single allocation.
//! Unused slots always hold [`ELEM_POISON`].
//!
//! # Capacity Policy
//!
//! - Growth is anticipatory: when `size + 1 == capacity` the capacity doubles
//!   before the push writes, so `size < capacity` always holds.
//! - A pop first checks `size <= capacity / 4` on the pre-pop size; if so the
//!   capacity halves before the element is removed.
//! - Newly exposed slots are poisoned and the canaries rewritten after every
//!   resize.
//!
//! # Stack Interface
//!
//! ```
//! use canary_stack::{provenance, Stack};
//!
//! let mut stack: Stack = Stack::new(1, provenance!(stack)).unwrap();
//!
//! stack.push(13).unwrap();
//! stack.push(13).unwrap();
//! assert_eq!(stack.pop(), Ok(13));
//!
//! assert_eq!(stack.len(), 1);
//! assert!(stack.capacity() >= 2);
//! assert!(stack.verify().is_empty());
//! ```
//!
//! # Fault Reporting
//!
//! Operations return `StackError`; the flags behind an error are available
//! through [`StackError::faults`], and the last verification result through
//! [`Stack::faults`]. Callers that prefer a sentinel value on failure
//! can use [`Stack::pop_or_poison`]:
//!
//! ```
//! use canary_stack::{provenance, Faults, Stack, ELEM_POISON};
//!
//! let mut stack: Stack = Stack::new(3, provenance!(stack)).unwrap();
//! let (value, faults) = stack.pop_or_poison();
//!
//! assert_eq!(value, ELEM_POISON);
//! assert!(faults.contains(Faults::EMPTY_STACK));
//! assert_eq!(stack.len(), 0);
//! ```
//!
//! # Teardown
//!
//! [`Stack::destroy`] frees the buffer and overwrites `size`, `capacity`,
//! provenance and the header canaries with tombstone values. A destroyed
//! stack rejects every mutation, and a second `destroy` is reported as
//! `StackError::MissingBuffer` instead of freeing twice.
//!
//! ```
//! use canary_stack::{provenance, Stack, StackError};
//!
//! let mut stack: Stack = Stack::new(2, provenance!(stack)).unwrap();
//! stack.destroy().unwrap();
//!
//! assert_eq!(stack.push(1), Err(StackError::Destroyed { operation: "push" }));
//! assert_eq!(stack.destroy(), Err(StackError::MissingBuffer));
//! ```
//!
//! # Protection Levels
//!
//! The protection level is a type parameter, so an [`Unguarded`] stack pays
//! nothing for canaries or checksums:
//!
//! ```
//! use canary_stack::{provenance, Stack, Unguarded};
//!
//! let mut fast: Stack<Unguarded> = Stack::new(4, provenance!(fast)).unwrap();
//! fast.push(1).unwrap();
//! assert!(fast.snapshot().guards.is_none());
//! ```
//!
//! Enable the `fault-injection` feature for `Stack::tamper`, which corrupts a
//! stack on purpose so that every verification path can be exercised.

mod capacity;
mod error;
mod faults;
mod hash;
mod iter;
mod protection;
mod provenance;
mod sentinel;
mod snapshot;
mod stack;
#[cfg(any(test, feature = "fault-injection"))]
mod tamper;

pub use capacity::{grown, needs_growth, needs_shrink, shrunk, SlotBuffer, GROWTH_FACTOR};
pub use error::StackError;
pub use faults::Faults;
pub use hash::{checksum, Checksum, Hasher, HASH_SEED};
pub use iter::StackIter;
pub use protection::{Guarded, Protection, Unguarded};
pub use provenance::Provenance;
pub use sentinel::{
    is_destroyed_canary, is_live_canary, is_poison, Canary, CanaryState, Elem, CANARY_DESTROYED,
    CANARY_LIVE, CAPACITY_POISON, ELEM_POISON, SIZE_POISON,
};
pub use snapshot::{GuardReport, HashPair, Slot, Snapshot};
pub use stack::{verify_maybe, Header, Stack, StackState, DEFAULT_CAPACITY};
#[cfg(any(test, feature = "fault-injection"))]
pub use tamper::Tamper;
