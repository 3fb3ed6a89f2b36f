use tracing::{debug, error, trace, warn};

use crate::capacity::{grown, needs_growth, needs_shrink, shrunk, SlotBuffer};
use crate::error::StackError;
use crate::faults::Faults;
use crate::hash::{Checksum, Hasher};
use crate::iter::StackIter;
use crate::protection::{Guarded, Protection};
use crate::provenance::Provenance;
use crate::sentinel::{is_poison, Elem, CAPACITY_POISON, ELEM_POISON, SIZE_POISON};
use crate::snapshot::{Slot, Snapshot};

/// Capacity used by [`Stack::with_default_capacity`].
pub const DEFAULT_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState {
    Live,
    Destroyed,
}

/// The logical fields covered by the header checksum.
///
/// Canaries, checksums and fault flags are not covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub(crate) size: usize,
    pub(crate) capacity: usize,
    pub(crate) provenance: Provenance,
}

impl Header {
    const TOMBSTONE: Self = Self {
        size: SIZE_POISON,
        capacity: CAPACITY_POISON,
        provenance: Provenance::TOMBSTONE,
    };

    #[must_use]
    pub fn checksum(&self) -> Checksum {
        let mut hasher = Hasher::new();
        hasher
            .update(&(self.size as u64).to_le_bytes())
            .update(&(self.capacity as u64).to_le_bytes());
        self.provenance.hash_into(&mut hasher);
        hasher.finish()
    }
}

/// A growable stack of [`Elem`] that verifies itself after every operation.
///
/// `P` selects the protection level at compile time: [`Guarded`] (the
/// default) adds canaries and checksums, [`Unguarded`](crate::Unguarded)
/// keeps only the structural checks.
#[derive(Debug)]
pub struct Stack<P: Protection = Guarded> {
    header: Header,
    buffer: Option<SlotBuffer>,
    faults: Faults,
    state: StackState,
    pub(crate) guard: P,
    #[cfg(any(test, feature = "fault-injection"))]
    pub(crate) allocation_limit: Option<usize>,
}

impl<P: Protection> Stack<P> {
    /// Creates a stack with room for `capacity` slots and verifies it.
    ///
    /// # Errors
    ///
    /// - `StackError::InvalidCapacity` if `capacity` is 0
    /// - `StackError::AllocationFailure` if the buffer cannot be allocated
    /// - `StackError::Corrupted` if the fresh stack fails verification
    pub fn new(capacity: usize, provenance: Provenance) -> Result<Self, StackError> {
        if capacity == 0 {
            return Err(StackError::InvalidCapacity { capacity });
        }

        let buffer = SlotBuffer::allocate(capacity, P::GUARD_BYTES)?;
        let mut stack = Self {
            header: Header {
                size: 0,
                capacity,
                provenance,
            },
            buffer: Some(buffer),
            faults: Faults::empty(),
            state: StackState::Live,
            guard: P::default(),
            #[cfg(any(test, feature = "fault-injection"))]
            allocation_limit: None,
        };
        stack.seal();
        debug!(stack = provenance.name, capacity, "constructed stack");

        stack.settle()?;
        Ok(stack)
    }

    /// Creates a stack with [`DEFAULT_CAPACITY`] slots.
    ///
    /// # Errors
    ///
    /// Same as [`Stack::new`].
    pub fn with_default_capacity(provenance: Provenance) -> Result<Self, StackError> {
        Self::new(DEFAULT_CAPACITY, provenance)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.header.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.size == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.header.capacity
    }

    /// Flags recorded by the most recent verification pass, plus any
    /// operation-level fault raised since.
    #[must_use]
    pub fn faults(&self) -> Faults {
        self.faults
    }

    #[must_use]
    pub fn state(&self) -> StackState {
        self.state
    }

    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.header.provenance
    }

    /// Returns the live element at `index`, counting from the bottom.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Elem> {
        if index >= self.header.size {
            return None;
        }
        self.buffer.as_ref()?.get(index)
    }

    #[must_use]
    pub fn top(&self) -> Option<Elem> {
        self.get(self.header.size.checked_sub(1)?)
    }

    /// Returns any slot below the buffer capacity, live or poisoned.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.buffer.as_ref()?.get(index).map(Slot::of)
    }

    /// Iterates over live elements from bottom to top.
    #[must_use]
    pub fn iter(&self) -> StackIter<'_> {
        self.into_iter()
    }

    pub(crate) fn live_buffer(&self) -> Option<(&SlotBuffer, usize)> {
        self.buffer.as_ref().map(|buffer| (buffer, self.header.size))
    }

    /// Pushes `value`, growing the buffer first if it is about to fill up.
    ///
    /// A push that succeeds in writing but then fails verification is not
    /// rolled back: the value stays on the stack and `Corrupted` is returned.
    ///
    /// # Errors
    ///
    /// - `StackError::Destroyed` after [`Stack::destroy`]
    /// - `StackError::ReservedValue` if `value` is [`ELEM_POISON`]
    /// - `StackError::Corrupted` if verification fails before or after the write
    /// - `StackError::AllocationFailure` if growth fails; the stack keeps its old buffer
    pub fn push(&mut self, value: Elem) -> Result<(), StackError> {
        self.ensure_live("push")?;
        if is_poison(value) {
            return Err(StackError::ReservedValue { value });
        }
        self.settle()?;

        let Header { size, capacity, .. } = self.header;
        if needs_growth(size, capacity) {
            let Some(target) = grown(capacity) else {
                return Err(self.resize_failed(StackError::AllocationFailure {
                    capacity: usize::MAX,
                }));
            };
            self.resize(target)?;
        }

        let written = self
            .buffer
            .as_mut()
            .and_then(|buffer| buffer.replace(size, value));
        if written.is_none() {
            return Err(StackError::Corrupted {
                faults: self.verify(),
            });
        }
        self.header.size += 1;
        self.seal();
        trace!(stack = self.header.provenance.name, value, size = self.header.size, "push");

        self.settle()
    }

    /// Removes and returns the top element, shrinking the buffer first if it
    /// is at most a quarter full.
    ///
    /// # Errors
    ///
    /// - `StackError::Destroyed` after [`Stack::destroy`]
    /// - `StackError::EmptyStack` if there is nothing to pop; `size` stays 0
    /// - `StackError::Corrupted` if verification fails before or after the read
    /// - `StackError::AllocationFailure` if shrinking fails
    pub fn pop(&mut self) -> Result<Elem, StackError> {
        self.ensure_live("pop")?;
        self.settle()?;

        let Header { size, capacity, .. } = self.header;
        if size == 0 {
            self.faults |= Faults::EMPTY_STACK;
            return Err(StackError::EmptyStack);
        }
        if needs_shrink(size, capacity) {
            self.resize(shrunk(capacity))?;
        }

        let top = size - 1;
        let Some(value) = self
            .buffer
            .as_mut()
            .and_then(|buffer| buffer.replace(top, ELEM_POISON))
        else {
            return Err(StackError::Corrupted {
                faults: self.verify(),
            });
        };
        self.header.size = top;
        self.seal();
        trace!(stack = self.header.provenance.name, value, size = top, "pop");

        self.settle().map(|()| value)
    }

    /// Pops with the poison-as-sentinel calling convention: any failure
    /// yields [`ELEM_POISON`] together with the fault flags.
    pub fn pop_or_poison(&mut self) -> (Elem, Faults) {
        match self.pop() {
            Ok(value) => (value, self.faults),
            Err(err) => (ELEM_POISON, err.faults() | self.faults),
        }
    }

    /// Runs every check and records the result as the current fault set.
    ///
    /// All checks run independently; several flags can be reported at once.
    pub fn verify(&mut self) -> Faults {
        let Header { size, capacity, .. } = self.header;
        let mut faults = Faults::empty();

        match &self.buffer {
            None => faults |= Faults::NULL_BUFFER,
            Some(buffer) if size >= buffer.capacity() || capacity != buffer.capacity() => {
                faults |= Faults::SIZE_OVERFLOW;
            }
            Some(_) => {}
        }
        if size >= capacity {
            faults |= Faults::SIZE_OVERFLOW;
        }
        if size == SIZE_POISON {
            faults |= Faults::INVALID_SIZE;
        }
        if capacity == CAPACITY_POISON {
            faults |= Faults::INVALID_CAPACITY_VALUE;
        }
        faults |= self.guard.check(&self.header, self.buffer.as_ref());

        if !faults.is_empty() && self.state == StackState::Live {
            warn!(stack = %self.header.provenance, %faults, "stack verification failed");
        }
        self.faults = faults;
        faults
    }

    /// Releases the buffer and tombstones the header.
    ///
    /// Returns the faults found by the verification pass that precedes the
    /// teardown. Afterwards every mutating call fails with
    /// `StackError::Destroyed`, while [`Stack::verify`] and
    /// [`Stack::snapshot`] keep reporting the tombstone.
    ///
    /// # Errors
    ///
    /// Returns `StackError::MissingBuffer` if there is no buffer to release,
    /// which is also what a second `destroy` gets.
    pub fn destroy(&mut self) -> Result<Faults, StackError> {
        let found = self.verify();
        let Some(buffer) = self.buffer.take() else {
            error!(stack = %self.header.provenance, "destroy without a buffer");
            return Err(StackError::MissingBuffer);
        };
        drop(buffer);

        debug!(stack = self.header.provenance.name, %found, "destroyed stack");
        self.header = Header::TOMBSTONE;
        self.guard.tombstone();
        self.seal();
        self.state = StackState::Destroyed;
        self.verify();
        Ok(found)
    }

    /// Captures everything a diagnostic report needs.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            size: self.header.size,
            capacity: self.header.capacity,
            slots: self
                .buffer
                .as_ref()
                .map(|buffer| buffer.slots().map(Slot::of).collect())
                .unwrap_or_default(),
            guards: self.guard.report(&self.header, self.buffer.as_ref()),
            provenance: self.header.provenance,
            faults: self.faults,
        }
    }

    fn ensure_live(&self, operation: &'static str) -> Result<(), StackError> {
        match self.state {
            StackState::Live => Ok(()),
            StackState::Destroyed => Err(StackError::Destroyed { operation }),
        }
    }

    fn settle(&mut self) -> Result<(), StackError> {
        let faults = self.verify();
        if faults.is_empty() {
            Ok(())
        } else {
            Err(StackError::Corrupted { faults })
        }
    }

    fn seal(&mut self) {
        self.guard.seal(&self.header, self.buffer.as_ref());
    }

    fn resize(&mut self, capacity: usize) -> Result<(), StackError> {
        let next = match self.allocate_resized(capacity) {
            Ok(next) => next,
            Err(err) => return Err(self.resize_failed(err)),
        };

        debug!(
            stack = self.header.provenance.name,
            from = self.header.capacity,
            to = next.capacity(),
            "resized buffer"
        );
        self.header.capacity = next.capacity();
        self.buffer = Some(next);
        self.seal();
        Ok(())
    }

    fn allocate_resized(&self, capacity: usize) -> Result<SlotBuffer, StackError> {
        #[cfg(any(test, feature = "fault-injection"))]
        if self.allocation_limit.is_some_and(|limit| capacity > limit) {
            return Err(StackError::AllocationFailure { capacity });
        }
        match self.buffer.as_ref() {
            Some(buffer) => buffer.resized(capacity, self.header.size),
            None => Err(StackError::MissingBuffer),
        }
    }

    /// Records a failed resize; the old buffer stays in place.
    fn resize_failed(&mut self, err: StackError) -> StackError {
        self.faults |= err.faults();
        error!(stack = %self.header.provenance, %err, "resize failed");
        err
    }
}

#[cfg(any(test, feature = "fault-injection"))]
impl<P: Protection> Stack<P> {
    pub(crate) fn buffer_mut(&mut self) -> Option<&mut SlotBuffer> {
        self.buffer.as_mut()
    }

    pub(crate) fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    pub(crate) fn take_buffer(&mut self) -> Option<SlotBuffer> {
        self.buffer.take()
    }
}

/// Verifies a stack that may not exist.
///
/// An absent stack reports [`Faults::NULL_CONTAINER`].
pub fn verify_maybe<P: Protection>(stack: Option<&mut Stack<P>>) -> Faults {
    stack.map_or(Faults::NULL_CONTAINER, |stack| stack.verify())
}
