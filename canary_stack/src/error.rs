use thiserror::Error;

use crate::faults::Faults;
use crate::sentinel::Elem;

/// Error types for `Stack` operations
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum StackError {
    /// Construction was asked for a zero-slot buffer
    #[error("Invalid capacity: {capacity} (must be at least 1)")]
    InvalidCapacity {
        /// Capacity that was requested
        capacity: usize,
    },
    /// The allocator could not provide a buffer of the requested size
    #[error("Allocation failure: could not obtain {capacity} slots")]
    AllocationFailure {
        /// Slot count that was requested
        capacity: usize,
    },
    /// Pop on a stack with no elements
    #[error("Empty stack: nothing to pop")]
    EmptyStack,
    /// The value is reserved to mark unused slots
    #[error("Reserved value: {value} is the slot poison and cannot be stored")]
    ReservedValue {
        /// Value that was rejected
        value: Elem,
    },
    /// Verification found faults; the stack can no longer be trusted
    #[error("Stack corrupted: {faults}")]
    Corrupted {
        /// Everything the verification pass observed
        faults: Faults,
    },
    /// The stack has already been torn down
    #[error("Use after destroy: `{operation}` called on a destroyed stack")]
    Destroyed {
        /// Name of the rejected operation
        operation: &'static str,
    },
    /// Teardown found no buffer to release
    #[error("Missing buffer: refusing to tear down a stack without storage")]
    MissingBuffer,
}

impl StackError {
    /// The fault flags equivalent to this error.
    #[must_use]
    pub fn faults(&self) -> Faults {
        match self {
            Self::InvalidCapacity { .. } => Faults::INVALID_CAPACITY,
            Self::AllocationFailure { .. } => Faults::ALLOCATION_FAILURE,
            Self::EmptyStack => Faults::EMPTY_STACK,
            Self::Corrupted { faults } => *faults,
            Self::Destroyed { .. } => {
                Faults::NULL_BUFFER | Faults::INVALID_SIZE | Faults::INVALID_CAPACITY_VALUE
            }
            Self::MissingBuffer => Faults::NULL_BUFFER,
            Self::ReservedValue { .. } => Faults::empty(),
        }
    }
}
