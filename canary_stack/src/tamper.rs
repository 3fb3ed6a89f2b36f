//! Fault injection for exercising the verification paths.
//!
//! Every write here bypasses sealing, so the next verification pass sees the
//! damage exactly as a stray write would have left it.

use crate::protection::{Guarded, Protection};
use crate::sentinel::{Canary, Elem};
use crate::stack::Stack;

/// Handle returned by `Stack::tamper`.
pub struct Tamper<'a, P: Protection> {
    stack: &'a mut Stack<P>,
}

impl<P: Protection> Stack<P> {
    /// Opens the stack for deliberate corruption.
    pub fn tamper(&mut self) -> Tamper<'_, P> {
        Tamper { stack: self }
    }
}

impl<P: Protection> Tamper<'_, P> {
    /// Overwrites any slot below the buffer capacity, live or not.
    pub fn slot(&mut self, index: usize, value: Elem) -> &mut Self {
        if let Some(buffer) = self.stack.buffer_mut() {
            buffer.replace(index, value);
        }
        self
    }

    pub fn size(&mut self, size: usize) -> &mut Self {
        self.stack.header_mut().size = size;
        self
    }

    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.stack.header_mut().capacity = capacity;
        self
    }

    /// Makes every resize to more than `limit` slots fail as if the
    /// allocator had refused it. `None` lifts the limit.
    pub fn allocation_limit(&mut self, limit: Option<usize>) -> &mut Self {
        self.stack.allocation_limit = limit;
        self
    }

    /// Releases the buffer behind the stack's back.
    pub fn drop_buffer(&mut self) -> &mut Self {
        self.stack.take_buffer();
        self
    }
}

impl Tamper<'_, Guarded> {
    pub fn left_struct_canary(&mut self, value: Canary) -> &mut Self {
        self.stack.guard.left_canary = value;
        self
    }

    pub fn right_struct_canary(&mut self, value: Canary) -> &mut Self {
        self.stack.guard.right_canary = value;
        self
    }

    pub fn left_data_canary(&mut self, value: Canary) -> &mut Self {
        if let Some(buffer) = self.stack.buffer_mut() {
            buffer.set_left_canary(value);
        }
        self
    }

    pub fn right_data_canary(&mut self, value: Canary) -> &mut Self {
        if let Some(buffer) = self.stack.buffer_mut() {
            buffer.set_right_canary(value);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::{provenance, Faults, Guarded, Slot, Stack, StackError, StackState, Unguarded};

    fn filled(values: &[i32]) -> Stack<Guarded> {
        let mut stack = Stack::new(4, provenance!(stack)).unwrap();
        for &value in values {
            stack.push(value).unwrap();
        }
        stack
    }

    #[test]
    fn test_left_struct_canary_is_reported_alone() {
        let mut stack = filled(&[1, 2, 3]);
        stack.tamper().left_struct_canary(0);
        assert_eq!(stack.verify(), Faults::LEFT_STRUCT_CANARY);
    }

    #[test]
    fn test_right_struct_canary_is_reported_alone() {
        let mut stack = filled(&[1]);
        stack.tamper().right_struct_canary(0xDEAD);
        assert_eq!(stack.verify(), Faults::RIGHT_STRUCT_CANARY);
    }

    #[test]
    fn test_data_canaries_are_covered_by_the_data_hash() {
        let mut stack = filled(&[1, 2]);
        stack.tamper().left_data_canary(7);
        assert_eq!(stack.verify(), Faults::LEFT_DATA_CANARY | Faults::DATA_HASH);

        let mut stack = filled(&[1, 2]);
        stack.tamper().right_data_canary(7);
        assert_eq!(stack.verify(), Faults::RIGHT_DATA_CANARY | Faults::DATA_HASH);
    }

    #[test]
    fn test_silent_slot_corruption_trips_the_data_hash() {
        let mut stack = filled(&[10, 20, 30]);
        stack.tamper().slot(1, 21);
        assert_eq!(stack.verify(), Faults::DATA_HASH);
    }

    #[test]
    fn test_poisoned_slot_overwrite_trips_the_data_hash() {
        let mut stack = filled(&[10]);
        stack.tamper().slot(3, 0);
        assert_eq!(stack.verify(), Faults::DATA_HASH);
    }

    #[test]
    fn test_size_overflow_and_header_hash() {
        let mut stack = filled(&[10]);
        let capacity = stack.capacity();
        stack.tamper().size(capacity);
        assert_eq!(stack.verify(), Faults::SIZE_OVERFLOW | Faults::STRUCT_HASH);
    }

    #[test]
    fn test_multiple_faults_accumulate() {
        let mut stack = filled(&[10, 20]);
        stack
            .tamper()
            .left_struct_canary(0)
            .right_data_canary(0)
            .size(usize::MAX);
        let faults = stack.verify();
        assert_eq!(
            faults,
            Faults::LEFT_STRUCT_CANARY
                | Faults::RIGHT_DATA_CANARY
                | Faults::DATA_HASH
                | Faults::SIZE_OVERFLOW
                | Faults::INVALID_SIZE
                | Faults::STRUCT_HASH
        );
        assert_eq!(stack.faults(), faults);
    }

    #[test]
    fn test_corrupted_stack_refuses_mutation() {
        let mut stack = filled(&[10, 20]);
        stack.tamper().slot(0, 11);

        assert_eq!(
            stack.push(30),
            Err(StackError::Corrupted {
                faults: Faults::DATA_HASH
            })
        );
        assert_eq!(stack.len(), 2);

        let (value, faults) = stack.pop_or_poison();
        assert_eq!(value, crate::ELEM_POISON);
        assert_eq!(faults, Faults::DATA_HASH);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_verify_does_not_heal_corruption() {
        let mut stack = filled(&[10]);
        stack.tamper().slot(0, 12);
        assert_eq!(stack.verify(), Faults::DATA_HASH);
        assert_eq!(stack.verify(), Faults::DATA_HASH);
    }

    #[test]
    fn test_unguarded_stack_sees_only_structural_faults() {
        let mut stack: Stack<Unguarded> = Stack::new(4, provenance!(stack)).unwrap();
        stack.push(1).unwrap();
        stack.tamper().slot(0, 99);
        assert_eq!(stack.verify(), Faults::empty());
        assert_eq!(stack.pop(), Ok(99));

        stack.tamper().size(10);
        assert_eq!(stack.verify(), Faults::SIZE_OVERFLOW);
        assert!(stack.push(5).is_err());
    }

    #[test]
    fn test_header_larger_than_buffer_is_an_overflow() {
        let mut stack: Stack<Unguarded> = Stack::new(2, provenance!(stack)).unwrap();
        stack.tamper().capacity(100).size(50);
        assert_eq!(stack.verify(), Faults::SIZE_OVERFLOW);
        assert_eq!(
            stack.push(1),
            Err(StackError::Corrupted {
                faults: Faults::SIZE_OVERFLOW
            })
        );
        assert_eq!(stack.len(), 50);
    }

    #[test]
    fn test_capacity_disagreeing_with_buffer_is_an_overflow() {
        let mut stack: Stack<Unguarded> = Stack::new(4, provenance!(stack)).unwrap();
        stack.push(1).unwrap();
        stack.tamper().capacity(3);
        assert_eq!(stack.verify(), Faults::SIZE_OVERFLOW);
        assert!(stack.pop().is_err());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_failed_growth_keeps_the_old_buffer() {
        let mut stack: Stack = Stack::new(2, provenance!(stack)).unwrap();
        stack.push(7).unwrap();
        stack.tamper().allocation_limit(Some(2));

        assert_eq!(stack.push(9), Err(StackError::AllocationFailure { capacity: 4 }));
        assert!(stack.faults().contains(Faults::ALLOCATION_FAILURE));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.capacity(), 2);
        assert_eq!(stack.get(0), Some(7));
        assert_eq!(stack.slot(1), Some(Slot::Poison));
        assert_eq!(stack.verify(), Faults::empty());

        stack.tamper().allocation_limit(None);
        stack.push(9).unwrap();
        assert_eq!(stack.capacity(), 4);
        assert_eq!(stack.iter().collect::<Vec<_>>(), vec![7, 9]);
    }

    #[test]
    fn test_failed_unguarded_growth_keeps_the_old_buffer() {
        let mut stack: Stack<Unguarded> = Stack::new(2, provenance!(stack)).unwrap();
        stack.push(7).unwrap();
        stack.tamper().allocation_limit(Some(3));

        assert_eq!(stack.push(8), Err(StackError::AllocationFailure { capacity: 4 }));
        assert_eq!(stack.faults(), Faults::ALLOCATION_FAILURE);
        assert_eq!(stack.slot(0), Some(Slot::Value(7)));
        assert_eq!(stack.pop(), Ok(7));
    }

    #[test]
    fn test_failed_shrink_keeps_the_old_buffer() {
        let mut stack: Stack = Stack::new(8, provenance!(stack)).unwrap();
        stack.push(5).unwrap();
        stack.tamper().allocation_limit(Some(0));

        let (value, faults) = stack.pop_or_poison();
        assert_eq!(value, crate::ELEM_POISON);
        assert!(faults.contains(Faults::ALLOCATION_FAILURE));
        assert!(stack.faults().contains(Faults::ALLOCATION_FAILURE));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.capacity(), 8);
        assert_eq!(stack.top(), Some(5));

        stack.tamper().allocation_limit(None);
        assert_eq!(stack.pop(), Ok(5));
        assert_eq!(stack.capacity(), 4);
    }

    #[test]
    fn test_missing_buffer_is_an_error_not_an_abort() {
        let mut stack = filled(&[1]);
        stack.tamper().drop_buffer();
        assert!(stack.verify().contains(Faults::NULL_BUFFER));
        assert_eq!(stack.destroy(), Err(StackError::MissingBuffer));
        assert_eq!(stack.state(), StackState::Live);
    }

    #[test]
    fn test_destroy_reports_prior_corruption() {
        let mut stack = filled(&[1, 2]);
        stack.tamper().slot(1, 3);
        assert_eq!(stack.destroy(), Ok(Faults::DATA_HASH));
        assert_eq!(stack.state(), StackState::Destroyed);
        assert_eq!(stack.slot(0), None::<Slot>);
    }
}
