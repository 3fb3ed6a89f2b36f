use canary_stack::{provenance, Slot, Stack, Unguarded, ELEM_POISON};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push(i32),
    Pop,
}

fn payload() -> impl Strategy<Value = i32> {
    i32::MIN..ELEM_POISON
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![payload().prop_map(Op::Push), Just(Op::Pop)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn prop_poison_invariant_over_random_operations(ops in prop::collection::vec(op(), 10_000)) {
        let mut stack: Stack = Stack::new(1, provenance!(stack)).unwrap();
        let mut model = Vec::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    stack.push(value).unwrap();
                    model.push(value);
                }
                Op::Pop => {
                    prop_assert_eq!(stack.pop().ok(), model.pop());
                }
            }

            prop_assert_eq!(stack.len(), model.len());
            prop_assert!(stack.len() < stack.capacity());
            for index in stack.len()..stack.capacity() {
                prop_assert_eq!(stack.slot(index), Some(Slot::Poison));
            }
        }

        prop_assert!(stack.verify().is_empty());
        prop_assert!(stack.iter().eq(model.iter().copied()));
    }
}

proptest! {
    #[test]
    fn prop_pop_order_is_reverse_push_order(values in prop::collection::vec(payload(), 0..1000)) {
        let mut stack: Stack = Stack::new(1, provenance!(stack)).unwrap();
        for &value in &values {
            stack.push(value).unwrap();
        }

        for &expected in values.iter().rev() {
            prop_assert_eq!(stack.pop(), Ok(expected));
            prop_assert!(stack.capacity() > stack.len());
        }
        prop_assert!(stack.is_empty());
    }

    #[test]
    fn prop_protection_level_does_not_change_contents(
        values in prop::collection::vec(payload(), 1..300),
        pops in 0usize..300,
    ) {
        let mut guarded: Stack = Stack::new(2, provenance!(guarded)).unwrap();
        let mut unguarded: Stack<Unguarded> = Stack::new(2, provenance!(unguarded)).unwrap();

        for &value in &values {
            guarded.push(value).unwrap();
            unguarded.push(value).unwrap();
        }
        for _ in 0..pops {
            prop_assert_eq!(guarded.pop().ok(), unguarded.pop().ok());
        }

        prop_assert_eq!(guarded.capacity(), unguarded.capacity());
        let (guarded, unguarded) = (guarded.snapshot(), unguarded.snapshot());
        prop_assert_eq!(guarded.slots, unguarded.slots);
    }
}
