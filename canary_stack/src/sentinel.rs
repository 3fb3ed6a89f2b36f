//! Reserved values: the element poison, the live canary and the destroyed canary.

use core::mem::size_of;

/// Element type stored by the stack.
pub type Elem = i32;

/// Guard word placed around the stack header and around the slot buffer.
pub type Canary = u64;

/// Marks a slot that holds no element.
pub const ELEM_POISON: Elem = Elem::MAX;

/// Value every canary holds while the stack is alive.
pub const CANARY_LIVE: Canary = 0x0000_000B_ADC0_FFEE;

/// Value written over the header canaries at teardown.
pub const CANARY_DESTROYED: Canary = 18_446_744_073_709;

/// Written over `size` at teardown.
pub const SIZE_POISON: usize = usize::MAX;

/// Written over `capacity` at teardown.
pub const CAPACITY_POISON: usize = usize::MAX;

pub(crate) const ELEM_BYTES: usize = size_of::<Elem>();
pub(crate) const CANARY_BYTES: usize = size_of::<Canary>();

const _: () = assert!(CANARY_LIVE != CANARY_DESTROYED);

#[must_use]
pub const fn is_poison(value: Elem) -> bool {
    value == ELEM_POISON
}

#[must_use]
pub const fn is_live_canary(value: Canary) -> bool {
    value == CANARY_LIVE
}

#[must_use]
pub const fn is_destroyed_canary(value: Canary) -> bool {
    value == CANARY_DESTROYED
}

/// Classification of an observed canary value.
///
/// Both `Destroyed` and `Clobbered` are faults. They are told apart so that a
/// report can say "used after teardown" instead of "overwritten".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanaryState {
    Intact,
    Destroyed,
    Clobbered,
}

impl CanaryState {
    #[must_use]
    pub const fn of(value: Canary) -> Self {
        if is_live_canary(value) {
            Self::Intact
        } else if is_destroyed_canary(value) {
            Self::Destroyed
        } else {
            Self::Clobbered
        }
    }

    #[must_use]
    pub const fn is_intact(self) -> bool {
        matches!(self, Self::Intact)
    }
}
