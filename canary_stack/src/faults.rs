use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// Every fault category a verification pass can observe.
    ///
    /// Verification never stops at the first problem, so several flags may be
    /// set at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Faults: u16 {
        /// No stack was supplied
        const NULL_CONTAINER = 1 << 0;
        /// The slot buffer is absent
        const NULL_BUFFER = 1 << 1;
        /// `size >= capacity`
        const SIZE_OVERFLOW = 1 << 2;
        /// `size` holds the poison value
        const INVALID_SIZE = 1 << 3;
        /// `capacity` holds the poison value
        const INVALID_CAPACITY_VALUE = 1 << 4;
        /// The allocator refused a buffer
        const ALLOCATION_FAILURE = 1 << 5;
        /// Pop on an empty stack
        const EMPTY_STACK = 1 << 6;
        const LEFT_STRUCT_CANARY = 1 << 7;
        const RIGHT_STRUCT_CANARY = 1 << 8;
        const LEFT_DATA_CANARY = 1 << 9;
        const RIGHT_DATA_CANARY = 1 << 10;
        /// Header fields do not match their stored checksum
        const STRUCT_HASH = 1 << 11;
        /// Slot buffer does not match its stored checksum
        const DATA_HASH = 1 << 12;
        /// Construction was asked for a zero capacity
        const INVALID_CAPACITY = 1 << 13;
    }
}

const DESCRIPTIONS: &[(Faults, &str)] = &[
    (Faults::NULL_CONTAINER, "stack reference is missing"),
    (Faults::NULL_BUFFER, "stack buffer is missing"),
    (Faults::SIZE_OVERFLOW, "size is out of range for the capacity or buffer"),
    (Faults::INVALID_SIZE, "size holds the poison value"),
    (Faults::INVALID_CAPACITY_VALUE, "capacity holds the poison value"),
    (Faults::ALLOCATION_FAILURE, "buffer allocation failed"),
    (Faults::EMPTY_STACK, "stack is empty"),
    (Faults::LEFT_STRUCT_CANARY, "left header canary was overwritten"),
    (Faults::RIGHT_STRUCT_CANARY, "right header canary was overwritten"),
    (Faults::LEFT_DATA_CANARY, "left buffer canary was overwritten"),
    (Faults::RIGHT_DATA_CANARY, "right buffer canary was overwritten"),
    (Faults::STRUCT_HASH, "header checksum mismatch"),
    (Faults::DATA_HASH, "buffer checksum mismatch"),
    (Faults::INVALID_CAPACITY, "initial capacity must be positive"),
];

impl Faults {
    /// Yields each set flag with a one-line explanation, lowest bit first.
    pub fn descriptions(self) -> impl Iterator<Item = (Faults, &'static str)> {
        DESCRIPTIONS
            .iter()
            .copied()
            .filter(move |(flag, _)| self.contains(*flag))
    }

    /// True if any flag from the canary or checksum groups is set.
    #[must_use]
    pub fn is_tampering(self) -> bool {
        self.intersects(
            Self::LEFT_STRUCT_CANARY
                | Self::RIGHT_STRUCT_CANARY
                | Self::LEFT_DATA_CANARY
                | Self::RIGHT_DATA_CANARY
                | Self::STRUCT_HASH
                | Self::DATA_HASH,
        )
    }
}

impl fmt::Display for Faults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, (name, _)) in self.iter_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
