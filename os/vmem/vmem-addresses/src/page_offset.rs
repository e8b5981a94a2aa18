use crate::{PAGE_SIZE, VirtualAddress};
use core::fmt;

/// Byte offset inside a 4 KiB page (`0..4096`).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageOffset(u16);

impl PageOffset {
    /// Mask selecting the 12 offset bits.
    pub const MASK: u64 = PAGE_SIZE - 1;

    /// Create from a raw value, asserting it is `< 4096` in debug.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(value: u64) -> Self {
        debug_assert!(value < PAGE_SIZE, "offset must be < page size");
        Self((value & Self::MASK) as u16)
    }

    /// The low 12 bits of `va`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn of(va: VirtualAddress) -> Self {
        Self((va.as_u64() & Self::MASK) as u16)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Debug for PageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset({:#X})", self.0)
    }
}
