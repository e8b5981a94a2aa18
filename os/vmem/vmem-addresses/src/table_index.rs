use crate::{PagingLevel, VirtualAddress};
use core::fmt;

/// Index into one 512-entry paging table.
///
/// Derived from a 9-bit field of a virtual address; see [`PagingLevel::shift`].
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TableIndex(u16);

impl TableIndex {
    /// Entries per table.
    pub const ENTRIES: u64 = 512;

    /// Size of one entry in bytes.
    pub const ENTRY_SIZE: u64 = 8;

    /// Mask selecting the 9 index bits after shifting.
    pub const MASK: u64 = Self::ENTRIES - 1;

    /// Construct an index from a raw value.
    ///
    /// ### Panics / Debug assertions
    /// - Debug builds assert `v < 512`.
    #[inline]
    #[must_use]
    pub const fn new(v: u16) -> Self {
        debug_assert!((v as u64) < Self::ENTRIES);
        Self(v)
    }

    /// Extract the index `level` uses from `va`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn of(va: VirtualAddress, level: PagingLevel) -> Self {
        Self(((va.as_u64() >> level.shift()) & Self::MASK) as u16)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }

    /// Byte offset of the selected entry from the start of its table.
    #[inline]
    #[must_use]
    pub const fn byte_offset(self) -> u64 {
        self.as_u64() * Self::ENTRY_SIZE
    }
}

impl fmt::Debug for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index({})", self.0)
    }
}

impl fmt::Display for TableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_masks_exactly_nine_bits() {
        // Every bit set: each level must still land on 511, never wider.
        let va = VirtualAddress::new(u64::MAX);
        for level in PagingLevel::WALK_ORDER {
            assert_eq!(TableIndex::of(va, level).as_u64(), 511);
        }
    }

    #[test]
    fn neighbouring_fields_do_not_bleed() {
        // Only bit 39 set: PML4 index 1, everything else 0.
        let va = VirtualAddress::new(1 << 39);
        assert_eq!(TableIndex::of(va, PagingLevel::Pml4).as_u64(), 1);
        assert_eq!(TableIndex::of(va, PagingLevel::Pdpt).as_u64(), 0);

        // Bit 38 is the top of the PDPT field.
        let va = VirtualAddress::new(1 << 38);
        assert_eq!(TableIndex::of(va, PagingLevel::Pml4).as_u64(), 0);
        assert_eq!(TableIndex::of(va, PagingLevel::Pdpt).as_u64(), 256);
    }

    #[test]
    fn byte_offset_is_eight_per_entry() {
        assert_eq!(TableIndex::new(0).byte_offset(), 0);
        assert_eq!(TableIndex::new(3).byte_offset(), 24);
        assert_eq!(TableIndex::new(511).byte_offset(), 4088);
    }
}
