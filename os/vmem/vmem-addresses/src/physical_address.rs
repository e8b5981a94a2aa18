use crate::{PageOffset, TableIndex};
use core::fmt;

/// Physical memory address.
///
/// A thin wrapper that denotes **physical** (machine) addresses, as stored in
/// CR3 and in the frame field of page-table entries. Like
/// [`VirtualAddress`](crate::VirtualAddress), this type carries intent and
/// prevents accidental VA↔PA mix-ups.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Address of entry `index` in the table starting at `self`.
    #[inline]
    #[must_use]
    pub const fn entry(self, index: TableIndex) -> Self {
        Self(self.0.wrapping_add(index.byte_offset()))
    }

    /// Byte `offset` inside the page starting at `self`.
    #[inline]
    #[must_use]
    pub const fn with_offset(self, offset: PageOffset) -> Self {
        Self(self.0.wrapping_add(offset.as_u64()))
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<PhysicalAddress> for u64 {
    #[inline]
    fn from(v: PhysicalAddress) -> Self {
        v.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_address_steps_by_eight() {
        let table = PhysicalAddress::new(0x1000);
        assert_eq!(table.entry(TableIndex::new(0)).as_u64(), 0x1000);
        assert_eq!(table.entry(TableIndex::new(1)).as_u64(), 0x1008);
        assert_eq!(table.entry(TableIndex::new(511)).as_u64(), 0x1FF8);
    }

    #[test]
    fn offset_joins_page_base() {
        let page = PhysicalAddress::new(0x9000);
        assert_eq!(page.with_offset(PageOffset::new(0x10)).as_u64(), 0x9010);
    }

    #[test]
    fn arithmetic_at_the_top_wraps() {
        let top = PhysicalAddress::new(u64::MAX - 7);
        assert_eq!(top.entry(TableIndex::new(1)).as_u64(), 0);
        assert_eq!(top.with_offset(PageOffset::new(0x10)).as_u64(), 8);
    }
}
