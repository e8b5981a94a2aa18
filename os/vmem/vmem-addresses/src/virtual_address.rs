use crate::{PagingLevel, PageOffset, TableIndex};
use core::fmt;

/// Virtual memory address of the target.
///
/// Carries only the *kind* of address; canonicality is not enforced on
/// construction. Use [`index`](Self::index) and [`page_offset`](Self::page_offset)
/// to decompose it for a walk, and [`from_parts`](Self::from_parts) to put it
/// back together.
///
/// ### Examples
/// ```rust
/// # use vmem_addresses::*;
/// let va = VirtualAddress::new(0x0000_7FFF_DEAD_B123);
/// let rebuilt = VirtualAddress::from_parts(va.indices(), va.page_offset());
/// assert_eq!(rebuilt, va.canonical());
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddress(u64);

impl VirtualAddress {
    /// Bits covered by the four index fields and the page offset.
    const TRANSLATED_BITS: u32 = 48;

    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The 9-bit table index `level` selects with this address.
    #[inline]
    #[must_use]
    pub const fn index(self, level: PagingLevel) -> TableIndex {
        TableIndex::of(self, level)
    }

    /// All four indices in walk order (PML4, PDPT, PDT, PT).
    #[inline]
    #[must_use]
    pub const fn indices(self) -> [TableIndex; 4] {
        [
            self.index(PagingLevel::Pml4),
            self.index(PagingLevel::Pdpt),
            self.index(PagingLevel::Pdt),
            self.index(PagingLevel::Pt),
        ]
    }

    /// The byte offset inside the final 4 KiB page.
    #[inline]
    #[must_use]
    pub const fn page_offset(self) -> PageOffset {
        PageOffset::of(self)
    }

    /// Sign-extend bit 47 into bits 63‒48.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub const fn canonical(self) -> Self {
        let unused = u64::BITS - Self::TRANSLATED_BITS;
        Self((((self.0 << unused) as i64) >> unused) as u64)
    }

    /// Whether bits 63‒48 already mirror bit 47.
    #[inline]
    #[must_use]
    pub const fn is_canonical(self) -> bool {
        self.0 == self.canonical().0
    }

    /// Build a canonical address from its walk indices and page offset.
    #[inline]
    #[must_use]
    pub const fn from_parts(indices: [TableIndex; 4], offset: PageOffset) -> Self {
        let levels = PagingLevel::WALK_ORDER;
        let mut raw = offset.as_u64();
        let mut i = 0;
        while i < levels.len() {
            raw |= indices[i].as_u64() << levels[i].shift();
            i += 1;
        }
        Self(raw).canonical()
    }
}

impl fmt::Debug for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VA(0x{:016X})", self.0)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u64> for VirtualAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<VirtualAddress> for u64 {
    #[inline]
    fn from(v: VirtualAddress) -> Self {
        v.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic xorshift sequence so the sweep is reproducible.
    fn sample_addresses() -> impl Iterator<Item = u64> {
        let mut state = 0x9E37_79B9_7F4A_7C15_u64;
        let edges = [
            0,
            1,
            0xFFF,
            0x1000,
            0x0000_7FFF_FFFF_FFFF,
            0x0000_8000_0000_0000,
            0xFFFF_8000_0000_0000,
            0xFFFF_FFFF_FFFF_FFFF,
            0x1234_5678_9ABC_DEF0,
        ];
        edges.into_iter().chain(core::iter::from_fn(move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            Some(state)
        }))
        .take(4096)
    }

    #[test]
    fn parts_reconstruct_canonical_address() {
        for raw in sample_addresses() {
            let va = VirtualAddress::new(raw);
            let rebuilt = VirtualAddress::from_parts(va.indices(), va.page_offset());
            assert_eq!(rebuilt, va.canonical(), "input {raw:#018x}");
        }
    }

    #[test]
    fn canonical_sign_extends_bit_47() {
        assert_eq!(
            VirtualAddress::new(0x0000_8000_0000_0000).canonical().as_u64(),
            0xFFFF_8000_0000_0000
        );
        assert_eq!(
            VirtualAddress::new(0xABCD_7FFF_FFFF_F000).canonical().as_u64(),
            0x0000_7FFF_FFFF_F000
        );
        assert!(VirtualAddress::new(0xFFFF_FFFF_8000_0000).is_canonical());
        assert!(!VirtualAddress::new(0x0001_0000_0000_0000).is_canonical());
    }

    #[test]
    fn offset_is_low_twelve_bits() {
        let va = VirtualAddress::new(0xFFFF_FFFF_FFFF_F123);
        assert_eq!(va.page_offset().as_u64(), 0x123);
    }

    #[test]
    fn lower_hex_has_no_padding() {
        assert_eq!(format!("{:x}", VirtualAddress::new(0x10)), "10");
        assert_eq!(format!("{:#x}", VirtualAddress::new(0xABC)), "0xabc");
    }
}
