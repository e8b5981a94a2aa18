//! # Flag Decoder
//!
//! Turns a raw entry value into a [`FlagReport`]: one field per control bit,
//! plus the level it was read at. Decoding is pure and total; any `u64` is
//! accepted.
//!
//! The [`Display`](core::fmt::Display) form is the one-line diagnostic printed
//! for every level a walk visits:
//!
//! ```rust
//! # use vmem_walk::{decode, PagingLevel};
//! let report = decode(PagingLevel::Pml4, 0x2003);
//! assert_eq!(
//!     report.to_string(),
//!     "PML4 value: 2003, Present: 1, R/W: 1, User/Supervisor: 0, \
//!      PageWriteThrough: 0, PageCacheDisable: 0, Accessed: 0, Dirty: 0, \
//!      PageAttributeTable/PS: 0, Global: 0, NoExecute: 0"
//! );
//! ```

use crate::entry::PageEntryBits;
use core::fmt;
use vmem_addresses::{PagingLevel, PhysicalAddress};

/// Decoded control bits of one page-table entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FlagReport {
    /// Table the entry was read from.
    pub level: PagingLevel,
    /// Raw entry value.
    pub value: u64,
    /// Present (P, bit 0).
    pub present: bool,
    /// Writable (R/W, bit 1).
    pub writable: bool,
    /// User/Supervisor (U/S, bit 2).
    pub user: bool,
    /// Page Write-Through (PWT, bit 3).
    pub write_through: bool,
    /// Page Cache Disable (PCD, bit 4).
    pub cache_disable: bool,
    /// Accessed (A, bit 5).
    pub accessed: bool,
    /// Dirty (D, bit 6).
    pub dirty: bool,
    /// PAT in a PTE, PS (page size) in a PDPTE/PDE (bit 7).
    pub pat_or_page_size: bool,
    /// Global (G, bit 8).
    pub global: bool,
    /// No-Execute (NX, bit 63).
    pub no_execute: bool,
}

/// Decode `value` as an entry of the `level` table.
#[must_use]
pub const fn decode(level: PagingLevel, value: u64) -> FlagReport {
    let bits = PageEntryBits::from_bits(value);
    FlagReport {
        level,
        value,
        present: bits.present(),
        writable: bits.writable(),
        user: bits.user_access(),
        write_through: bits.write_through(),
        cache_disable: bits.cache_disabled(),
        accessed: bits.accessed(),
        dirty: bits.dirty(),
        pat_or_page_size: bits.pat_or_page_size(),
        global: bits.global_translation(),
        no_execute: bits.no_execute(),
    }
}

impl FlagReport {
    /// The 4 KiB-aligned frame (bits 12..=51) the entry points at.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> PhysicalAddress {
        PageEntryBits::from_bits(self.value).frame()
    }
}

impl fmt::Display for FlagReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            concat!(
                "{level} value: {value:x}, Present: {p}, R/W: {rw}, User/Supervisor: {us}, ",
                "PageWriteThrough: {pwt}, PageCacheDisable: {pcd}, Accessed: {a}, Dirty: {d}, ",
                "PageAttributeTable/PS: {pat}, Global: {g}, NoExecute: {nx}"
            ),
            level = self.level,
            value = self.value,
            p = u8::from(self.present),
            rw = u8::from(self.writable),
            us = u8::from(self.user),
            pwt = u8::from(self.write_through),
            pcd = u8::from(self.cache_disable),
            a = u8::from(self.accessed),
            d = u8::from(self.dirty),
            pat = u8::from(self.pat_or_page_size),
            g = u8::from(self.global),
            nx = u8::from(self.no_execute),
        )
    }
}
