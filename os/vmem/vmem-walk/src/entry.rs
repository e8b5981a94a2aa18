//! # Raw Page-Table Entry Bits

use bitfield_struct::bitfield;
use vmem_addresses::PhysicalAddress;

/// A single 64-bit x86-64 page-table entry in its raw bitfield form.
///
/// Models the **common superset** of fields found in all four paging levels
/// (PML4E, PDPTE, PDE, PTE). The walker reads entries it does not own, so
/// every bit pattern is accepted, including ones the hardware would reject.
///
/// ### Bit layout
///
/// | Bits      | Name / Mnemonic   | Meaning |
/// |-----------|-------------------|----------|
/// | 0         | `P` (present)     | Valid entry if set |
/// | 1         | `RW`              | Writable if set |
/// | 2         | `US`              | User-mode accessible if set |
/// | 3         | `PWT`             | Write-through caching |
/// | 4         | `PCD`             | Disable caching |
/// | 5         | `A`               | Accessed |
/// | 6         | `D`               | Dirty (leaf only) |
/// | 7         | `PAT` / `PS`      | PAT in a PTE, page size in a PDPTE/PDE |
/// | 8         | `G`               | Global (leaf only) |
/// | 9–11      | OS avail low      | Reserved for OS use |
/// | 12–51     | `addr`            | Physical frame bits [51:12] |
/// | 52–62     | OS avail high / PKU | Ignored by the walk |
/// | 63        | `NX`              | Execute disable |
#[bitfield(u64)]
pub struct PageEntryBits {
    /// Present (P, bit 0).
    pub present: bool,

    /// Writable (RW, bit 1).
    pub writable: bool,

    /// User/Supervisor (US, bit 2).
    pub user_access: bool,

    /// Page Write-Through (PWT, bit 3).
    pub write_through: bool,

    /// Page Cache Disable (PCD, bit 4).
    pub cache_disabled: bool,

    /// Accessed (A, bit 5).
    pub accessed: bool,

    /// Dirty (D, bit 6).
    pub dirty: bool,

    /// Page Attribute Table in a PTE; Page Size at the PDPT and PDT levels (bit 7).
    pub pat_or_page_size: bool,

    /// Global (G, bit 8).
    pub global_translation: bool,

    /// OS-available (bits 9..=11).
    #[bits(3)]
    pub os_available_low: u8,

    /// Physical address bits [51:12] (bits 12..=51).
    #[bits(40)]
    phys_addr_bits_51_12: u64,

    /// OS-available and protection key bits (bits 52..=62).
    #[bits(11)]
    pub os_available_high: u16,

    /// No-Execute (NX, bit 63).
    pub no_execute: bool,
}

impl PageEntryBits {
    /// Mask of the frame field (bits 12..=51).
    pub const FRAME_MASK: u64 = 0x000F_FFFF_FFFF_F000;

    /// The 4 KiB-aligned frame this entry points at.
    ///
    /// Only bits 12..=51 survive; flag, OS-available and NX bits never leak
    /// into the returned address.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.phys_addr_bits_51_12() << 12)
    }
}
