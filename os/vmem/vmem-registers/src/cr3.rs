use crate::RegisterSnapshot;
use bitfield_struct::bitfield;
use vmem_addresses::PhysicalAddress;

/// CR3 — Page-Map Level-4 Base Register (IA-32e).
///
/// Holds the physical base address of the PML4 table. The low 12 bits are
/// either cache-control flags (PWT/PCD, CR4.PCIDE = 0) or the process-context
/// identifier (CR4.PCIDE = 1); neither is part of the table address.
#[bitfield(u64)]
pub struct Cr3 {
    /// Bits 0–11 — PWT/PCD flags or PCID, depending on CR4.PCIDE.
    #[bits(12)]
    pub low_bits: u16,

    /// Bits 12–51 — PML4 physical base >> 12.
    ///
    /// To get the full physical address: `pml4_base_phys = pml4_base_4k << 12`.
    #[bits(40)]
    pml4_base_4k: u64,

    /// Bits 52–63 — Reserved, or the no-flush hint (bit 63) on a CR3 write.
    #[bits(12)]
    pub high_bits: u16,
}

impl Cr3 {
    /// Bit 3 — PWT: Page-level Write-Through for PML4 accesses (PCIDE = 0).
    #[inline]
    #[must_use]
    pub const fn pwt(&self) -> bool {
        self.low_bits() & (1 << 3) != 0
    }

    /// Bit 4 — PCD: Page-level Cache Disable for PML4 accesses (PCIDE = 0).
    #[inline]
    #[must_use]
    pub const fn pcd(&self) -> bool {
        self.low_bits() & (1 << 4) != 0
    }

    /// The process-context identifier (PCIDE = 1).
    #[inline]
    #[must_use]
    pub const fn pcid(&self) -> u16 {
        self.low_bits()
    }

    /// The 4 KiB-aligned physical address of the PML4 table.
    ///
    /// Flag/PCID bits and the reserved high bits are masked off.
    #[inline]
    #[must_use]
    pub const fn pml4_base(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.pml4_base_4k() << 12)
    }
}

impl RegisterSnapshot for Cr3 {
    const NAME: &'static str = "cr3";

    #[inline]
    fn from_raw(raw: u64) -> Self {
        Self::from_bits(raw)
    }

    #[inline]
    fn raw(&self) -> u64 {
        self.into_bits()
    }
}
