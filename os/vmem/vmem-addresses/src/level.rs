use core::fmt;

/// The four tables of an x86-64 4-level page walk, in walk order.
///
/// | Level | Table | VA bits |
/// |:------|:------|:--------|
/// | [`Pml4`](Self::Pml4) | Page Map Level 4 | 47‒39 |
/// | [`Pdpt`](Self::Pdpt) | Page Directory Pointer Table | 38‒30 |
/// | [`Pdt`](Self::Pdt) | Page Directory Table | 29‒21 |
/// | [`Pt`](Self::Pt) | Page Table | 20‒12 |
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PagingLevel {
    /// Top-level table, referenced by CR3.
    #[doc(alias = "PML4")]
    Pml4,
    /// Page Directory Pointer Table.
    #[doc(alias = "PDPT")]
    Pdpt,
    /// Page Directory Table.
    #[doc(alias = "PDT")]
    #[doc(alias = "PD")]
    Pdt,
    /// Page Table; its entries point at the final 4 KiB page.
    #[doc(alias = "PT")]
    Pt,
}

impl PagingLevel {
    /// All levels in the order a walk visits them.
    pub const WALK_ORDER: [Self; 4] = [Self::Pml4, Self::Pdpt, Self::Pdt, Self::Pt];

    /// Right shift that moves this level's index field to bit 0.
    #[inline]
    #[must_use]
    pub const fn shift(self) -> u32 {
        match self {
            Self::Pml4 => 39,
            Self::Pdpt => 30,
            Self::Pdt => 21,
            Self::Pt => 12,
        }
    }

    /// Short table name as used in diagnostics (`"PML4"`, `"PDPT"`, `"PDT"`, `"PT"`).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pml4 => "PML4",
            Self::Pdpt => "PDPT",
            Self::Pdt => "PDT",
            Self::Pt => "PT",
        }
    }

    /// The level visited after this one, or `None` for [`Pt`](Self::Pt).
    #[inline]
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pml4 => Some(Self::Pdpt),
            Self::Pdpt => Some(Self::Pdt),
            Self::Pdt => Some(Self::Pt),
            Self::Pt => None,
        }
    }

    /// Whether entries of this level point at the destination page rather than a table.
    #[inline]
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Pt)
    }
}

impl fmt::Display for PagingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
