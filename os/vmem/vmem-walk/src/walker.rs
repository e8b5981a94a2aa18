//! # Page Walker
//!
//! Software rendition of the hardware walk for 4 KiB pages:
//!
//! ```text
//!  CR3 ─► PML4[va 47‒39] ─► PDPT[va 38‒30] ─► PDT[va 29‒21] ─► PT[va 20‒12] ─► page + va 11‒0
//! ```
//!
//! Each step reads one 8-byte entry at `table base + index × 8`, decodes it,
//! stops if the present bit is clear and otherwise continues at the entry's
//! frame (bits 51‒12). Large pages are not special-cased: a set PS bit at the
//! PDPT or PDT level is walked like any other entry.

use crate::error::TranslationError;
use crate::flags::{FlagReport, decode};
use crate::target::TargetAccess;
use alloc::string::String;
use log::{debug, trace};
use vmem_addresses::{PagingLevel, PhysicalAddress, VirtualAddress};
use vmem_registers::{Cr3, RegisterSnapshot};

/// Receives the decoded entry of every level a walk visits.
///
/// Called once per level, in walk order, *before* the presence check, so the
/// entry that ends a failed walk is observed as well.
pub trait EntryObserver {
    fn observe(&mut self, report: &FlagReport);
}

impl<F> EntryObserver for F
where
    F: FnMut(&FlagReport),
{
    #[inline]
    fn observe(&mut self, report: &FlagReport) {
        self(report);
    }
}

/// A successful translation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Translation {
    pub virtual_address: VirtualAddress,
    pub physical_address: PhysicalAddress,
    /// Decoded PML4, PDPT, PDT and PT entries, in walk order.
    pub entries: [FlagReport; 4],
}

impl Translation {
    /// The decoded entry of `level`.
    #[inline]
    #[must_use]
    pub const fn entry(&self, level: PagingLevel) -> &FlagReport {
        &self.entries[level as usize]
    }
}

/// Walks the page tables of one target.
///
/// Holds no state between calls besides the target handle and the name of
/// the root table register.
pub struct PageWalker<T> {
    target: T,
    root_register: String,
}

impl<T: TargetAccess> PageWalker<T> {
    /// A walker that reads the PML4 base from `cr3`.
    #[must_use]
    pub fn new(target: T) -> Self {
        Self::with_root_register(target, Cr3::NAME)
    }

    /// A walker that reads the PML4 base from the register called `register`.
    #[must_use]
    pub fn with_root_register(target: T, register: impl Into<String>) -> Self {
        Self {
            target,
            root_register: register.into(),
        }
    }

    /// Name of the register holding the PML4 base.
    #[must_use]
    pub fn root_register(&self) -> &str {
        &self.root_register
    }

    #[must_use]
    pub const fn target(&self) -> &T {
        &self.target
    }

    /// Translate `va` to a physical address.
    ///
    /// # Errors
    /// See [`translate_observed`](Self::translate_observed).
    pub fn translate(&mut self, va: VirtualAddress) -> Result<Translation, TranslationError> {
        self.translate_observed(va, &mut |_: &FlagReport| {})
    }

    /// Translate `va`, handing every decoded entry to `observer`.
    ///
    /// Performs one register read and at most four memory reads.
    ///
    /// # Errors
    /// - [`TranslationError::RegisterUnavailable`] if the root register cannot be read.
    /// - [`TranslationError::MemoryUnreadable`] if an entry cannot be read.
    /// - [`TranslationError::NotMapped`] at the first entry without the present bit.
    pub fn translate_observed<O>(
        &mut self,
        va: VirtualAddress,
        observer: &mut O,
    ) -> Result<Translation, TranslationError>
    where
        O: EntryObserver + ?Sized,
    {
        let root = self.read_root()?;
        debug!(
            "walking {va:?}: {reg}={raw:#x}, PML4 at {base:?}",
            reg = self.root_register,
            raw = root.raw(),
            base = root.pml4_base()
        );

        let mut entries = PagingLevel::WALK_ORDER.map(|level| decode(level, 0));
        let mut base = root.pml4_base();

        for (slot, level) in entries.iter_mut().zip(PagingLevel::WALK_ORDER) {
            let index = va.index(level);
            let address = base.entry(index);
            let value = self
                .target
                .read_physical_u64(address)
                .map_err(|source| TranslationError::MemoryUnreadable {
                    level,
                    address,
                    source,
                })?;

            let report = decode(level, value);
            trace!("{level}[{index}] at {address:?}: {report}");
            observer.observe(&report);

            if !report.present {
                debug!("{va:?} not mapped: {level} entry {index} not present");
                return Err(TranslationError::NotMapped(level));
            }

            base = report.frame();
            *slot = report;
        }

        let physical_address = base.with_offset(va.page_offset());
        debug!("{va:?} -> {physical_address:?}");

        Ok(Translation {
            virtual_address: va,
            physical_address,
            entries,
        })
    }

    fn read_root(&mut self) -> Result<Cr3, TranslationError> {
        self.target
            .read_register(&self.root_register)
            .map(Cr3::from_raw)
            .map_err(|source| TranslationError::RegisterUnavailable {
                register: self.root_register.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetError;
    use alloc::vec::Vec;

    /// Target whose memory holds the same entry everywhere.
    struct Uniform {
        cr3: u64,
        entry: u64,
        reads: Vec<PhysicalAddress>,
    }

    impl TargetAccess for Uniform {
        fn read_register(&mut self, name: &str) -> Result<u64, TargetError> {
            match name {
                "cr3" => Ok(self.cr3),
                other => Err(TargetError::UnknownRegister(other.into())),
            }
        }

        fn read_physical_u64(&mut self, address: PhysicalAddress) -> Result<u64, TargetError> {
            self.reads.push(address);
            Ok(self.entry)
        }
    }

    #[test]
    fn identity_chain_keeps_offset() {
        let base = 0x0000_0000_0042_0000;
        let mut walker = PageWalker::new(Uniform {
            cr3: base,
            entry: base | 1,
            reads: Vec::new(),
        });

        for va in [0, 0xFFF, 0xFFFF_8000_1234_5678, 0x0000_7FFF_FFFF_FABC, u64::MAX] {
            let t = walker.translate(VirtualAddress::new(va)).unwrap();
            assert_eq!(t.physical_address.as_u64(), base + (va & 0xFFF), "va {va:#x}");
        }
    }

    #[test]
    fn entry_addresses_follow_indices() {
        let mut walker = PageWalker::new(Uniform {
            cr3: 0x1000,
            entry: 0x1001,
            reads: Vec::new(),
        });
        let va = VirtualAddress::from_parts(
            [1, 2, 3, 4].map(vmem_addresses::TableIndex::new),
            vmem_addresses::PageOffset::new(0),
        );
        walker.translate(va).unwrap();
        let reads: Vec<u64> = walker.target().reads.iter().map(|a| a.as_u64()).collect();
        assert_eq!(reads, [0x1008, 0x1010, 0x1018, 0x1020]);
    }

    #[test]
    fn unknown_root_register() {
        let mut walker = PageWalker::with_root_register(
            Uniform {
                cr3: 0,
                entry: 0,
                reads: Vec::new(),
            },
            "cr9",
        );
        let err = walker.translate(VirtualAddress::zero()).unwrap_err();
        assert_eq!(
            err,
            TranslationError::RegisterUnavailable {
                register: "cr9".into(),
                source: TargetError::UnknownRegister("cr9".into()),
            }
        );
        assert!(walker.target().reads.is_empty());
    }

    #[test]
    fn entry_lookup_by_level() {
        let mut walker = PageWalker::new(Uniform {
            cr3: 0x5000,
            entry: 0x8000_0000_0000_5067,
            reads: Vec::new(),
        });
        let t = walker.translate(VirtualAddress::new(0x10)).unwrap();
        assert_eq!(t.entry(PagingLevel::Pdt).level, PagingLevel::Pdt);
        assert!(t.entry(PagingLevel::Pt).no_execute);
        assert!(t.entry(PagingLevel::Pt).dirty);
    }
}
