//! # Page-Table Walks for Stopped x86-64 Targets
//!
//! Translates virtual addresses of a target that is halted under a debugger
//! by reading its page tables through a [`TargetAccess`] implementation.
//!
//! ## What you get
//! - A [`PageWalker`] that follows CR3 → PML4 → PDPT → PDT → PT.
//! - A pure [`decode`] function producing a [`FlagReport`] per entry.
//! - [`parse_address`] for base-0 integer arguments (`0x…`, `0…`, decimal).
//! - A single error type, [`TranslationError`].
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use vmem_walk::*;
//!
//! struct Snapshot(HashMap<u64, u64>);
//!
//! impl TargetAccess for Snapshot {
//!     fn read_register(&mut self, name: &str) -> Result<u64, TargetError> {
//!         match name {
//!             "cr3" => Ok(0x1000),
//!             _ => Err(TargetError::UnknownRegister(name.into())),
//!         }
//!     }
//!
//!     fn read_physical_u64(&mut self, pa: PhysicalAddress) -> Result<u64, TargetError> {
//!         self.0.get(&pa.as_u64()).copied().ok_or(TargetError::OutOfRange(pa.as_u64()))
//!     }
//! }
//!
//! let memory = HashMap::from([
//!     (0x1000, 0x2001), // PML4[0] -> PDPT at 0x2000
//!     (0x2000, 0x3001), // PDPT[0] -> PDT at 0x3000
//!     (0x3000, 0x4001), // PDT[0]  -> PT at 0x4000
//!     (0x4000, 0x9001), // PT[0]   -> page at 0x9000
//! ]);
//!
//! let mut walker = PageWalker::new(Snapshot(memory));
//! let va = parse_address("0x10")?;
//! let mut lines = Vec::new();
//! let t = walker.translate_observed(va, &mut |r: &FlagReport| lines.push(r.to_string()))?;
//! assert_eq!(t.physical_address.as_u64(), 0x9010);
//! assert_eq!(lines.len(), 4);
//! # Ok::<(), TranslationError>(())
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod entry;
mod error;
mod flags;
mod parse;
mod target;
mod walker;

pub use crate::entry::PageEntryBits;
pub use crate::error::TranslationError;
pub use crate::flags::{FlagReport, decode};
pub use crate::parse::{parse_address, parse_integer};
pub use crate::target::{PhysicalWindow, TargetAccess, TargetError};
pub use crate::walker::{EntryObserver, PageWalker, Translation};

pub use vmem_addresses::{PagingLevel, PhysicalAddress, VirtualAddress};
