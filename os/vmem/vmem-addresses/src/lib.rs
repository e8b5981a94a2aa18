//! # Virtual and Physical Addresses for 4-Level Paging
//!
//! Strongly typed wrappers for the raw values a page walk deals with, so
//! virtual and physical addresses cannot be mixed up by accident.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`VirtualAddress`] | An address in the target's (translated) address space. |
//! | [`PhysicalAddress`] | A machine address, as stored in CR3 and page-table entries. |
//! | [`PagingLevel`] | One of the four tables visited by a walk. |
//! | [`TableIndex`] | A 9-bit index into a 512-entry table. |
//! | [`PageOffset`] | The 12-bit byte offset inside a 4 KiB page. |
//!
//! ## Virtual address layout
//!
//! ```text
//! | 63‒48 | 47‒39 | 38‒30 | 29‒21 | 20‒12 | 11‒0   |
//! | sign  |  PML4 |  PDPT |  PDT  |   PT  | Offset |
//! ```
//!
//! Bits 63‒48 of a canonical address are copies of bit 47. They play no part
//! in the walk; [`VirtualAddress::canonical`] restores them.
//!
//! ```rust
//! # use vmem_addresses::*;
//! let va = VirtualAddress::new(0xFFFF_8000_0020_1ABC);
//! assert_eq!(va.index(PagingLevel::Pml4).as_u64(), 256);
//! assert_eq!(va.index(PagingLevel::Pt).as_u64(), 1);
//! assert_eq!(va.page_offset().as_u64(), 0xABC);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod level;
mod page_offset;
mod physical_address;
mod table_index;
mod virtual_address;

pub use crate::level::PagingLevel;
pub use crate::page_offset::PageOffset;
pub use crate::physical_address::PhysicalAddress;
pub use crate::table_index::TableIndex;
pub use crate::virtual_address::VirtualAddress;

/// Size of a 4 KiB page in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// Number of low address bits selecting a byte inside a 4 KiB page.
pub const PAGE_SHIFT: u32 = 12;
