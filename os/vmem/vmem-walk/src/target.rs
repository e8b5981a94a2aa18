//! # Target Memory/Register Interface
//!
//! The walker never touches hardware. Everything it knows about the target
//! comes through [`TargetAccess`]: one register read for the root table and
//! one 8-byte physical read per level.

use alloc::string::String;
use vmem_addresses::PhysicalAddress;

/// Errors reported by a [`TargetAccess`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("unknown register `{0}`")]
    UnknownRegister(String),
    #[error("target is running; stop it first")]
    NotStopped,
    #[error("address {0:#x} is not backed by target memory")]
    OutOfRange(u64),
    #[error("{0}")]
    Backend(String),
}

/// Read access to a stopped target.
///
/// Implementations decide how physical memory is reached (a memory image, a
/// monitor command, a direct-mapped window; see [`PhysicalWindow`]). The walker
/// only ever hands them true physical addresses.
pub trait TargetAccess {
    /// Current value of the register called `name` (e.g. `"cr3"`).
    ///
    /// # Errors
    /// [`TargetError::UnknownRegister`] for names the target does not have,
    /// [`TargetError::NotStopped`] while the target is running.
    fn read_register(&mut self, name: &str) -> Result<u64, TargetError>;

    /// Eight bytes at `address`, interpreted as a little-endian `u64`.
    ///
    /// # Errors
    /// Any [`TargetError`] if the address cannot be read.
    fn read_physical_u64(&mut self, address: PhysicalAddress) -> Result<u64, TargetError>;
}

impl<T: TargetAccess + ?Sized> TargetAccess for &mut T {
    #[inline]
    fn read_register(&mut self, name: &str) -> Result<u64, TargetError> {
        (**self).read_register(name)
    }

    #[inline]
    fn read_physical_u64(&mut self, address: PhysicalAddress) -> Result<u64, TargetError> {
        (**self).read_physical_u64(address)
    }
}

/// How a debugger reaches physical memory.
///
/// Some debug front-ends can only dereference *virtual* addresses. Kernels
/// that keep a direct physical map expose every physical byte at a fixed
/// virtual offset; reading through that window is equivalent to a physical
/// read. Backends translate walker addresses with
/// [`debugger_address`](Self::debugger_address) before issuing a read.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PhysicalWindow {
    /// The backend reads physical addresses as-is.
    #[default]
    Identity,
    /// Physical address `pa` is visible at virtual address `base + pa`.
    DirectMap { base: u64 },
}

impl PhysicalWindow {
    /// A higher-half direct map rooted at PML4 slot 509.
    pub const HIGHER_HALF_DIRECT_MAP: u64 = 0xFFFF_FE80_0000_0000;

    /// The address to hand the debugger when reading `pa`.
    ///
    /// Returns `None` if the window cannot represent `pa`.
    #[inline]
    #[must_use]
    pub const fn debugger_address(self, pa: PhysicalAddress) -> Option<u64> {
        match self {
            Self::Identity => Some(pa.as_u64()),
            Self::DirectMap { base } => base.checked_add(pa.as_u64()),
        }
    }

    /// Whether reads go through a virtual window rather than physical memory.
    #[inline]
    #[must_use]
    pub const fn is_windowed(self) -> bool {
        matches!(self, Self::DirectMap { .. })
    }
}
