//! # Typed `X86_64` Control Registers
//!
//! Decoded views of the control registers a page walk starts from. The values
//! come from a debugger rather than from `mov` instructions, so every type here
//! is built from a raw `u64` snapshot via [`RegisterSnapshot`].

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod cr3;

pub use crate::cr3::Cr3;

/// A register whose value was captured from a stopped target.
pub trait RegisterSnapshot: Sized {
    /// Lower-case register name as debuggers spell it (e.g. `"cr3"`).
    const NAME: &'static str;

    /// Interpret a raw register value.
    fn from_raw(raw: u64) -> Self;

    /// The raw value this snapshot was built from.
    fn raw(&self) -> u64;
}
