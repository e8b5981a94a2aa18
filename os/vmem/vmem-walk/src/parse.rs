//! # Integer Arguments
//!
//! Base-0 integer parsing for command arguments: the prefix decides the radix.
//!
//! | Input | Radix |
//! |-------|-------|
//! | `0x1000`, `0X1000` | 16 |
//! | `0o10000`, `010000` | 8 |
//! | `0b1000000000000` | 2 |
//! | `4096`, `0` | 10 |

use crate::error::TranslationError;
use alloc::borrow::ToOwned;
use vmem_addresses::VirtualAddress;

/// Parse an unsigned integer literal, choosing the radix from its prefix.
///
/// Surrounding whitespace is ignored. Signs, empty digit strings and values
/// that do not fit into `u64` are rejected.
#[must_use]
pub fn parse_integer(text: &str) -> Option<u64> {
    let text = text.trim();
    let (digits, radix) = split_radix(text);

    // from_str_radix would accept a leading '+'
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }

    u64::from_str_radix(digits, radix).ok()
}

/// Parse a command argument as a virtual address.
///
/// # Errors
/// [`TranslationError::InvalidArgument`] if `text` is not an integer literal.
pub fn parse_address(text: &str) -> Result<VirtualAddress, TranslationError> {
    parse_integer(text)
        .map(VirtualAddress::new)
        .ok_or_else(|| TranslationError::InvalidArgument {
            input: text.trim().to_owned(),
        })
}

fn split_radix(text: &str) -> (&str, u32) {
    let bytes = text.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return (text, 10);
    }

    match bytes[1] {
        b'x' | b'X' => (&text[2..], 16),
        b'o' | b'O' => (&text[2..], 8),
        b'b' | b'B' => (&text[2..], 2),
        _ => (&text[1..], 8),
    }
}
