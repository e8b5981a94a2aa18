use crate::target::TargetError;
use alloc::string::String;
use vmem_addresses::{PagingLevel, PhysicalAddress};

/// Why a translation did not produce a physical address.
///
/// Every variant ends one translation attempt only; none of them is fatal to
/// the session that asked for it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    /// The textual virtual address is not an integer literal.
    #[error("invalid argument `{input}`: expected an integer such as 0x1000, 4096 or 010000")]
    InvalidArgument { input: String },

    /// The root table register could not be read.
    #[error("cannot read register {register}: {source}")]
    RegisterUnavailable {
        register: String,
        #[source]
        source: TargetError,
    },

    /// A table entry could not be read.
    #[error("cannot read {level} entry at physical address {address:#x}: {source}")]
    MemoryUnreadable {
        level: PagingLevel,
        address: PhysicalAddress,
        #[source]
        source: TargetError,
    },

    /// The present bit is clear at `level`; the walk stopped there.
    #[error("Address not mapped ({0} entry not present)")]
    NotMapped(PagingLevel),
}
