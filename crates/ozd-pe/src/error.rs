//! Error types for the PE crate.

use thiserror::Error;

/// Errors that can occur when reading a PE image.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] ozd_common::Error),

    /// Missing `MZ` DOS signature.
    #[error("not a PE image: missing MZ signature")]
    NotMz,

    /// Missing `PE\0\0` signature at `e_lfanew`.
    #[error("invalid PE signature at offset {0:#x}")]
    InvalidPeSignature(usize),

    /// Unknown optional header magic.
    #[error("unsupported optional header magic: {0:#06x}")]
    UnsupportedOptionalHeader(u16),

    /// An RVA does not fall inside any section.
    #[error("RVA {0:#010x} is not mapped by any section")]
    UnmappedRva(u32),

    /// Ordinal table points past the function table.
    #[error("ordinal index {index} exceeds function count {count}")]
    OrdinalOutOfRange { index: u16, count: u32 },

    /// Ordinal base plus index does not fit in 32 bits.
    #[error("ordinal base {base} plus index {index} overflows")]
    OrdinalOverflow { base: u32, index: u16 },
}

/// Result type for PE operations.
pub type Result<T> = std::result::Result<T, Error>;
