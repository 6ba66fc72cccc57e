//! PE export directory reader.
//!
//! Lists the symbols a Windows DLL exports by reading the image from disk.
//! The library is never loaded, so this works on any host and against DLLs
//! built for a different architecture (the OZD library is 32-bit).
//!
//! # Layout
//!
//! - `MZ` DOS header, `e_lfanew` at offset `0x3C`
//! - `PE\0\0` signature followed by the COFF file header
//! - Optional header (PE32 or PE32+) ending in the data directories
//! - Section table, used to map RVAs to file offsets
//! - Export directory (data directory 0): name, ordinal and function tables
//!
//! # Example
//!
//! ```no_run
//! use ozd_pe::ExportTable;
//!
//! let table = ExportTable::open("ozd.dll")?;
//! for export in &table.entries {
//!     println!("{} (ordinal {}, RVA {:#010x})", export.name, export.ordinal, export.rva);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod exports;
mod headers;

pub use error::{Error, Result};
pub use exports::{Export, ExportTable};
pub use headers::{CoffHeader, DataDirectory, ExportDirectory, Machine, SectionHeader};
