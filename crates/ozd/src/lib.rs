//! OZD probe toolkit.
//!
//! This crate provides a unified interface to the workspace crates used to
//! poke at the closed-source OZD conversion library.
//!
//! # Crates
//!
//! - [`ozd_common`] - Common utilities (binary reading, shared errors)
//! - [`ozd_probe`] - Conversion and symbol discovery probes (`libloading`)
//! - [`ozd_pe`] - PE export directory listing, read from disk
//! - [`ozd_dds`] - DDS header inspection of produced files
//!
//! # Example
//!
//! ```no_run
//! use ozd::prelude::*;
//!
//! let library = default_library_path()?;
//!
//! // What does the DLL actually export?
//! let exports = ExportTable::open(&library)?;
//! println!("{} exports", exports.len());
//!
//! // Try the guessed conversions and look at the result
//! let report = ConversionProbe::new(&library).run("bg_3_1.ozd", "bg_3_1.dds")?;
//! if report.winner().is_some() {
//!     let summary = inspect_file("bg_3_1.dds")?;
//!     println!("{}x{}", summary.width, summary.height);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use ozd_common as common;
pub use ozd_dds as dds;
pub use ozd_pe as pe;
pub use ozd_probe as probe;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ozd_common::BinaryReader;
    pub use ozd_dds::{inspect, inspect_file, DdsSummary};
    pub use ozd_pe::{Export, ExportTable, Machine};
    pub use ozd_probe::{
        candidate_list, default_library_path, AttemptOutcome, CallShape, ConversionProbe,
        ConversionReport, DiscoveryProbe, DiscoveryReport, EntryPoints, NativeLibrary,
    };
}
