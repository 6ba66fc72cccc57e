//! DDS header inspection.
//!
//! The probe treats DDS output as opaque, but once a conversion attempt
//! leaves a file behind it is useful to know whether that file even starts
//! like a texture. This crate reads the fixed header (and the DX10 extension
//! when present) and summarises it. Pixel data is never decoded.
//!
//! # Example
//!
//! ```no_run
//! use ozd_dds::inspect_file;
//!
//! let summary = inspect_file("bg_3_1.dds")?;
//! println!("{}x{} {}", summary.width, summary.height, summary.format_label());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod inspect;

pub use error::{Error, Result};
pub use header::{DdsHeader, DdsHeaderDxt10, DdsPixelFormat, FourCC};
pub use inspect::{inspect, inspect_file, DdsSummary};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
