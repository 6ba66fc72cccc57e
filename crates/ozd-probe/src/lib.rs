//! Probes against the native OZD conversion library.
//!
//! The library's exports and calling convention are undocumented, so this
//! crate guesses:
//!
//! - [`ConversionProbe`] tries a sequence of [`CallShape`]s until one leaves
//!   an output file behind
//! - [`DiscoveryProbe`] reports which plausible entry point names resolve,
//!   without calling any of them
//!
//! Both go through the [`EntryPoints`] trait; [`NativeLibrary`] is the
//! `libloading` implementation.
//!
//! # Example
//!
//! ```no_run
//! use ozd_probe::{default_library_path, ConversionProbe};
//!
//! let probe = ConversionProbe::new(default_library_path()?);
//! let report = probe.run("bg_3_1.ozd", "bg_3_1.dds")?;
//! println!("converted with {}", report.winner().unwrap());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod convert;
pub mod discover;
mod error;
mod library;

pub use convert::{Attempt, AttemptOutcome, CallShape, ConversionProbe, ConversionReport, OZD_TAG};
pub use discover::{candidate_list, discover, DiscoveryProbe, DiscoveryReport, DEFAULT_CANDIDATES};
pub use error::{Error, Result};
pub use library::{default_library_path, EntryPoints, NativeLibrary, LIBRARY_NAME};
