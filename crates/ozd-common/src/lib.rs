//! Common utilities for the OZD probe toolkit.
//!
//! This crate provides the pieces shared by the binary readers in the workspace:
//!
//! - [`BinaryReader`] - Zero-copy little-endian reading from byte slices
//! - [`Error`] / [`Result`] - Errors raised while reading

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;
