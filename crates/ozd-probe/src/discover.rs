//! Symbol discovery probe.
//!
//! Checks which of a list of plausible entry point names the library exports.
//! Nothing that resolves is ever called.

use std::path::{Path, PathBuf};

use crate::library::{EntryPoints, NativeLibrary};
use crate::{Error, Result};

/// Names commonly exported by conversion DLLs.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "Convert",
    "Decrypt",
    "Encode",
    "Decode",
    "ProcessFile",
    "TransformFile",
    "OZDToDDS",
    "DDSToOZD",
    "ConvertOZD",
    "DecryptOZD",
    "EncryptDDS",
];

/// Result of a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Every name that was checked, in order.
    pub candidates: Vec<String>,
    /// The names that resolved, in candidate order.
    pub found: Vec<String>,
}

impl DiscoveryReport {
    /// Names that did not resolve.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.candidates
            .iter()
            .filter(|c| !self.found.contains(*c))
            .map(String::as_str)
    }
}

/// The default candidates followed by `extra`, without duplicates.
pub fn candidate_list<S: AsRef<str>>(extra: &[S]) -> Vec<String> {
    let mut names: Vec<String> = DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect();
    for name in extra {
        let name = name.as_ref();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Check each candidate against `library`.
pub fn discover<L, S>(library: &L, candidates: &[S]) -> DiscoveryReport
where
    L: EntryPoints + ?Sized,
    S: AsRef<str>,
{
    let mut report = DiscoveryReport::default();

    for name in candidates {
        let name = name.as_ref();
        report.candidates.push(name.to_string());

        if library.resolves(name) {
            log::debug!("found export {}", name);
            report.found.push(name.to_string());
        }
    }

    report
}

/// Loads a library and runs discovery against it.
#[derive(Debug, Clone)]
pub struct DiscoveryProbe {
    library_path: PathBuf,
    candidates: Vec<String>,
}

impl DiscoveryProbe {
    /// Create a probe for the library at `library_path` with the default candidates.
    pub fn new<P: Into<PathBuf>>(library_path: P) -> Self {
        Self {
            library_path: library_path.into(),
            candidates: candidate_list::<&str>(&[]),
        }
    }

    /// Replace the candidate list.
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Load the library and check every candidate.
    pub fn run(&self) -> Result<DiscoveryReport> {
        self.run_with(|p| NativeLibrary::open(p))
    }

    /// Like [`run`](Self::run) with a custom loader.
    pub fn run_with<L, F>(&self, load: F) -> Result<DiscoveryReport>
    where
        L: EntryPoints,
        F: FnOnce(&Path) -> Result<L>,
    {
        if !self.library_path.exists() {
            return Err(Error::LibraryNotFound(self.library_path.clone()));
        }

        let library = load(&self.library_path)?;
        Ok(discover(&library, &self.candidates))
    }
}
