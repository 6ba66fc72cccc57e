//! Conversion probe.
//!
//! Tries a fixed list of guessed call shapes against the native library and
//! stops at the first one that appears to work. "Appears to work" means the
//! output file exists afterwards (path shapes) or the call returned a
//! positive byte count (buffer shape). The output is never validated here.

use std::ffi::CString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::library::{EntryPoints, NativeLibrary};
use crate::{Error, Result};

/// Tag passed to tagged conversions to select the OZD format.
pub const OZD_TAG: i32 = 2;

/// A guessed signature for a conversion entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallShape {
    /// `int f(const char* input, const char* output)`
    PathPair { symbol: String },
    /// `int f(const char* input, const char* output, int tag)`
    TaggedPathPair { symbol: String, tag: i32 },
    /// `int f(char* input, int length, char* output)`, returning bytes written
    BufferTransform { symbol: String },
}

impl CallShape {
    pub fn path_pair(symbol: impl Into<String>) -> Self {
        Self::PathPair {
            symbol: symbol.into(),
        }
    }

    pub fn tagged_path_pair(symbol: impl Into<String>, tag: i32) -> Self {
        Self::TaggedPathPair {
            symbol: symbol.into(),
            tag,
        }
    }

    pub fn buffer_transform(symbol: impl Into<String>) -> Self {
        Self::BufferTransform {
            symbol: symbol.into(),
        }
    }

    /// The shapes tried by default, in order.
    pub fn default_sequence() -> Vec<Self> {
        vec![
            Self::path_pair("ImagenConvert"),
            Self::tagged_path_pair("ConvertFile", OZD_TAG),
            Self::buffer_transform("DecryptBuffer"),
        ]
    }

    /// The exported symbol this shape calls.
    pub fn symbol(&self) -> &str {
        match self {
            Self::PathPair { symbol }
            | Self::TaggedPathPair { symbol, .. }
            | Self::BufferTransform { symbol } => symbol,
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathPair { symbol } => write!(f, "{}(input, output)", symbol),
            Self::TaggedPathPair { symbol, tag } => write!(f, "{}(input, output, {})", symbol, tag),
            Self::BufferTransform { symbol } => write!(f, "{}(buffer, length, output)", symbol),
        }
    }
}

/// What a single attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The call returned and output appeared.
    Succeeded { status: i32 },
    /// The call returned but produced nothing.
    NoEffect { status: i32 },
    /// The attempt could not be made or the call failed.
    Failed(String),
}

/// One call shape and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub shape: CallShape,
    pub outcome: AttemptOutcome,
}

/// Per-attempt log of a conversion probe run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Attempts in the order they were made.
    pub attempts: Vec<Attempt>,
    /// The output path existed before the first attempt, so existence
    /// checks could not tell attempts apart.
    pub output_preexisted: bool,
}

impl ConversionReport {
    /// The shape that produced output, if any.
    pub fn winner(&self) -> Option<&CallShape> {
        self.attempts
            .iter()
            .find(|a| matches!(a.outcome, AttemptOutcome::Succeeded { .. }))
            .map(|a| &a.shape)
    }
}

/// Runs guessed call shapes against a native library until one produces output.
#[derive(Debug, Clone)]
pub struct ConversionProbe {
    library_path: PathBuf,
    shapes: Vec<CallShape>,
}

impl ConversionProbe {
    /// Create a probe for the library at `library_path` using the default shapes.
    pub fn new<P: Into<PathBuf>>(library_path: P) -> Self {
        Self {
            library_path: library_path.into(),
            shapes: CallShape::default_sequence(),
        }
    }

    /// Replace the list of shapes to try.
    pub fn with_shapes(mut self, shapes: Vec<CallShape>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn shapes(&self) -> &[CallShape] {
        &self.shapes
    }

    /// Load the native library and convert `input` into `output`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<ConversionReport> {
        self.run_with(|p| NativeLibrary::open(p), input, output)
    }

    /// Like [`run`](Self::run) with a custom loader.
    ///
    /// The loader is only called once both the library and the input exist.
    pub fn run_with<L, F, P, Q>(&self, load: F, input: P, output: Q) -> Result<ConversionReport>
    where
        L: EntryPoints,
        F: FnOnce(&Path) -> Result<L>,
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let (input, output) = (input.as_ref(), output.as_ref());

        if !self.library_path.exists() {
            return Err(Error::LibraryNotFound(self.library_path.clone()));
        }
        if !input.exists() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }

        let library = load(&self.library_path)?;

        let mut report = ConversionReport {
            attempts: Vec::with_capacity(self.shapes.len()),
            output_preexisted: output.exists(),
        };
        if report.output_preexisted {
            log::warn!(
                "{} already exists, the first path attempt will count as a success",
                output.display()
            );
        }

        for shape in &self.shapes {
            log::debug!("trying {}", shape);

            let outcome = match attempt(&library, shape, input, output) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("{} failed: {}", shape, e);
                    AttemptOutcome::Failed(e.to_string())
                }
            };
            let succeeded = matches!(outcome, AttemptOutcome::Succeeded { .. });

            report.attempts.push(Attempt {
                shape: shape.clone(),
                outcome,
            });

            if succeeded {
                log::info!("{} produced {}", shape, output.display());
                return Ok(report);
            }
        }

        Err(Error::AllAttemptsFailed(report))
    }
}

/// Make one call. The symbol is resolved before anything else happens.
///
/// An empty input fails the buffer shape without calling the library: a
/// zero-length buffer gives the callee nothing to transform and a zero-byte
/// output buffer to write into.
fn attempt<L: EntryPoints>(
    library: &L,
    shape: &CallShape,
    input: &Path,
    output: &Path,
) -> Result<AttemptOutcome> {
    let symbol = shape.symbol();
    if !library.resolves(symbol) {
        return Err(Error::SymbolMissing(symbol.to_string()));
    }

    match shape {
        CallShape::PathPair { .. } => {
            let status = library.call_path_pair(symbol, &c_path(input)?, &c_path(output)?)?;
            Ok(judge_by_existence(status, output))
        }
        CallShape::TaggedPathPair { tag, .. } => {
            let status =
                library.call_tagged_path_pair(symbol, &c_path(input)?, &c_path(output)?, *tag)?;
            Ok(judge_by_existence(status, output))
        }
        CallShape::BufferTransform { .. } => {
            let mut data = fs::read(input)?;
            if data.is_empty() {
                return Err(Error::EmptyInput);
            }
            let mut buffer = vec![0u8; data.len() * 2];

            let status = library.call_buffer_transform(symbol, &mut data, &mut buffer)?;
            if status <= 0 {
                return Ok(AttemptOutcome::NoEffect { status });
            }

            let written = (status as usize).min(buffer.len());
            fs::write(output, &buffer[..written])?;
            Ok(AttemptOutcome::Succeeded { status })
        }
    }
}

fn judge_by_existence(status: i32, output: &Path) -> AttemptOutcome {
    if output.exists() {
        AttemptOutcome::Succeeded { status }
    } else {
        AttemptOutcome::NoEffect { status }
    }
}

/// Paths are handed to the library as NUL-terminated UTF-8.
fn c_path(path: &Path) -> Result<CString> {
    let s = path
        .to_str()
        .ok_or_else(|| Error::NonUtf8Path(path.to_path_buf()))?;
    CString::new(s).map_err(|_| Error::InteriorNul(s.to_string()))
}
