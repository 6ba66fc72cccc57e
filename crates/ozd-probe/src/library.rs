//! Native library handle.
//!
//! The calling convention of the OZD library is unknown. Every call shape is
//! a guess, declared here as a cdecl function pointer type.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use crate::{Error, Result};

/// `int f(const char* input, const char* output)`
type PathPairFn = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;

/// `int f(const char* input, const char* output, int tag)`
type TaggedPathPairFn = unsafe extern "C" fn(*const c_char, *const c_char, c_int) -> c_int;

/// `int f(char* input, int length, char* output)`
type BufferTransformFn = unsafe extern "C" fn(*mut c_char, c_int, *mut c_char) -> c_int;

/// Base name of the native library, without platform prefix or extension.
pub const LIBRARY_NAME: &str = "ozd";

/// The entry points a probe can exercise.
///
/// [`NativeLibrary`] implements this over FFI.
pub trait EntryPoints {
    /// Whether `symbol` resolves as an export. Never calls it.
    fn resolves(&self, symbol: &str) -> bool;

    /// Call `symbol` as `int f(const char*, const char*)`.
    fn call_path_pair(&self, symbol: &str, input: &CStr, output: &CStr) -> Result<i32>;

    /// Call `symbol` as `int f(const char*, const char*, int)`.
    fn call_tagged_path_pair(
        &self,
        symbol: &str,
        input: &CStr,
        output: &CStr,
        tag: i32,
    ) -> Result<i32>;

    /// Call `symbol` as `int f(char*, int, char*)`.
    ///
    /// `output` must be at least as large as the callee could write; the
    /// probe passes twice the input length.
    fn call_buffer_transform(&self, symbol: &str, input: &mut [u8], output: &mut [u8])
        -> Result<i32>;
}

impl<T: EntryPoints + ?Sized> EntryPoints for &T {
    fn resolves(&self, symbol: &str) -> bool {
        (**self).resolves(symbol)
    }

    fn call_path_pair(&self, symbol: &str, input: &CStr, output: &CStr) -> Result<i32> {
        (**self).call_path_pair(symbol, input, output)
    }

    fn call_tagged_path_pair(
        &self,
        symbol: &str,
        input: &CStr,
        output: &CStr,
        tag: i32,
    ) -> Result<i32> {
        (**self).call_tagged_path_pair(symbol, input, output, tag)
    }

    fn call_buffer_transform(
        &self,
        symbol: &str,
        input: &mut [u8],
        output: &mut [u8],
    ) -> Result<i32> {
        (**self).call_buffer_transform(symbol, input, output)
    }
}

/// A dynamically loaded native library.
#[derive(Debug)]
pub struct NativeLibrary {
    path: PathBuf,
    library: Library,
}

impl NativeLibrary {
    /// Load the library at `path`.
    ///
    /// Loading runs the library's initialisers, which is as trustworthy as
    /// the library itself.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading native library {}", path.display());

        let library = unsafe { Library::new(path) }.map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn symbol<T>(&self, symbol: &str) -> Result<Symbol<'_, T>> {
        unsafe { self.library.get::<T>(symbol.as_bytes()) }.map_err(|e| {
            log::debug!("{} does not resolve: {}", symbol, e);
            Error::SymbolMissing(symbol.to_string())
        })
    }
}

impl EntryPoints for NativeLibrary {
    fn resolves(&self, symbol: &str) -> bool {
        self.symbol::<unsafe extern "C" fn()>(symbol).is_ok()
    }

    fn call_path_pair(&self, symbol: &str, input: &CStr, output: &CStr) -> Result<i32> {
        let func = self.symbol::<PathPairFn>(symbol)?;
        Ok(unsafe { func(input.as_ptr(), output.as_ptr()) })
    }

    fn call_tagged_path_pair(
        &self,
        symbol: &str,
        input: &CStr,
        output: &CStr,
        tag: i32,
    ) -> Result<i32> {
        let func = self.symbol::<TaggedPathPairFn>(symbol)?;
        Ok(unsafe { func(input.as_ptr(), output.as_ptr(), tag) })
    }

    fn call_buffer_transform(
        &self,
        symbol: &str,
        input: &mut [u8],
        output: &mut [u8],
    ) -> Result<i32> {
        let length = c_int::try_from(input.len()).map_err(|_| Error::BufferTooLarge(input.len()))?;
        let func = self.symbol::<BufferTransformFn>(symbol)?;
        Ok(unsafe {
            func(
                input.as_mut_ptr().cast::<c_char>(),
                length,
                output.as_mut_ptr().cast::<c_char>(),
            )
        })
    }
}

/// Default location of the native library: next to the running executable,
/// using the platform's file name (`ozd.dll` on Windows).
pub fn default_library_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(libloading::library_filename(LIBRARY_NAME)))
}
