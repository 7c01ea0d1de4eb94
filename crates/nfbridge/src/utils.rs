//! Platform-specific native module naming
//!
//! A bare identifier such as `NFDriverApp` follows the host runtime's
//! `loadLibrary` convention and is expanded to the platform file name
//! (`libNFDriverApp.so`, `libNFDriverApp.dylib`, `NFDriverApp.dll`).

use std::ffi::OsString;
use std::path::{self, Path};

/// Identifier of the native driver module baked into the bridge
pub const NATIVE_MODULE: &str = "NFDriverApp";

/// Symbol the native driver module exports as its entry point
pub const ENTRY_SYMBOL: &str = "nativeMain";

/// True when the identifier names a file by path rather than by module name
pub fn is_explicit_path(identifier: &str) -> bool {
    identifier.chars().any(path::is_separator)
}

/// Map a module identifier to the file name the platform linker expects
///
/// Identifiers that already carry an extension (`libc.so.6`) are kept as-is.
pub fn library_file_name(identifier: &str) -> OsString {
    if Path::new(identifier).extension().is_some() {
        OsString::from(identifier)
    } else {
        libloading::library_filename(identifier)
    }
}
