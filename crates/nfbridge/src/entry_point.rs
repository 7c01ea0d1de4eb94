//! The native entry point contract
//!
//! The bridge only needs "a zero-argument callable bound to a fixed
//! symbol name". [`EntryPoint`] is that capability; [`EntryResolver`]
//! produces it from a loaded module. [`SymbolResolver`] binds the real
//! exported symbol, and tests substitute their own resolver.

use crate::errors::SymbolResolutionError;
use crate::library_loader::NativeModuleHandle;

/// A zero-argument call into native code
pub trait EntryPoint {
    fn invoke(&self);
}

impl<F: Fn()> EntryPoint for F {
    fn invoke(&self) {
        self();
    }
}

/// Binds an entry symbol inside a loaded module
pub trait EntryResolver {
    type Entry: EntryPoint;

    fn resolve(
        &self,
        module: &NativeModuleHandle,
        symbol: &str,
    ) -> Result<Self::Entry, SymbolResolutionError>;
}

/// Entry point backed by an exported `extern "C" fn()`
#[derive(Debug, Clone, Copy)]
pub struct NativeEntryPoint {
    func: extern "C" fn(),
}

impl EntryPoint for NativeEntryPoint {
    fn invoke(&self) {
        (self.func)();
    }
}

/// Resolves entry symbols from the module's export table
#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolResolver;

impl EntryResolver for SymbolResolver {
    type Entry = NativeEntryPoint;

    fn resolve(
        &self,
        module: &NativeModuleHandle,
        symbol: &str,
    ) -> Result<NativeEntryPoint, SymbolResolutionError> {
        let failure = |reason: String| SymbolResolutionError {
            module: module.identifier().to_string(),
            symbol: symbol.to_string(),
            reason,
        };

        if symbol.is_empty() || symbol.contains('\0') {
            return Err(failure("symbol name must be non-empty and NUL-free".to_string()));
        }

        // The module contract declares the entry symbol as `extern "C" fn()`;
        // the signature itself cannot be checked at runtime. The library is
        // never unloaded, so the copied pointer outlives the `Symbol` guard.
        let func = unsafe {
            module
                .library()
                .get::<extern "C" fn()>(symbol.as_bytes())
                .map(|sym| *sym)
                .map_err(|e| failure(e.to_string()))?
        };

        Ok(NativeEntryPoint { func })
    }
}
