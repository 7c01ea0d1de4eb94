//! Native bootstrap bridge
//!
//! Loads the native driver module into the process once and calls its
//! entry symbol when the host signals creation:
//!
//! 1. `LibraryLoader` maps the module (idempotent, never unloaded)
//! 2. `BootstrapBridge` binds the entry symbol and invokes it at most once
//!
//! Hosts that only need the baked-in module call [`on_host_ready`].

pub mod bootstrap;
pub mod entry_point;
pub mod errors;
pub mod library_loader;
mod utils;

pub use bootstrap::{probe, BootstrapBridge, BootstrapOutcome, BridgeState, ModuleSpec, ProbeReport};
pub use entry_point::{EntryPoint, EntryResolver, NativeEntryPoint, SymbolResolver};
pub use errors::{BridgeError, LoadError, SymbolResolutionError};
pub use library_loader::{LibraryLoader, NativeModuleHandle};
pub use utils::{library_file_name, ENTRY_SYMBOL, NATIVE_MODULE};

/// Host creation callback for the process-wide bridge
///
/// Any error is a fatal startup failure for the host to report.
pub fn on_host_ready() -> Result<(), BridgeError> {
    BootstrapBridge::global().on_host_ready().map(|_| ())
}
