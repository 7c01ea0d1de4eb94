//! Host lifecycle bootstrap
//!
//! [`BootstrapBridge::on_host_ready`] is the single callback the host
//! fires at its creation event. It loads the native module (idempotent)
//! and then calls the entry symbol exactly once. Both failure kinds are
//! terminal: a failed bridge never loads or invokes again.

use crate::entry_point::{EntryPoint, EntryResolver, SymbolResolver};
use crate::errors::BridgeError;
use crate::library_loader::{LibraryLoader, NativeModuleHandle};
use crate::utils::{ENTRY_SYMBOL, NATIVE_MODULE};
use nfbridge_logger as logger;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Lifecycle of a bridge; `Invoked` and `Failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    NotStarted,
    Loaded,
    Invoked,
    Failed,
}

impl BridgeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BridgeState::Invoked | BridgeState::Failed)
    }
}

/// What a successful `on_host_ready` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The entry point ran during this call
    Invoked,
    /// An earlier call already ran the entry point; nothing was done
    AlreadyInvoked,
    /// Another call is still loading or inside the entry point; nothing was done
    InProgress,
}

/// The native module and entry symbol a bridge targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub identifier: String,
    pub entry_symbol: String,
}

impl ModuleSpec {
    pub fn new(identifier: impl Into<String>, entry_symbol: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            entry_symbol: entry_symbol.into(),
        }
    }
}

impl Default for ModuleSpec {
    /// The driver module baked into the bridge
    fn default() -> Self {
        Self::new(NATIVE_MODULE, ENTRY_SYMBOL)
    }
}

struct Progress {
    state: BridgeState,
    history: Vec<BridgeState>,
    /// Set once a call has taken ownership of the load-then-invoke sequence
    claimed: bool,
    failure: Option<BridgeError>,
}

/// Hands control from the host to the native entry point
pub struct BootstrapBridge<'l, R: EntryResolver = SymbolResolver> {
    loader: &'l LibraryLoader,
    spec: ModuleSpec,
    resolver: R,
    progress: Mutex<Progress>,
}

/// Process-wide bridge over the process-wide loader
static GLOBAL_BRIDGE: OnceCell<BootstrapBridge<'static>> = OnceCell::new();

impl BootstrapBridge<'static> {
    /// Get or initialize the process-wide bridge for the baked-in module
    pub fn global() -> &'static BootstrapBridge<'static> {
        GLOBAL_BRIDGE.get_or_init(|| {
            BootstrapBridge::with_loader(LibraryLoader::global(), ModuleSpec::default())
        })
    }
}

impl<'l> BootstrapBridge<'l> {
    /// Bridge that binds the real exported entry symbol
    pub fn with_loader(loader: &'l LibraryLoader, spec: ModuleSpec) -> Self {
        Self::new(loader, spec, SymbolResolver)
    }
}

impl<'l, R: EntryResolver> BootstrapBridge<'l, R> {
    pub fn new(loader: &'l LibraryLoader, spec: ModuleSpec, resolver: R) -> Self {
        Self {
            loader,
            spec,
            resolver,
            progress: Mutex::new(Progress {
                state: BridgeState::NotStarted,
                history: vec![BridgeState::NotStarted],
                claimed: false,
                failure: None,
            }),
        }
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn state(&self) -> BridgeState {
        self.progress.lock().state
    }

    /// Every state entered so far, starting with `NotStarted`
    pub fn history(&self) -> Vec<BridgeState> {
        self.progress.lock().history.clone()
    }

    /// Host creation callback: load the module, then call the entry point once
    ///
    /// Repeated creation events never re-invoke the entry point. After
    /// success they are no-ops (`AlreadyInvoked`); after a failure they
    /// return [`BridgeError::PreviouslyFailed`] without touching the loader.
    pub fn on_host_ready(&self) -> Result<BootstrapOutcome, BridgeError> {
        {
            let mut progress = self.progress.lock();
            let state = progress.state;
            match state {
                BridgeState::Invoked => {
                    logger::debug(&format!(
                        "Entry point '{}' already invoked; ignoring repeated host creation event",
                        self.spec.entry_symbol
                    ));
                    return Ok(BootstrapOutcome::AlreadyInvoked);
                }
                BridgeState::Failed => {
                    let reason = progress
                        .failure
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    return Err(BridgeError::PreviouslyFailed(reason));
                }
                BridgeState::Loaded => return Ok(BootstrapOutcome::InProgress),
                BridgeState::NotStarted if progress.claimed => {
                    return Ok(BootstrapOutcome::InProgress)
                }
                BridgeState::NotStarted => progress.claimed = true,
            }
        }

        let start_time = Instant::now();
        logger::step(&format!(
            "Host ready; bootstrapping native module '{}'",
            self.spec.identifier
        ));

        let module = match self.loader.load(&self.spec.identifier) {
            Ok(module) => module,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.transition(BridgeState::Loaded);

        let entry = match self.resolver.resolve(&module, &self.spec.entry_symbol) {
            Ok(entry) => entry,
            Err(e) => return Err(self.fail(e.into())),
        };

        logger::debug(&format!(
            "Invoking entry point '{}' in '{}'",
            self.spec.entry_symbol,
            module.identifier()
        ));
        // A panic must not leave the bridge claimed but unfinished.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| entry.invoke())) {
            self.fail(BridgeError::EntryPanicked {
                module: module.identifier().to_string(),
                symbol: self.spec.entry_symbol.clone(),
                message: panic_message(payload.as_ref()),
            });
            panic::resume_unwind(payload);
        }
        self.transition(BridgeState::Invoked);

        logger::debug(&format!(
            "Native bootstrap completed in: {:?}",
            start_time.elapsed()
        ));
        Ok(BootstrapOutcome::Invoked)
    }

    fn transition(&self, next: BridgeState) {
        let mut progress = self.progress.lock();
        progress.state = next;
        progress.history.push(next);
        tracing::debug!(module = %self.spec.identifier, state = ?next, "bootstrap transition");
    }

    fn fail(&self, error: BridgeError) -> BridgeError {
        tracing::warn!(module = %self.spec.identifier, %error, "native bootstrap failed");
        logger::debug(&format!("Native bootstrap aborted: {}", error));

        let mut progress = self.progress.lock();
        progress.state = BridgeState::Failed;
        progress.history.push(BridgeState::Failed);
        progress.failure = Some(error.clone());
        error
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<R: EntryResolver> std::fmt::Debug for BootstrapBridge<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapBridge")
            .field("spec", &self.spec)
            .field("state", &self.state())
            .finish()
    }
}

/// Result of loading a module and binding its entry symbol without calling it
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub module: NativeModuleHandle,
    pub entry_symbol: String,
}

/// Check that `spec` would bootstrap, without invoking the entry point
///
/// The module stays loaded afterwards, as with any load.
pub fn probe(loader: &LibraryLoader, spec: &ModuleSpec) -> Result<ProbeReport, BridgeError> {
    let module = loader.load(&spec.identifier)?;
    SymbolResolver.resolve(&module, &spec.entry_symbol)?;
    Ok(ProbeReport {
        module,
        entry_symbol: spec.entry_symbol.clone(),
    })
}
