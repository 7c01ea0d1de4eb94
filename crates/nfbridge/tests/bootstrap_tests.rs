//! Integration tests for the host creation callback
//!
//! The entry point is swapped for a counting double; modules come from
//! the system (libc on Linux) so real load and symbol lookup still run.

use nfbridge::{
    BootstrapBridge, BootstrapOutcome, BridgeError, BridgeState, EntryPoint, EntryResolver,
    LibraryLoader, LoadError, ModuleSpec, NativeModuleHandle, SymbolResolutionError,
    SymbolResolver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resolves the real symbol, then hands back a counter instead of calling it
#[derive(Default)]
struct CountingResolver {
    calls: Arc<AtomicUsize>,
}

struct CountingEntry {
    calls: Arc<AtomicUsize>,
}

impl EntryPoint for CountingEntry {
    fn invoke(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl EntryResolver for CountingResolver {
    type Entry = CountingEntry;

    fn resolve(
        &self,
        module: &NativeModuleHandle,
        symbol: &str,
    ) -> Result<CountingEntry, SymbolResolutionError> {
        SymbolResolver.resolve(module, symbol)?;
        Ok(CountingEntry {
            calls: Arc::clone(&self.calls),
        })
    }
}

impl CountingResolver {
    fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[test]
fn test_missing_module_fails_before_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let loader = LibraryLoader::new(vec![dir.path().to_path_buf()]);
    let resolver = CountingResolver::default();
    let calls = resolver.calls();
    let bridge = BootstrapBridge::new(
        &loader,
        ModuleSpec::new("NFDriverAppMissing", "nativeMain"),
        resolver,
    );

    let err = bridge.on_host_ready().unwrap_err();
    assert!(matches!(err, BridgeError::Load(LoadError::SearchFailed { .. })));
    assert_eq!(bridge.state(), BridgeState::Failed);
    assert_eq!(
        bridge.history(),
        vec![BridgeState::NotStarted, BridgeState::Failed]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failure_is_final() {
    let loader = LibraryLoader::new(Vec::new());
    let resolver = CountingResolver::default();
    let calls = resolver.calls();
    let bridge = BootstrapBridge::new(&loader, ModuleSpec::new("", "nativeMain"), resolver);

    let first = bridge.on_host_ready().unwrap_err();
    assert!(matches!(
        first,
        BridgeError::Load(LoadError::InvalidIdentifier(_))
    ));

    match bridge.on_host_ready() {
        Err(BridgeError::PreviouslyFailed(reason)) => assert_eq!(reason, first.to_string()),
        other => panic!("expected PreviouslyFailed, got {:?}", other),
    }
    assert_eq!(
        bridge.history(),
        vec![BridgeState::NotStarted, BridgeState::Failed]
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use once_cell::sync::{Lazy, OnceCell};
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Mutex;

    const SYSTEM_MODULE: &str = "libc.so.6";
    /// Zero-argument libc function standing in for the driver entry point
    const SYSTEM_ENTRY: &str = "sched_yield";

    #[test]
    fn test_successful_bootstrap_invokes_once() {
        let loader = LibraryLoader::new(Vec::new());
        let resolver = CountingResolver::default();
        let calls = resolver.calls();
        let bridge =
            BootstrapBridge::new(&loader, ModuleSpec::new(SYSTEM_MODULE, SYSTEM_ENTRY), resolver);

        assert_eq!(bridge.on_host_ready().unwrap(), BootstrapOutcome::Invoked);
        assert_eq!(bridge.state(), BridgeState::Invoked);
        assert_eq!(
            bridge.history(),
            vec![
                BridgeState::NotStarted,
                BridgeState::Loaded,
                BridgeState::Invoked
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(loader.is_loaded(SYSTEM_MODULE));
    }

    #[test]
    fn test_repeated_host_ready_is_noop() {
        let loader = LibraryLoader::new(Vec::new());
        let resolver = CountingResolver::default();
        let calls = resolver.calls();
        let bridge =
            BootstrapBridge::new(&loader, ModuleSpec::new(SYSTEM_MODULE, SYSTEM_ENTRY), resolver);

        bridge.on_host_ready().unwrap();
        assert_eq!(
            bridge.on_host_ready().unwrap(),
            BootstrapOutcome::AlreadyInvoked
        );
        assert_eq!(
            bridge.on_host_ready().unwrap(),
            BootstrapOutcome::AlreadyInvoked
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.history().len(), 3);
        assert_eq!(loader.loaded_count(), 1);
    }

    #[test]
    fn test_missing_symbol_fails_after_load() {
        let loader = LibraryLoader::new(Vec::new());
        let resolver = CountingResolver::default();
        let calls = resolver.calls();
        let bridge =
            BootstrapBridge::new(&loader, ModuleSpec::new(SYSTEM_MODULE, "nativeMain"), resolver);

        match bridge.on_host_ready() {
            Err(BridgeError::SymbolResolution(err)) => {
                assert_eq!(err.module, SYSTEM_MODULE);
                assert_eq!(err.symbol, "nativeMain");
            }
            other => panic!("expected SymbolResolution, got {:?}", other),
        }
        assert_eq!(
            bridge.history(),
            vec![
                BridgeState::NotStarted,
                BridgeState::Loaded,
                BridgeState::Failed
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        // The module stays mapped even though the bootstrap failed.
        assert!(loader.is_loaded(SYSTEM_MODULE));
    }

    #[test]
    fn test_bridges_share_one_module_load() {
        let loader = LibraryLoader::new(Vec::new());
        let first = BootstrapBridge::new(
            &loader,
            ModuleSpec::new(SYSTEM_MODULE, SYSTEM_ENTRY),
            CountingResolver::default(),
        );
        let second = BootstrapBridge::new(
            &loader,
            ModuleSpec::new(SYSTEM_MODULE, "getpid"),
            CountingResolver::default(),
        );

        first.on_host_ready().unwrap();
        second.on_host_ready().unwrap();
        assert_eq!(loader.loaded_count(), 1);
    }

    #[test]
    fn test_native_entry_point_is_called() {
        let loader = LibraryLoader::new(Vec::new());
        let bridge =
            BootstrapBridge::with_loader(&loader, ModuleSpec::new(SYSTEM_MODULE, SYSTEM_ENTRY));

        assert_eq!(bridge.on_host_ready().unwrap(), BootstrapOutcome::Invoked);
        assert_eq!(bridge.state(), BridgeState::Invoked);
    }

    /// Entry point that crashes the way a faulting driver init would
    struct PanickingEntry;

    impl EntryPoint for PanickingEntry {
        fn invoke(&self) {
            panic!("driver init crashed");
        }
    }

    struct PanickingResolver;

    impl EntryResolver for PanickingResolver {
        type Entry = PanickingEntry;

        fn resolve(
            &self,
            module: &NativeModuleHandle,
            symbol: &str,
        ) -> Result<PanickingEntry, SymbolResolutionError> {
            SymbolResolver.resolve(module, symbol)?;
            Ok(PanickingEntry)
        }
    }

    #[test]
    fn test_panicking_entry_point_fails_the_bridge() {
        let loader = LibraryLoader::new(Vec::new());
        let bridge = BootstrapBridge::new(
            &loader,
            ModuleSpec::new(SYSTEM_MODULE, SYSTEM_ENTRY),
            PanickingResolver,
        );

        let unwound = panic::catch_unwind(AssertUnwindSafe(|| bridge.on_host_ready()));
        assert!(unwound.is_err());

        assert_eq!(bridge.state(), BridgeState::Failed);
        assert_eq!(
            bridge.history(),
            vec![
                BridgeState::NotStarted,
                BridgeState::Loaded,
                BridgeState::Failed
            ]
        );

        // The next creation event reports the crash instead of "in progress".
        match bridge.on_host_ready() {
            Err(BridgeError::PreviouslyFailed(reason)) => {
                assert!(reason.contains("driver init crashed"));
                assert!(reason.contains(SYSTEM_ENTRY));
            }
            other => panic!("expected PreviouslyFailed, got {:?}", other),
        }
    }

    static REENTRANT_LOADER: Lazy<LibraryLoader> = Lazy::new(|| LibraryLoader::new(Vec::new()));
    static REENTRANT_BRIDGE: OnceCell<BootstrapBridge<'static, ReentrantResolver>> =
        OnceCell::new();

    type NestedOutcomes = Arc<Mutex<Vec<Result<BootstrapOutcome, BridgeError>>>>;

    /// Entry point that fires another host creation event before returning
    struct ReentrantEntry {
        calls: Arc<AtomicUsize>,
        nested: NestedOutcomes,
    }

    impl EntryPoint for ReentrantEntry {
        fn invoke(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(bridge) = REENTRANT_BRIDGE.get() {
                let outcome = bridge.on_host_ready();
                self.nested.lock().unwrap().push(outcome);
            }
        }
    }

    #[derive(Default)]
    struct ReentrantResolver {
        calls: Arc<AtomicUsize>,
        nested: NestedOutcomes,
    }

    impl EntryResolver for ReentrantResolver {
        type Entry = ReentrantEntry;

        fn resolve(
            &self,
            module: &NativeModuleHandle,
            symbol: &str,
        ) -> Result<ReentrantEntry, SymbolResolutionError> {
            SymbolResolver.resolve(module, symbol)?;
            Ok(ReentrantEntry {
                calls: Arc::clone(&self.calls),
                nested: Arc::clone(&self.nested),
            })
        }
    }

    #[test]
    fn test_reentrant_host_ready_is_in_progress() {
        let resolver = ReentrantResolver::default();
        let calls = Arc::clone(&resolver.calls);
        let nested = Arc::clone(&resolver.nested);
        let bridge = REENTRANT_BRIDGE.get_or_init(|| {
            BootstrapBridge::new(
                &REENTRANT_LOADER,
                ModuleSpec::new(SYSTEM_MODULE, SYSTEM_ENTRY),
                resolver,
            )
        });

        assert_eq!(bridge.on_host_ready().unwrap(), BootstrapOutcome::Invoked);

        assert_eq!(
            nested.lock().unwrap().as_slice(),
            &[Ok(BootstrapOutcome::InProgress)]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            bridge.history(),
            vec![
                BridgeState::NotStarted,
                BridgeState::Loaded,
                BridgeState::Invoked
            ]
        );
    }

    #[test]
    fn test_probe_does_not_invoke() {
        let loader = LibraryLoader::new(Vec::new());
        let report =
            nfbridge::probe(&loader, &ModuleSpec::new(SYSTEM_MODULE, SYSTEM_ENTRY)).unwrap();
        assert_eq!(report.module.identifier(), SYSTEM_MODULE);
        assert_eq!(report.entry_symbol, SYSTEM_ENTRY);

        let err = nfbridge::probe(&loader, &ModuleSpec::new(SYSTEM_MODULE, "nativeMain"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::SymbolResolution(_)));
    }
}
