use crate::GlobalOpts;
use clap::Args;
use nfbridge::{BootstrapBridge, BootstrapOutcome, BridgeError, LibraryLoader};
use nfbridge_logger as logger;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct LaunchCommand {
    /// Extra directory to search for the native module (repeatable)
    #[arg(long = "library-dir", value_name = "DIR")]
    pub library_dirs: Vec<PathBuf>,

    /// Fire this many simulated host re-creation events after the first
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub recreate: u32,
}

/// Fire the host creation event against the process-wide bridge
pub fn handle_launch(cmd: LaunchCommand, opts: &GlobalOpts) -> Result<(), BridgeError> {
    let loader = LibraryLoader::init_global(cmd.library_dirs);
    if opts.verbosity_level() > 0 {
        for dir in loader.search_paths() {
            logger::debug(&format!("Search directory: {}", dir.display()));
        }
    }

    let bridge = BootstrapBridge::global();
    for event in 1..=cmd.recreate.saturating_add(1) {
        logger::step(&format!("Host creation event #{}", event));
        match bridge.on_host_ready()? {
            BootstrapOutcome::Invoked => logger::success(&format!(
                "Native entry point '{}' in '{}' invoked",
                bridge.spec().entry_symbol,
                bridge.spec().identifier
            )),
            BootstrapOutcome::AlreadyInvoked => logger::info(&format!(
                "Creation event #{}: entry point already invoked, skipping",
                event
            )),
            BootstrapOutcome::InProgress => logger::warn(&format!(
                "Creation event #{}: bootstrap still in progress, skipping",
                event
            )),
        }
    }
    Ok(())
}
