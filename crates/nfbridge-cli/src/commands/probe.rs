use clap::Args;
use colored::Colorize;
use nfbridge::{BridgeError, LibraryLoader, ModuleSpec};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ProbeCommand {
    /// Extra directory to search for the native module (repeatable)
    #[arg(long = "library-dir", value_name = "DIR")]
    pub library_dirs: Vec<PathBuf>,
}

/// Load the native module and bind its entry symbol without calling it
pub fn handle_probe(cmd: ProbeCommand) -> Result<(), BridgeError> {
    let loader = LibraryLoader::init_global(cmd.library_dirs);
    let report = nfbridge::probe(loader, &ModuleSpec::default())?;

    let location = report.module.path().map_or_else(
        || "(platform linker search path)".to_string(),
        |path| path.display().to_string(),
    );
    println!("{} {}", "module:".cyan(), report.module.identifier());
    println!("{} {}", "path:".cyan(), location);
    println!("{} {}", "entry:".cyan(), report.entry_symbol);
    Ok(())
}
