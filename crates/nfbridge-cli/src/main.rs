use clap::{Parser, Subcommand};
use nfbridge_cli::{
    commands::{
        config::{self, ConfigAction},
        launch, probe,
    },
    GlobalOpts,
};
use nfbridge_config::Config;
use nfbridge_logger as logger;

#[derive(Parser)]
#[command(name = "nfbridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Native driver bootstrap host",
    long_about = "nfbridge loads the native driver module once and calls its entry point, the way an application host does at creation."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fire the host creation event: load the native module and invoke its entry point
    Launch(launch::LaunchCommand),
    /// Load the native module and resolve its entry point without invoking it
    Probe(probe::ProbeCommand),
    /// Show or edit the nfbridge configuration
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_dir = match Config::load() {
        Ok(cfg) => cfg.log_dir(),
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}", e);
            None
        }
    };
    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), log_dir.as_deref()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    logger::set_no_stdout(cli.global.quiet);
    nfbridge_cli::init_tracing(cli.global.quiet);

    let result = match cli.command {
        Commands::Launch(cmd) => launch::handle_launch(cmd, &cli.global),
        Commands::Probe(cmd) => probe::handle_probe(cmd),
        Commands::Config { action } => {
            if !config::handle_config(action, &cli.global) {
                std::process::exit(1);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        logger::error(&format!("Native bootstrap failed: {}", e));
        if !cli.global.quiet {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}
