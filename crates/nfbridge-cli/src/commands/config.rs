use crate::GlobalOpts;
use clap::Subcommand;
use colored::Colorize;
use nfbridge_config::Config;
use nfbridge_logger as logger;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set a configuration value (library-dirs, log-dir)
    Set { key: String, value: String },
    /// Print the path of the configuration file
    Path,
}

/// Returns false when the action failed
pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) -> bool {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => match Config::load() {
            Ok(config) => {
                println!("{}", "Configuration:".bold().green());
                if config.is_empty() {
                    if opts.verbosity_level() > 0 {
                        println!("  {}", "(empty)".yellow());
                    }
                } else {
                    for (key, value) in config.values_iter() {
                        println!("  {}: {}", key.cyan(), value);
                    }
                }
                true
            }
            Err(e) => {
                logger::error(&format!("Failed to load config: {}", e));
                false
            }
        },
        ConfigAction::Set { key, value } => {
            let result = Config::load().and_then(|mut config| {
                config.set(&key, &value)?;
                config.save()
            });
            match result {
                Ok(()) => {
                    logger::success(&format!("Set {} = {}", key, value));
                    true
                }
                Err(e) => {
                    logger::error(&format!("Failed to update config: {}", e));
                    false
                }
            }
        }
        ConfigAction::Path => {
            let config_path = Config::path();
            logger::debug(&format!("Reading config from: {}", config_path.display()));
            println!("{}", config_path.display());
            true
        }
    }
}
