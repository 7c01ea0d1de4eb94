//! Configuration for the nfbridge bootstrap bridge
//!
//! The configuration only decides *where* the native module is looked
//! for and where logs go. The module identifier and entry symbol are
//! fixed inside the bridge crate.

mod config;
mod errors;
pub mod search_paths;

pub use config::{Config, CONFIG_ENV, CONFIG_FILE_NAME};
pub use errors::ConfigError;
pub use search_paths::LIBRARY_PATH_ENV;
