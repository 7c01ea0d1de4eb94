//! Library search directory resolution
//!
//! The bridge probes these directories for the native module before
//! falling back to the platform's dynamic-linker search.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable holding extra search directories (platform path list)
pub const LIBRARY_PATH_ENV: &str = "NFBRIDGE_LIBRARY_PATH";

/// Merge search directories in priority order, dropping empties and duplicates
pub fn combine(
    env_value: Option<OsString>,
    configured: &[String],
    exe_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    let from_env = env_value
        .map(|value| env::split_paths(&value).collect::<Vec<_>>())
        .unwrap_or_default();

    let mut paths: Vec<PathBuf> = Vec::new();
    let candidates = from_env
        .into_iter()
        .chain(configured.iter().map(PathBuf::from))
        .chain(exe_dir);
    for path in candidates {
        if path.as_os_str().is_empty() || paths.contains(&path) {
            continue;
        }
        paths.push(path);
    }
    paths
}
