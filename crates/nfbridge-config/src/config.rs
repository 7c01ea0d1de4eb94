use crate::errors::ConfigError;
use crate::search_paths;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "NFBRIDGE_CONFIG";

/// Default config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "nfbridge.toml";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Directories probed, in order, for the native module
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library_dirs: Vec<String>,
    /// Directory for `nfbridge.log`; defaults to the config directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

impl Config {
    pub fn path() -> PathBuf {
        // Honor explicit override via NFBRIDGE_CONFIG for tests / isolated runs.
        if let Ok(env_path) = env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir().map(|home| home.join(".config"));

        #[cfg(target_os = "windows")]
        let base = dirs::config_dir();

        base.unwrap_or_else(|| PathBuf::from("."))
            .join("nfbridge")
            .join(CONFIG_FILE_NAME)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path())
    }

    /// Load from an explicit file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "library-dirs" if !self.library_dirs.is_empty() => {
                env::join_paths(&self.library_dirs)
                    .ok()
                    .map(|joined| joined.to_string_lossy().into_owned())
            }
            "log-dir" => self.log_dir.clone(),
            _ => None,
        }
    }

    /// Set a value by key; `library-dirs` takes a platform path list
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "library-dirs" => {
                self.library_dirs = env::split_paths(value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| {
                        p.to_str()
                            .map(str::to_string)
                            .ok_or_else(|| ConfigError::InvalidPathList(value.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
            }
            "log-dir" => self.log_dir = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.library_dirs.is_empty() && self.log_dir.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        let mut values = Vec::new();
        if let Some(val) = self.get("library-dirs") {
            values.push(("library-dirs", val));
        }
        if let Some(ref val) = self.log_dir {
            values.push(("log-dir", val.clone()));
        }
        values
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.as_ref().map(PathBuf::from)
    }

    /// Directories to probe for the native module, highest priority first
    ///
    /// `NFBRIDGE_LIBRARY_PATH`, then configured `library-dirs`, then the
    /// directory holding the running executable.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        search_paths::combine(
            env::var_os(search_paths::LIBRARY_PATH_ENV),
            &self.library_dirs,
            exe_dir,
        )
    }
}
