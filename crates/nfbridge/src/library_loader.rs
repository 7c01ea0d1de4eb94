//! Dynamic native module loading
//!
//! This module maps the native driver library into the process using
//! dlopen (Unix) or LoadLibrary (Windows). A mapped library is never
//! unloaded: handles hand out `'static` references so the entry point
//! stays callable for the remainder of the process lifetime.

use crate::errors::LoadError;
use crate::utils::{is_explicit_path, library_file_name};
use libloading::Library;
use nfbridge_config::Config;
use nfbridge_logger as logger;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A native module that has been mapped into the process
///
/// Cloning is cheap; every clone refers to the same mapping.
#[derive(Clone)]
pub struct NativeModuleHandle {
    identifier: Arc<str>,
    path: Option<PathBuf>,
    library: &'static Library,
}

impl NativeModuleHandle {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// File the module was mapped from, or `None` when the platform
    /// linker located it through its own search path
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn library(&self) -> &'static Library {
        self.library
    }
}

impl PartialEq for NativeModuleHandle {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && std::ptr::eq(self.library, other.library)
    }
}

impl Eq for NativeModuleHandle {}

impl std::fmt::Debug for NativeModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeModuleHandle")
            .field("identifier", &self.identifier)
            .field("path", &self.path)
            .field("loaded", &true)
            .finish()
    }
}

/// Idempotent loader keyed by module identifier
pub struct LibraryLoader {
    /// Directories probed before the platform linker search
    search_paths: Vec<PathBuf>,
    modules: Mutex<HashMap<String, NativeModuleHandle>>,
}

/// Process-wide loader
static GLOBAL_LOADER: OnceCell<LibraryLoader> = OnceCell::new();

impl LibraryLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            modules: Mutex::new(HashMap::new()),
        }
    }

    /// Get or initialize the process-wide loader from configuration
    pub fn global() -> &'static LibraryLoader {
        GLOBAL_LOADER.get_or_init(|| LibraryLoader::new(configured_search_paths()))
    }

    /// Initialize the process-wide loader with extra search directories
    ///
    /// `extra` takes priority over configured directories. Has no effect
    /// once the loader exists; the existing loader is returned.
    pub fn init_global(extra: Vec<PathBuf>) -> &'static LibraryLoader {
        let mut created = false;
        let loader = GLOBAL_LOADER.get_or_init(|| {
            created = true;
            let mut paths = extra.clone();
            for path in configured_search_paths() {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
            LibraryLoader::new(paths)
        });
        if !created && !extra.is_empty() {
            logger::warn("Library loader already initialized; extra search directories ignored");
        }
        loader
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn is_loaded(&self, identifier: &str) -> bool {
        self.modules.lock().contains_key(identifier)
    }

    /// Number of distinct modules this loader has mapped
    pub fn loaded_count(&self) -> usize {
        self.modules.lock().len()
    }

    /// Load a native module, or return the handle from an earlier load
    ///
    /// A failed load is not remembered; only successful mappings are.
    pub fn load(&self, identifier: &str) -> Result<NativeModuleHandle, LoadError> {
        if identifier.is_empty() || identifier.contains('\0') {
            return Err(LoadError::InvalidIdentifier(identifier.to_string()));
        }

        if let Some(handle) = self.modules.lock().get(identifier) {
            logger::debug(&format!("Native module '{}' already loaded", identifier));
            return Ok(handle.clone());
        }

        // The registry lock is not held while mapping: library constructors
        // may call back into the loader.
        let (library, path) = self.map(identifier)?;

        let mut modules = self.modules.lock();
        if let Some(existing) = modules.get(identifier) {
            // Lost a race; dropping `library` only releases the extra reference.
            return Ok(existing.clone());
        }

        let handle = NativeModuleHandle {
            identifier: Arc::from(identifier),
            path,
            library: Box::leak(Box::new(library)),
        };
        modules.insert(identifier.to_string(), handle.clone());

        tracing::info!(module = identifier, path = ?handle.path, "native module loaded");
        logger::debug(&format!("Native module '{}' loaded", identifier));
        Ok(handle)
    }

    fn map(&self, identifier: &str) -> Result<(Library, Option<PathBuf>), LoadError> {
        if is_explicit_path(identifier) {
            let path = Path::new(identifier);
            if !path.exists() {
                return Err(LoadError::NotFound {
                    identifier: identifier.to_string(),
                    reason: format!("{} does not exist", path.display()),
                });
            }
            let library = open_path(identifier, path)?;
            return Ok((library, Some(path.to_path_buf())));
        }

        let file_name = library_file_name(identifier);
        if let Some(path) = self.find_in_search_paths(&file_name) {
            let library = open_path(identifier, &path)?;
            return Ok((library, Some(path)));
        }

        logger::debug(&format!(
            "{} not in any of {} search directories; using the platform linker search",
            file_name.to_string_lossy(),
            self.search_paths.len()
        ));
        let library = open_library(&file_name).map_err(|e| LoadError::SearchFailed {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        })?;
        Ok((library, None))
    }

    fn find_in_search_paths(&self, file_name: &OsStr) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file())
    }
}

impl std::fmt::Debug for LibraryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryLoader")
            .field("search_paths", &self.search_paths)
            .field("loaded", &self.loaded_count())
            .finish()
    }
}

fn configured_search_paths() -> Vec<PathBuf> {
    match Config::load() {
        Ok(config) => config.search_paths(),
        Err(e) => {
            logger::warn(&format!("Failed to load config, using defaults: {}", e));
            Config::default().search_paths()
        }
    }
}

fn open_path(identifier: &str, path: &Path) -> Result<Library, LoadError> {
    logger::debug(&format!(
        "Loading native module '{}' from {}",
        identifier,
        path.display()
    ));

    #[cfg(windows)]
    set_dll_directory(path);

    open_library(path.as_os_str()).map_err(|e| LoadError::LoadFailed {
        identifier: identifier.to_string(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Unix-specific loading with RTLD_NOW | RTLD_GLOBAL
#[cfg(unix)]
fn open_library(file: &OsStr) -> Result<Library, libloading::Error> {
    use libloading::os::unix::Library as UnixLibrary;

    // RTLD_NOW: unresolved native dependencies fail here, not at first call
    // RTLD_GLOBAL: exported symbols are registered for later lookups
    let flags = libc::RTLD_NOW | libc::RTLD_GLOBAL;

    let library = unsafe { UnixLibrary::open(Some(file), flags)? };
    Ok(library.into())
}

#[cfg(windows)]
fn open_library(file: &OsStr) -> Result<Library, libloading::Error> {
    unsafe { Library::new(file) }
}

/// Let dependent DLLs resolve from the module's own directory
#[cfg(windows)]
fn set_dll_directory(path: &Path) {
    use std::os::windows::ffi::OsStrExt;

    let Some(parent) = path.parent() else {
        return;
    };
    let wide: Vec<u16> = parent
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    extern "system" {
        fn SetDllDirectoryW(lpPathName: *const u16) -> i32;
    }
    unsafe {
        SetDllDirectoryW(wide.as_ptr());
    }
}
