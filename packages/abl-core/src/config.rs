//! Front-end configuration.
//!
//! Supports TOML config files, environment variable overrides, and defaults.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProparseError, Result};

/// Target operating system of the analysed code base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Unix,
    Windows,
}

impl OperatingSystem {
    /// Detects the operating system this process runs on.
    pub fn current() -> Self {
        if cfg!(windows) {
            OperatingSystem::Windows
        } else {
            OperatingSystem::Unix
        }
    }

    /// Value of the `OPSYS` preprocessor name.
    pub fn name(self) -> &'static str {
        match self {
            OperatingSystem::Windows => "WIN32",
            OperatingSystem::Unix => "UNIX",
        }
    }

    /// Value of the `WINDOW-SYSTEM` preprocessor name.
    pub fn window_system(self) -> &'static str {
        match self {
            OperatingSystem::Windows => "MS-WIN95",
            OperatingSystem::Unix => "TTY",
        }
    }

    pub fn number(self) -> i32 {
        match self {
            OperatingSystem::Windows => 1,
            OperatingSystem::Unix => 2,
        }
    }
}

impl Default for OperatingSystem {
    fn default() -> Self {
        Self::current()
    }
}

/// Settings handed to the lexer and parser of every compilation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProparseSettings {
    /// Directories searched for include files and classes, in order
    pub propath: Vec<PathBuf>,
    /// Version string reported by the `PROVERSION` preprocessor name (default: "11.6")
    pub proversion: String,
    /// Value of the `BATCH-MODE` preprocessor name (default: true)
    pub batch_mode: bool,
    /// Parse every unit even if a cached artifact exists (default: true)
    pub multi_parse: bool,
    /// Honour `&ANALYZE`-style proparse directives (default: true)
    pub proparse_directives: bool,
    /// Treat backslash as an escape character in strings (default: false)
    pub backslash_escape: bool,
    /// Target operating system
    pub opsys: OperatingSystem,
}

impl Default for ProparseSettings {
    fn default() -> Self {
        Self {
            propath: Vec::new(),
            proversion: "11.6".to_string(),
            batch_mode: true,
            multi_parse: true,
            proparse_directives: true,
            backslash_escape: false,
            opsys: OperatingSystem::current(),
        }
    }
}

impl ProparseSettings {
    /// Creates settings with the given comma-separated propath.
    pub fn with_propath(propath: &str) -> Self {
        Self {
            propath: parse_propath(propath),
            ..Default::default()
        }
    }

    /// Propath joined back into its comma-separated form.
    pub fn propath_string(&self) -> String {
        self.propath
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Splits a comma-separated propath, dropping empty entries.
pub fn parse_propath(propath: &str) -> Vec<PathBuf> {
    propath
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Parse-unit binary cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the artifacts (default: "./pubs")
    pub cache_dir: PathBuf,
    /// Whether units are loaded from and written to the cache (default: true)
    pub enabled: bool,
    /// Maximum retry attempts for transient I/O errors while writing (default: 3)
    pub max_retries: u32,
    /// Delay between retry attempts in milliseconds (default: 50)
    pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./pubs"),
            enabled: true,
            max_retries: 3,
            retry_delay_ms: 50,
        }
    }
}

/// Project-level configuration aggregating every other section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub settings: ProparseSettings,
    pub cache: CacheConfig,
    /// Schema description files, one database each
    pub schema_files: Vec<PathBuf>,
    /// JSON class catalogs injected into the type-info cache
    pub catalog_files: Vec<PathBuf>,
}

impl ProjectConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ProparseError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| ProparseError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Applies environment variable overrides.
    ///
    /// `ABL_PROPATH` replaces the propath (comma-separated) and
    /// `ABL_CACHE_DIR` replaces the cache directory.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("ABL_PROPATH") {
            self.settings.propath = parse_propath(&val);
        }
        if let Ok(val) = env::var("ABL_CACHE_DIR") {
            if val.trim().is_empty() {
                return Err(ProparseError::Config(
                    "ABL_CACHE_DIR must not be empty".to_string(),
                ));
            }
            self.cache.cache_dir = PathBuf::from(val);
        }
        Ok(())
    }
}
