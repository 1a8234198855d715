//! Configuration management for LiteDoc
//!
//! Provides presets for plain and obfuscated stores and builder-style
//! setters for the remaining knobs.

use std::path::{Path, PathBuf};

use crate::codec::ObfuscationKey;
use crate::error::DocResult;

/// Document file name used when none is given.
pub const DEFAULT_FILE_NAME: &str = "database.json";

/// Storage directory used by `Config::default()`.
pub const DEFAULT_DIR: &str = "database";

/// LiteDoc store configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the document file and its backups
    pub dir: PathBuf,
    /// Document file name inside `dir`
    pub file_name: String,
    /// Store the file through the obfuscation codec
    pub obfuscate: bool,
    /// Codec key; required when `obfuscate` is set
    pub obfuscation_key: Option<ObfuscationKey>,
    /// Create the directory and an empty `{}` document when absent
    pub create_if_missing: bool,
    /// Durably sync the file and directory on every save
    pub sync_writes: bool,
}

impl Config {
    /// Human-readable 4-space-indented JSON file.
    pub fn plain<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            file_name: DEFAULT_FILE_NAME.to_owned(),
            obfuscate: false,
            obfuscation_key: None,
            create_if_missing: true,
            sync_writes: true,
        }
    }

    /// File passed through the XOR + base64 codec with `key`.
    pub fn obfuscated<P: AsRef<Path>>(dir: P, key: ObfuscationKey) -> Self {
        Self {
            obfuscate: true,
            obfuscation_key: Some(key),
            ..Self::plain(dir)
        }
    }

    /// Enable obfuscation with the key held in environment variable `var`.
    pub fn key_from_env(mut self, var: &str) -> DocResult<Self> {
        self.obfuscation_key = Some(ObfuscationKey::from_env(var)?);
        self.obfuscate = true;
        Ok(self)
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Full path of the document file.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Key the codec should use, or `None` for a plain file.
    pub fn active_key(&self) -> Option<&ObfuscationKey> {
        if self.obfuscate {
            self.obfuscation_key.as_ref()
        } else {
            None
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.dir.as_os_str().is_empty() {
            return Err("dir must not be empty".into());
        }
        if self.file_name.is_empty() {
            return Err("file_name must not be empty".into());
        }
        if self.file_name.contains(['/', '\\']) || self.file_name == "." || self.file_name == ".." {
            return Err("file_name must be a plain file name".into());
        }
        if self.obfuscate && self.obfuscation_key.is_none() {
            return Err("obfuscation requested without a key".into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self { Self::plain(DEFAULT_DIR) }
}
