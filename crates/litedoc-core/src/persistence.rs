//! Document file persistence: load, save, backup, restore
//!
//! The whole document is the unit of persistence: every save re-serializes
//! and rewrites the entire file. Saves use the atomic rename pattern:
//! 1. Write the new content to `<file>.tmp`
//! 2. durable sync the temp file
//! 3. Rename the temp file over the active file (atomic on POSIX)
//! 4. durable sync the directory
//!
//! If the process crashes before the rename the old file is intact and the
//! temp file is an orphan; after the rename the new file is complete.
//!
//! No lock is taken on the file. Two processes saving the same document
//! silently lose each other's updates.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::codec::{self, ObfuscationKey};
use crate::config::Config;
use crate::durability::{sync_dir, sync_file};
use crate::error::{DocError, DocResult};

/// Indentation of the plain file format.
const INDENT: &[u8] = b"    ";

/// Suffix of the temp file written before each rename.
const TEMP_SUFFIX: &str = ".tmp";

/// Result of a backup operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    /// Path of the backup file
    pub path: PathBuf,
    /// Number of bytes copied
    pub bytes: u64,
    /// CRC32C of the copied bytes
    pub checksum: u32,
}

/// Reads and writes one document file.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    dir: PathBuf,
    file_name: String,
    path: PathBuf,
    key: Option<ObfuscationKey>,
    sync_writes: bool,
}

impl DocumentFile {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.dir.clone(),
            file_name: config.file_name.clone(),
            path: config.file_path(),
            key: config.active_key().cloned(),
            sync_writes: config.sync_writes,
        }
    }

    /// Path of the active document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the document and its backups.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_obfuscated(&self) -> bool {
        self.key.is_some()
    }

    /// Make sure the document file exists.
    ///
    /// With `create` set, a missing directory is created and a missing file
    /// is initialized with `{}`. Returns true if the file was created.
    pub fn ensure_exists(&self, create: bool) -> DocResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        if !create {
            return Err(DocError::Io {
                path: Some(self.path.clone()),
                kind: std::io::ErrorKind::NotFound,
                message: "Document file does not exist and create_if_missing is off".into(),
            });
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| DocError::io(&self.dir, e, "Failed to create storage directory"))?;
        self.save(&Value::Object(Map::new()))?;
        tracing::info!(path = %self.path.display(), "initialized empty document");
        Ok(true)
    }

    /// Read, decode and parse the active file.
    pub fn load(&self) -> DocResult<Value> {
        let bytes = fs::read(&self.path)
            .map_err(|e| DocError::io(&self.path, e, "Failed to read document file"))?;
        let doc = self.parse(&bytes, &self.path)?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "document loaded");
        Ok(doc)
    }

    /// Decode (if obfuscated) and parse file content read from `source`.
    fn parse(&self, bytes: &[u8], source: &Path) -> DocResult<Value> {
        let decoded;
        let json = match &self.key {
            Some(key) => {
                decoded = codec::decode(bytes, key).map_err(|e| match e {
                    DocError::Codec { message, .. } => DocError::Codec {
                        path: Some(source.to_path_buf()),
                        message,
                    },
                    other => other,
                })?;
                decoded.as_slice()
            }
            None => bytes,
        };

        let doc: Value = serde_json::from_slice(json).map_err(|e| DocError::Parse {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;

        if !doc.is_object() {
            return Err(DocError::Parse {
                path: source.to_path_buf(),
                message: "document root must be an object".into(),
            });
        }
        Ok(doc)
    }

    /// File content for `doc`: 4-space pretty JSON, or the codec text of
    /// compact JSON when obfuscated.
    pub fn serialize(&self, doc: &Value) -> DocResult<Vec<u8>> {
        let to_io = |e: serde_json::Error| DocError::Io {
            path: Some(self.path.clone()),
            kind: std::io::ErrorKind::InvalidData,
            message: format!("Failed to serialize document: {}", e),
        };

        match &self.key {
            Some(key) => {
                let compact = serde_json::to_vec(doc).map_err(to_io)?;
                Ok(codec::encode(&compact, key).into_bytes())
            }
            None => {
                let mut buf = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(
                    &mut buf,
                    PrettyFormatter::with_indent(INDENT),
                );
                doc.serialize(&mut ser).map_err(to_io)?;
                Ok(buf)
            }
        }
    }

    /// Serialize `doc` and atomically replace the active file.
    ///
    /// Returns the number of bytes written.
    pub fn save(&self, doc: &Value) -> DocResult<u64> {
        let bytes = self.serialize(doc)?;
        self.write_atomic(&self.path, &bytes)?;
        tracing::info!(path = %self.path.display(), bytes = bytes.len(), "document saved");
        Ok(bytes.len() as u64)
    }

    /// Copy the active file byte-for-byte to `<dir>/<name>`.
    pub fn backup(&self, name: &str) -> DocResult<BackupInfo> {
        let target = self.backup_path(name)?;
        let bytes = fs::read(&self.path)
            .map_err(|e| DocError::io(&self.path, e, "Failed to read document file for backup"))?;
        self.write_atomic(&target, &bytes)?;

        let info = BackupInfo {
            path: target,
            bytes: bytes.len() as u64,
            checksum: crc32c::crc32c(&bytes),
        };
        tracing::info!(
            path = %info.path.display(),
            bytes = info.bytes,
            checksum = info.checksum,
            "backup written"
        );
        Ok(info)
    }

    /// Replace the active file with backup `name` and return its document.
    ///
    /// The backup is parsed before anything is written, so an unreadable
    /// backup leaves the active file untouched.
    pub fn restore(&self, name: &str) -> DocResult<Value> {
        let source = self.backup_path(name)?;
        let bytes = fs::read(&source)
            .map_err(|e| DocError::io(&source, e, "Failed to read backup file"))?;
        let doc = self.parse(&bytes, &source)?;

        self.write_atomic(&self.path, &bytes)?;

        let expected = crc32c::crc32c(&bytes);
        let written = fs::read(&self.path)
            .map_err(|e| DocError::io(&self.path, e, "Failed to re-read restored file"))?;
        let actual = crc32c::crc32c(&written);
        if expected != actual {
            return Err(DocError::ChecksumMismatch {
                path: self.path.clone(),
                expected,
                actual,
            });
        }

        tracing::info!(
            from = %source.display(),
            path = %self.path.display(),
            bytes = bytes.len(),
            "document restored from backup"
        );
        Ok(doc)
    }

    /// Sibling path for backup `name`, rejecting names that escape the
    /// directory or collide with the active file.
    fn backup_path(&self, name: &str) -> DocResult<PathBuf> {
        let reject = |reason: &str| DocError::InvalidBackupName {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };

        if name.is_empty() {
            return Err(reject("name must not be empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(reject("name must be a plain file name"));
        }
        if name == self.file_name {
            return Err(reject("name is the active document file"));
        }
        if name.ends_with(TEMP_SUFFIX) {
            return Err(reject("names ending in .tmp are reserved"));
        }
        Ok(self.dir.join(name))
    }

    /// Write `bytes` to `target` through a temp file and rename.
    ///
    /// A failure before the rename removes the temp file again, so a failed
    /// save leaves no `<file>.tmp` behind.
    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> DocResult<()> {
        let mut temp_name = target.file_name().unwrap_or_default().to_os_string();
        temp_name.push(TEMP_SUFFIX);
        let temp_path = target.with_file_name(temp_name);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| DocError::io(&temp_path, e, "Failed to create temp file"))?;

        let staged = self.fill_temp(&mut file, &temp_path, bytes);
        drop(file);
        let staged = staged.and_then(|()| {
            fs::rename(&temp_path, target)
                .map_err(|e| DocError::io(target, e, "Failed to rename temp file into place"))
        });
        if let Err(err) = staged {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "failed to remove temp file after aborted write"
                );
            }
            return Err(err);
        }

        if self.sync_writes {
            if let Some(parent) = target.parent() {
                sync_dir(parent)
                    .map_err(|e| DocError::io(parent, e, "Failed to sync directory after rename"))?;
            }
        }
        Ok(())
    }

    fn fill_temp(&self, file: &mut fs::File, temp_path: &Path, bytes: &[u8]) -> DocResult<()> {
        file.write_all(bytes)
            .map_err(|e| DocError::io(temp_path, e, "Failed to write temp file"))?;
        if self.sync_writes {
            sync_file(file).map_err(|e| DocError::io(temp_path, e, "Failed to sync temp file"))?;
        }
        Ok(())
    }
}
