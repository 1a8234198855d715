//! Document store, the public face of LiteDoc.
//!
//! DocumentStore holds the whole document in memory and rewrites the file
//! after every mutation.
//!
//! **Read path**: resolve the key path in memory, clone the value out
//! **Write path**: validate, build the next document, save it, then swap it in
//!
//! If the save fails the in-memory document is NEVER modified, so memory and
//! disk only diverge when another process edits the file.

use std::fmt;
use std::path::Path;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{DocError, DocResult};
use crate::merge::{deep_merge, shallow_merge};
use crate::path::{self, KeyPath};
use crate::persistence::{BackupInfo, DocumentFile};
use crate::search::{self, SearchMode};
use crate::validation::{in_regex_table, Validator, REGEX_TABLE_KEY};

/// State guarded by the store mutex.
struct Inner {
    /// In-memory document, always an Object
    doc: Value,
    /// Compiled pattern cache
    validator: Validator,
}

/// Embedded JSON document store addressed by slash-delimited key paths.
///
/// All public methods take `&self`. One mutex serializes the
/// load-mutate-save cycle, so a store can be shared between threads of one
/// process. Nothing guards against a second process writing the same file.
pub struct DocumentStore {
    inner: Mutex<Inner>,
    file: DocumentFile,
    config: Config,
}

impl DocumentStore {
    /// Open the store described by `config`.
    ///
    /// Creates the directory and an empty document when allowed and absent,
    /// then loads the file. Obfuscation without a key fails here.
    pub fn open(config: Config) -> DocResult<Self> {
        config.validate().map_err(|reason| DocError::Config { reason })?;

        let file = DocumentFile::new(&config);
        let created = file.ensure_exists(config.create_if_missing)?;
        let doc = file.load()?;

        tracing::info!(
            path = %file.path().display(),
            created,
            obfuscated = file.is_obfuscated(),
            top_level_keys = doc.as_object().map_or(0, Map::len),
            "document store opened"
        );

        Ok(Self {
            inner: Mutex::new(Inner { doc, validator: Validator::new() }),
            file,
            config,
        })
    }

    /// Path of the active document file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True iff every segment of `path` resolves. Malformed paths never do.
    pub fn key_exists(&self, path: &str) -> bool {
        let Ok(path) = KeyPath::parse(path) else {
            return false;
        };
        let inner = self.inner.lock();
        path::exists(&inner.doc, &path)
    }

    /// Value at `path`.
    pub fn get_data(&self, path: &str) -> DocResult<Value> {
        let path = KeyPath::parse(path)?;
        let inner = self.inner.lock();
        path::read(&inner.doc, &path)
            .cloned()
            .ok_or_else(|| DocError::not_found(&path))
    }

    /// Value at `path`, or `default` when it does not resolve.
    pub fn get_or_default(&self, path: &str, default: Value) -> Value {
        self.get_data(path).unwrap_or(default)
    }

    /// Create `path` with `value`.
    ///
    /// Fails with `AlreadyExists` if the path resolves; use
    /// [`edit_data`](Self::edit_data) to change existing data.
    pub fn set_data(&self, path: &str, value: Value) -> DocResult<()> {
        let path = KeyPath::parse(path)?;
        let mut guard = self.inner.lock();
        self.set_locked(&mut guard, &path, value)
    }

    /// Deep-merge `value` into the data at `path`.
    ///
    /// Nested Objects merge, everything else (arrays included) is replaced.
    pub fn edit_data(&self, path: &str, value: Value) -> DocResult<()> {
        let path = KeyPath::parse(path)?;
        let mut guard = self.inner.lock();
        self.edit_locked(&mut guard, &path, value)
    }

    /// Remove `path` from its parent and return the removed value.
    pub fn delete_data(&self, path: &str) -> DocResult<Value> {
        let path = KeyPath::parse(path)?;
        let mut guard = self.inner.lock();
        self.delete_locked(&mut guard, &path)
    }

    /// True if `path` exists; otherwise create it with `default` and
    /// return false.
    pub fn key_exists_or_add(&self, path: &str, default: Value) -> DocResult<bool> {
        let path = KeyPath::parse(path)?;
        let mut guard = self.inner.lock();
        if path::exists(&guard.doc, &path) {
            return Ok(true);
        }
        self.set_locked(&mut guard, &path, default)?;
        Ok(false)
    }

    /// Merge `data` into the child Object `key` of `parent`, creating the
    /// child if needed. The parent must exist.
    pub fn set_subcollection(&self, parent: &str, key: &str, data: Value) -> DocResult<()> {
        let parent = KeyPath::parse(parent)?;
        let mut guard = self.inner.lock();
        self.merge_subcollection(&mut guard, &parent, key, data)
    }

    /// Same merge as [`set_subcollection`](Self::set_subcollection).
    pub fn edit_subcollection(&self, parent: &str, key: &str, data: Value) -> DocResult<()> {
        let parent = KeyPath::parse(parent)?;
        let mut guard = self.inner.lock();
        self.merge_subcollection(&mut guard, &parent, key, data)
    }

    pub fn get_subcollection(&self, parent: &str, key: &str) -> DocResult<Value> {
        let path = KeyPath::parse(parent)?.child(key);
        let inner = self.inner.lock();
        path::read(&inner.doc, &path)
            .cloned()
            .ok_or_else(|| DocError::not_found(&path))
    }

    pub fn delete_subcollection(&self, parent: &str, key: &str) -> DocResult<Value> {
        let path = KeyPath::parse(parent)?.child(key);
        let mut guard = self.inner.lock();
        self.delete_locked(&mut guard, &path)
    }

    /// Register `pattern` for field `key` and persist it.
    ///
    /// The pattern is compiled first; an invalid pattern is never stored.
    pub fn set_regex(&self, key: &str, pattern: &str) -> DocResult<()> {
        let path = KeyPath::parse(REGEX_TABLE_KEY)?.child(key);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner.validator.compile(key, pattern)?;
        let mut next = inner.doc.clone();
        path::write(&mut next, &path, Value::String(pattern.to_owned()));
        self.commit(inner, next)
    }

    /// Drop the pattern registered for `key`.
    pub fn remove_regex(&self, key: &str) -> DocResult<()> {
        let path = KeyPath::parse(REGEX_TABLE_KEY)?.child(key);
        let mut guard = self.inner.lock();
        self.delete_locked(&mut guard, &path)?;
        Ok(())
    }

    /// Leaves equal to `value` under `scope` (or the whole document), using
    /// [`SearchMode::Loose`].
    pub fn search(&self, value: &Value, scope: Option<&str>) -> DocResult<Map<String, Value>> {
        self.search_with(value, scope, SearchMode::Loose)
    }

    /// Leaves equal to `value` under `scope`, compared with `mode`.
    ///
    /// Result paths are relative to `scope`. A scope that does not resolve
    /// is `NotFound`; no matches is an empty map.
    pub fn search_with(
        &self,
        value: &Value,
        scope: Option<&str>,
        mode: SearchMode,
    ) -> DocResult<Map<String, Value>> {
        let scope = scope.map(KeyPath::parse).transpose()?;
        let inner = self.inner.lock();

        let root = match &scope {
            Some(scope) => path::read(&inner.doc, scope).ok_or_else(|| DocError::not_found(scope))?,
            None => &inner.doc,
        };

        let results = search::search(root, value, mode);
        if results.is_empty() {
            tracing::debug!(needle = %value, ?mode, "search found no matches");
        }
        Ok(results)
    }

    /// Copy the active file verbatim to `name` in the storage directory.
    pub fn backup(&self, name: &str) -> DocResult<BackupInfo> {
        let _guard = self.inner.lock();
        self.file.backup(name)
    }

    /// Replace the active file with backup `name` and load it.
    pub fn restore(&self, name: &str) -> DocResult<()> {
        let mut inner = self.inner.lock();
        inner.doc = self.file.restore(name)?;
        Ok(())
    }

    /// Discard the in-memory document and re-read the file.
    pub fn reload(&self) -> DocResult<()> {
        let mut inner = self.inner.lock();
        inner.doc = self.file.load()?;
        Ok(())
    }

    /// The whole document.
    pub fn dump_all(&self) -> Value {
        self.inner.lock().doc.clone()
    }

    /// The whole document as 2-space pretty JSON.
    pub fn to_pretty_string(&self) -> String {
        format!("{:#}", self.inner.lock().doc)
    }

    /// Validation runs before the existence check, so an invalid value is
    /// reported as `Validation` even when the path is already taken.
    fn set_locked(&self, inner: &mut Inner, path: &KeyPath, value: Value) -> DocResult<()> {
        reject_regex_table(path)?;
        inner.validator.check(&inner.doc, path, &value)?;
        if path::exists(&inner.doc, path) {
            return Err(DocError::AlreadyExists { path: path.to_string() });
        }

        let mut next = inner.doc.clone();
        path::write(&mut next, path, value);
        self.commit(inner, next)
    }

    fn edit_locked(&self, inner: &mut Inner, path: &KeyPath, value: Value) -> DocResult<()> {
        reject_regex_table(path)?;
        let current = path::read(&inner.doc, path)
            .cloned()
            .ok_or_else(|| DocError::not_found(path))?;
        let merged = deep_merge(current, value);
        inner.validator.check(&inner.doc, path, &merged)?;

        let mut next = inner.doc.clone();
        path::write(&mut next, path, merged);
        self.commit(inner, next)
    }

    fn delete_locked(&self, inner: &mut Inner, path: &KeyPath) -> DocResult<Value> {
        let mut next = inner.doc.clone();
        let removed = path::remove(&mut next, path)
            .ok_or_else(|| DocError::not_found(path))?;
        self.commit(inner, next)?;
        Ok(removed)
    }

    fn merge_subcollection(
        &self,
        inner: &mut Inner,
        parent: &KeyPath,
        key: &str,
        data: Value,
    ) -> DocResult<()> {
        if !path::exists(&inner.doc, parent) {
            return Err(DocError::not_found(parent));
        }
        let child_path = parent.child(key);
        inner.validator.check(&inner.doc, &child_path, &data)?;

        let existing = path::read(&inner.doc, &child_path).cloned().unwrap_or(Value::Null);
        let child = match data {
            Value::Object(fields) => Value::Object(shallow_merge(existing, fields)),
            other => other,
        };

        let mut wrapper = Map::new();
        wrapper.insert(key.to_owned(), child);
        self.edit_locked(inner, parent, Value::Object(wrapper))
    }

    /// Persist `next`, then make it the in-memory document.
    fn commit(&self, inner: &mut Inner, next: Value) -> DocResult<()> {
        self.file.save(&next)?;
        inner.doc = next;
        Ok(())
    }
}

/// CRUD writes may not touch the pattern table; patterns only enter it
/// through `set_regex`, which compiles them first.
fn reject_regex_table(path: &KeyPath) -> DocResult<()> {
    if in_regex_table(path) {
        return Err(DocError::InvalidPath {
            path: path.to_string(),
            reason: format!("'{}' is reserved for patterns (use set_regex)", REGEX_TABLE_KEY),
        });
    }
    Ok(())
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("path", &self.file.path())
            .field("obfuscated", &self.file.is_obfuscated())
            .finish()
    }
}
