//! LiteDoc Core — Embedded Single-File JSON Document Store
//!
//! The whole document lives in memory as a `serde_json::Value` tree and is
//! addressed with slash-delimited key paths such as `users/1/email`. Every
//! mutation rewrites the full file, atomically.
//!
//! # Architecture
//!
//! - **Paths**: walk and create nested Objects (`path`)
//! - **Edits**: deep merge, incoming side wins (`merge`)
//! - **Validation**: per-field regex table stored in the document (`validation`)
//! - **At rest**: optional XOR + base64 obfuscation (`codec`), not encryption
//! - **Persistence**: temp file + rename + directory sync, verbatim backups
//!   (`persistence`)
//!
//! # Example
//!
//! ```no_run
//! use litedoc_core::{Config, DocumentStore};
//! use serde_json::json;
//!
//! let store = DocumentStore::open(Config::plain("database"))?;
//! store.set_data("users/1", json!({"firstName": "John", "lastName": "Doe"}))?;
//! store.set_subcollection("users/1", "groups", json!({"name": "Admins"}))?;
//! assert_eq!(store.get_data("users/1/groups/name")?, json!("Admins"));
//! # Ok::<(), litedoc_core::DocError>(())
//! ```
//!
//! # Single process only
//!
//! No file lock is taken. Two processes writing the same file lose each
//! other's updates.

pub mod codec;
pub mod config;
pub mod durability;
pub mod error;
pub mod merge;
pub mod path;
pub mod patterns;
pub mod persistence;
pub mod search;
pub mod store;
pub mod validation;

// Re-export key types for convenience
pub use codec::ObfuscationKey;
pub use config::Config;
pub use error::{DocError, DocResult};
pub use path::KeyPath;
pub use persistence::{BackupInfo, DocumentFile};
pub use search::SearchMode;
pub use store::DocumentStore;
pub use validation::REGEX_TABLE_KEY;
