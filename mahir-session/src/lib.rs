//! # mahir-session
//!
//! Local key-value persistence for the Mahir Arabic-learning client.
//!
//! The application keeps exactly two things on disk: the Gemini API
//! credential and a short, newest-first log of past text analyses. Both are
//! stored as serialized text under fixed keys, so the storage layer is a
//! minimal [`KeyValueStore`] trait with in-memory and single-file JSON
//! implementations.
//!
//! ```rust,ignore
//! use mahir_session::{CredentialStore, FileStore, HistoryLog};
//! use std::sync::Arc;
//!
//! let store = Arc::new(FileStore::open_default()?);
//! let credentials = CredentialStore::new(store.clone());
//! credentials.set_api_key("AIza...")?;
//!
//! let history: HistoryLog<MyEntry> = HistoryLog::analysis(store);
//! history.push(entry)?;
//! ```

mod credential;
mod error;
mod history;
mod store;

pub use credential::{API_KEY_STORAGE_KEY, CredentialStore};
pub use error::{Result, StoreError};
pub use history::{ANALYSIS_HISTORY_KEY, DEFAULT_HISTORY_LIMIT, HistoryLog};
pub use store::{FileStore, KeyValueStore, MemoryStore, SharedStore};
