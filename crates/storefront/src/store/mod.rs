//! Durable key-value storage for shop state.
//!
//! Every persisted component (cart, balance, favorites) writes a single JSON
//! document under a fixed key. The [`KeyValueStore`] trait is the only seam
//! between the engine and the medium, so tests can swap in [`MemoryStore`]
//! while the CLI uses [`FileStore`].
//!
//! # Keys
//!
//! | Key         | Value                                                   |
//! |-------------|---------------------------------------------------------|
//! | `cart`      | Array of `{id, title, image, price, quantity}` objects  |
//! | `balance`   | Decimal scalar                                          |
//! | `favorites` | Array of product IDs                                    |

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt::Display;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage keys for persisted shop state.
pub mod keys {
    /// Key for the serialized cart lines.
    pub const CART: &str = "cart";

    /// Key for the account balance.
    pub const BALANCE: &str = "balance";

    /// Key for the favorite product IDs.
    pub const FAVORITES: &str = "favorites";
}

/// Errors that can occur when reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage medium failed.
    #[error("I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded or decoded as JSON.
    #[error("serialization error for key '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value decoded but failed validation (e.g., duplicate IDs).
    #[error("corrupt value for key '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// The store is unavailable (e.g., a poisoned lock or a disabled medium).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A durable string-keyed store holding raw JSON documents.
///
/// Implementations must make a completed [`set`](KeyValueStore::set) visible
/// to every later [`get`](KeyValueStore::get) in the same process.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value for `key`, or `None` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write the raw value for `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON value stored under `key`.
///
/// # Errors
///
/// Returns `StoreError` if the read fails or the value is not valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })
}

/// Read a JSON value stored under `key` and validate it with `check`.
///
/// # Errors
///
/// Returns `StoreError::Corrupt` if `check` rejects the decoded value, and
/// the errors of [`load_json`] otherwise.
pub fn load_checked<R, T, E>(
    store: &dyn KeyValueStore,
    key: &str,
    check: impl FnOnce(R) -> Result<T, E>,
) -> Result<Option<T>, StoreError>
where
    R: DeserializeOwned,
    E: Display,
{
    load_json::<R>(store, key)?
        .map(check)
        .transpose()
        .map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StoreError` if encoding or the write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}
