// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON config documents over a pluggable blob store.
//!
//! A store only moves bytes under a key; [`ConfigService`] owns the JSON
//! encoding, so the same documents work against disk or memory.

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Byte storage for config documents, addressed by key.
pub trait ConfigStore {
    /// Bytes stored under `key`, or `None` when nothing is stored.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replace whatever is stored under `key`.
    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Keys currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>, ConfigError>;
}

/// Failure while loading or saving a config document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no per-user config directory.
    #[error("no config directory available on this platform")]
    NoConfigDir,
    /// Reading or writing the backing storage failed.
    #[error("config storage failed at {}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A stored document is not valid for the requested type.
    #[error("config `{key}` could not be decoded")]
    Decode {
        /// Document key.
        key: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A value could not be encoded as JSON.
    #[error("config `{key}` could not be encoded")]
    Encode {
        /// Document key.
        key: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Typed JSON documents on top of a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wrap `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwrap the backing store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Decode the document under `key`.
    ///
    /// Absent and zero-length documents both load as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(bytes) = self.store.read(key)?.filter(|b| !b.is_empty()) else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ConfigError::Decode {
                key: key.to_owned(),
                source,
            })
    }

    /// Decode `key`, or `T::default()` when nothing is stored.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, ConfigError> {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Encode `value` as pretty JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value).map_err(|source| ConfigError::Encode {
            key: key.to_owned(),
            source,
        })?;
        self.store.write(key, &data)?;
        tracing::debug!(key, bytes = data.len(), "config saved");
        Ok(())
    }
}
