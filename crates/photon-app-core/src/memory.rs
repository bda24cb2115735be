// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory `ConfigStore` for tests and throwaway sessions.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{ConfigError, ConfigStore};

/// Config blobs held in memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.map().get(key).cloned())
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.map().insert(key.to_owned(), data.to_vec());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.map().keys().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.write("k", b"v").unwrap();
        assert_eq!(b.read("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(b.read("x").unwrap(), None);
        assert_eq!(b.keys().unwrap(), vec!["k".to_string()]);
    }
}
