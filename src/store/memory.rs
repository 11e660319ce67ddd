use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::KeyValueStore;

/// In-memory store backed by a mutex-guarded map.
///
/// Used by the cache tests and by embedders who want a purely ephemeral
/// cache with the same semantics as the file-backed one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items.lock().map_err(|_| anyhow!("Store mutex poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
