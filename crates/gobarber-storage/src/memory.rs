//! In-process store, shared between clones

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::PersistentStore;
use crate::Result;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("@GoBarber:token", "token-123").unwrap();
        assert_eq!(
            other.get("@GoBarber:token").unwrap().as_deref(),
            Some("token-123")
        );

        other.remove("@GoBarber:token").unwrap();
        assert!(store.is_empty());

        // Removing a missing key is fine
        store.remove("@GoBarber:token").unwrap();
    }
}
