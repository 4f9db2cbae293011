//! Persistent key-value store abstraction

use crate::Result;

/// A string key-value store that outlives the process.
///
/// Implementations must treat `remove` of a missing key as success.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Apply several writes as one step. `None` removes the key.
    ///
    /// The default applies them in order and stops at the first failure,
    /// leaving earlier writes in place. Stores that can should override it
    /// to apply all or nothing.
    fn write_all(&self, entries: &[(&str, Option<&str>)]) -> Result<()> {
        for (key, value) in entries {
            match value {
                Some(value) => self.set(key, value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }
}
