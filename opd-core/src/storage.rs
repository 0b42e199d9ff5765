//! Durable client-side key-value storage.
//!
//! The dashboard keeps its session (token, permission list, user) and the SWR
//! annotation cache in a small string-to-string store. `opd-db` provides the
//! SQLite-backed implementation; [`MemoryStorage`] serves tests and dry runs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Well-known storage keys.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const PERMISSIONS: &str = "permissions";
    pub const USER: &str = "user";

    /// Prefix shared by every SWR annotation cache entry.
    pub const SWR_NOTES_PREFIX: &str = "swr_notes:";

    /// Key of the annotation cache entry for one (year, channel).
    pub fn swr_notes(year: i32, channel_name: &str) -> String {
        format!("{}{}:{}", SWR_NOTES_PREFIX, year, channel_name)
    }
}

/// Synchronous string key-value store with interior mutability.
pub trait ClientStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
    /// All keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
}

impl<T: ClientStorage + ?Sized> ClientStorage for Rc<T> {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove_item(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }
}

/// Drop everything that identifies the logged-in user.
///
/// Annotation caches survive; they are not tied to a session.
pub fn clear_session(storage: &dyn ClientStorage) -> anyhow::Result<()> {
    storage.remove_item(keys::TOKEN)?;
    storage.remove_item(keys::PERMISSIONS)?;
    storage.remove_item(keys::USER)?;
    log::info!("[OPD] session: cleared token, permissions and user");
    Ok(())
}

/// In-memory storage, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .items
            .borrow()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_session_keeps_note_caches() {
        let storage = MemoryStorage::new();
        storage.set_item(keys::TOKEN, "abc").unwrap();
        storage.set_item(keys::PERMISSIONS, r#"["docs.view"]"#).unwrap();
        storage.set_item(keys::USER, r#"{"name":"ops"}"#).unwrap();
        let notes_key = keys::swr_notes(2025, "CH-01");
        storage.set_item(&notes_key, r#"{"Jan-25":"antenna swap"}"#).unwrap();

        clear_session(&storage).unwrap();

        assert_eq!(storage.get_item(keys::TOKEN).unwrap(), None);
        assert_eq!(storage.get_item(keys::PERMISSIONS).unwrap(), None);
        assert_eq!(storage.get_item(keys::USER).unwrap(), None);
        assert!(storage.get_item(&notes_key).unwrap().is_some());
    }

    #[test]
    fn prefix_listing_through_rc() {
        let storage = Rc::new(MemoryStorage::new());
        storage.set_item(&keys::swr_notes(2025, "B"), "{}").unwrap();
        storage.set_item(&keys::swr_notes(2025, "A"), "{}").unwrap();
        storage.set_item(keys::TOKEN, "t").unwrap();
        let found = storage.keys_with_prefix(keys::SWR_NOTES_PREFIX).unwrap();
        assert_eq!(found, vec!["swr_notes:2025:A", "swr_notes:2025:B"]);
    }
}
