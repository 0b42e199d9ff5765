//! Typed key-value operations on the `kv_store` table.
//!
//! Prefix matching compares the leading characters directly instead of using
//! `LIKE`, so keys containing `%` or `_` (channel names do) match literally.

use crate::models::StoredEntry;
use crate::Database;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

impl Database {
    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self.conn.borrow();
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite `key`.
    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self.conn.borrow();
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        log::debug!("[OPD] store: wrote {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Delete `key`. Deleting a missing key is not an error.
    pub fn remove(&self, key: &str) -> anyhow::Result<bool> {
        let conn = self.conn.borrow();
        let removed = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        if removed > 0 {
            log::debug!("[OPD] store: removed {}", key);
        }
        Ok(removed > 0)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT key FROM kv_store
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// Every entry whose key starts with `prefix` (all entries for `""`).
    pub fn entries(&self, prefix: &str) -> anyhow::Result<Vec<StoredEntry>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT key, value, updated_at FROM kv_store
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key",
        )?;
        let rows = stmt
            .query_map(params![prefix], |row| {
                Ok(StoredEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("[OPD] store: {} entries under '{}'", rows.len(), prefix);
        Ok(rows)
    }

    /// Delete every entry under `prefix`, returning how many went.
    pub fn remove_prefix(&self, prefix: &str) -> anyhow::Result<usize> {
        let conn = self.conn.borrow();
        let removed = conn.execute(
            "DELETE FROM kv_store WHERE substr(key, 1, length(?1)) = ?1",
            params![prefix],
        )?;
        log::info!("[OPD] store: removed {} entries under '{}'", removed, prefix);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn set_get_overwrite() {
        let db = db();
        assert_eq!(db.get("token").unwrap(), None);
        db.set("token", "abc").unwrap();
        db.set("token", "def").unwrap();
        assert_eq!(db.get("token").unwrap().as_deref(), Some("def"));
        assert_eq!(db.entries("").unwrap().len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let db = db();
        db.set("user", "{}").unwrap();
        assert!(db.remove("user").unwrap());
        assert!(!db.remove("user").unwrap());
    }

    #[test]
    fn prefix_match_is_literal() {
        let db = db();
        db.set("swr_notes:2025:CH_1", "{}").unwrap();
        db.set("swr_notes:2025:CH%2", "{}").unwrap();
        db.set("swr_notes:2024:CH_1", "{}").unwrap();
        db.set("swrXnotes:2025:other", "{}").unwrap();

        assert_eq!(
            db.keys_with_prefix("swr_notes:2025:").unwrap(),
            vec!["swr_notes:2025:CH%2", "swr_notes:2025:CH_1"]
        );
        assert_eq!(db.keys_with_prefix("swr_notes:").unwrap().len(), 3);

        assert_eq!(db.remove_prefix("swr_notes:2025:").unwrap(), 2);
        assert_eq!(db.entries("").unwrap().len(), 2);
    }

    #[test]
    fn entries_carry_timestamps() {
        let db = db();
        db.set("permissions", r#"["docs.view"]"#).unwrap();
        let entries = db.entries("perm").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, r#"["docs.view"]"#);
        assert!(chrono::DateTime::parse_from_rfc3339(&entries[0].updated_at).is_ok());
    }
}
