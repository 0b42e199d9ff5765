//! Durable client-side storage for the OPD toolkit on SQLite.
//!
//! The browser dashboard kept its session and annotation caches in local
//! storage. Here the same string-to-string store lives in one SQLite table,
//! file-backed for the CLI and in-memory for tests.
//!
//! # Usage
//!
//! ```rust
//! use opd_core::storage::ClientStorage;
//! use opd_db::Database;
//!
//! let db = Database::open_in_memory().unwrap();
//! db.set_item("token", "secret").unwrap();
//! assert_eq!(db.get_item("token").unwrap().as_deref(), Some("secret"));
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the SQL schema.

pub mod models;
mod queries;
pub mod schema;

use opd_core::storage::ClientStorage;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// SQLite key-value store.
///
/// Cheaply cloneable (via `Rc`); clones share one connection. Single-threaded
/// by construction, like the rest of the client.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Open (creating if needed) the store at `path` and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        log::info!("[OPD] store: opened {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}

impl ClientStorage for Database {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.get(key)
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.set(key, value)
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.remove(key).map(|_| ())
    }

    fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        Database::keys_with_prefix(self, prefix)
    }
}
