//! SQL schema for the client store.
//!
//! A single string-to-string table. Values are opaque to the store; the
//! session entries and SWR annotation caches are JSON produced by callers.

/// Returns the full SQL schema as a single batch string.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_kv_updated ON kv_store(updated_at);
    "#
}
