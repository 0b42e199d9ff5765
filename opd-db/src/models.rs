//! Row types returned by store queries.

use serde::Serialize;

/// One stored entry, as listed by `opd store list`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredEntry {
    pub key: String,
    pub value: String,
    /// RFC 3339 timestamp of the last write
    pub updated_at: String,
}
