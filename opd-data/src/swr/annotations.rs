//! Local annotation cache for pivot cells.
//!
//! One storage entry per (year, channel) holds a JSON object of month key to
//! note text. Cached notes override what the server sent for the same month.

use super::pivot::PivotRow;
use log::{debug, warn};
use opd_core::storage::{keys, ClientStorage};
use opd_core::MonthKey;
use std::collections::BTreeMap;

pub struct AnnotationCache<'s> {
    storage: &'s dyn ClientStorage,
}

impl<'s> AnnotationCache<'s> {
    pub fn new(storage: &'s dyn ClientStorage) -> Self {
        Self { storage }
    }

    /// Cached notes of one channel. Unreadable entries count as empty.
    pub fn get(&self, year: i32, channel_name: &str) -> BTreeMap<MonthKey, String> {
        let key = keys::swr_notes(year, channel_name);
        let raw = match self.storage.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                warn!("[OPD] annotations: reading {} failed: {}", key, e);
                return BTreeMap::new();
            }
        };
        let stored: BTreeMap<String, String> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                debug!("[OPD] annotations: ignoring malformed {}: {}", key, e);
                return BTreeMap::new();
            }
        };
        stored
            .into_iter()
            .filter_map(|(month, note)| match MonthKey::parse_in_year(&month, year) {
                Ok(month) if !note.trim().is_empty() => Some((month, note)),
                Ok(_) => None,
                Err(e) => {
                    debug!("[OPD] annotations: skipping key in {}: {}", key, e);
                    None
                }
            })
            .collect()
    }

    /// Store or clear one note. A channel left without notes loses its entry.
    pub fn set_note(
        &self,
        year: i32,
        channel_name: &str,
        month: MonthKey,
        text: &str,
    ) -> anyhow::Result<()> {
        let mut notes = self.get(year, channel_name);
        if text.trim().is_empty() {
            notes.remove(&month);
        } else {
            notes.insert(month, text.to_string());
        }
        self.write(year, channel_name, &notes)
    }

    /// Drop every cached note of one channel.
    pub fn forget(&self, year: i32, channel_name: &str) -> anyhow::Result<()> {
        self.storage.remove_item(&keys::swr_notes(year, channel_name))
    }

    fn write(
        &self,
        year: i32,
        channel_name: &str,
        notes: &BTreeMap<MonthKey, String>,
    ) -> anyhow::Result<()> {
        let key = keys::swr_notes(year, channel_name);
        if notes.is_empty() {
            self.storage.remove_item(&key)
        } else {
            self.storage.set_item(&key, &serde_json::to_string(notes)?)
        }
    }

    /// Overlay cached notes onto a freshly fetched row.
    pub fn merge(&self, year: i32, row: &mut PivotRow) {
        for (month, note) in self.get(year, &row.channel_name) {
            if !row.monthly_vswr.contains_key(&month) {
                continue;
            }
            if let Some(server) = row.notes.get(&month).filter(|s| **s != note) {
                debug!(
                    "[OPD] annotations: {} {} local note overrides server '{}'",
                    row.channel_name, month, server
                );
            }
            row.notes.insert(month, note);
        }
    }

    pub fn merge_all(&self, year: i32, rows: &mut [PivotRow]) {
        for row in rows.iter_mut() {
            self.merge(year, row);
        }
    }

    /// Channels with cached notes for `year`.
    pub fn channels(&self, year: i32) -> anyhow::Result<Vec<String>> {
        let prefix = format!("{}{}:", keys::SWR_NOTES_PREFIX, year);
        Ok(self
            .storage
            .keys_with_prefix(&prefix)?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }
}
