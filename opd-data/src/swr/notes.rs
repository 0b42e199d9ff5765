//! Editing a single pivot cell note.
//!
//! Notes live on SWR history records. Saving one finds the channel on the
//! backend, then the record of that month, and updates it; when the month has
//! no record yet a new one is created on the 15th. The pivot row and the
//! local cache are only touched once the backend accepted the change.

use super::annotations::AnnotationCache;
use super::pivot::PivotRow;
use log::{debug, info, warn};
use opd_core::backend::SwrBackend;
use opd_core::error::ApiError;
use opd_core::swr::{CreateSwrHistory, SwrHistory, UpdateSwrHistory, DEFAULT_VSWR};
use opd_core::MonthKey;
use opd_utils::dates::{format_date, parse_backend_date};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    Saved,
    Deleted,
    /// The user declined the delete confirmation
    Cancelled,
    /// Nothing to do
    Unchanged,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct NoteSaveError {
    pub message: String,
    #[source]
    pub cause: ApiError,
}

impl NoteSaveError {
    fn new(cause: ApiError, deleting: bool) -> Self {
        let fallback = if deleting {
            "Failed to delete note"
        } else {
            "Failed to save note"
        };
        let message = cause
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string());
        Self { message, cause }
    }
}

fn record_month(record: &SwrHistory) -> Option<MonthKey> {
    match parse_backend_date(&record.date) {
        Ok(date) => Some(MonthKey::from_date(&date)),
        Err(e) => {
            debug!("[OPD] notes: history {} has unusable date: {}", record.id, e);
            None
        }
    }
}

pub struct NoteEditor<'a, B: SwrBackend> {
    backend: &'a B,
    cache: AnnotationCache<'a>,
    year: i32,
}

impl<'a, B: SwrBackend> NoteEditor<'a, B> {
    pub fn new(backend: &'a B, cache: AnnotationCache<'a>, year: i32) -> Self {
        Self {
            backend,
            cache,
            year,
        }
    }

    /// Save `text` as the note of `month` on `row`. Empty text removes an
    /// existing note after `confirm` is shown the note being removed.
    pub async fn save_note<F>(
        &self,
        row: &mut PivotRow,
        month: MonthKey,
        text: &str,
        confirm: F,
    ) -> Result<NoteOutcome, NoteSaveError>
    where
        F: FnOnce(&str) -> bool,
    {
        let text = text.trim();
        let existing = row.note(month).map(str::to_string);
        let deleting = text.is_empty();
        match (&existing, deleting) {
            (None, true) => return Ok(NoteOutcome::Unchanged),
            (Some(old), true) => {
                if !confirm(old) {
                    debug!("[OPD] notes: delete of {} {} cancelled", row.channel_name, month);
                    return Ok(NoteOutcome::Cancelled);
                }
            }
            (Some(old), false) if old == text => return Ok(NoteOutcome::Unchanged),
            _ => {}
        }

        self.persist(row, month, text)
            .await
            .map_err(|e| NoteSaveError::new(e, deleting))?;

        let mut notes = row.notes.clone();
        if deleting {
            notes.remove(&month);
        } else {
            notes.insert(month, text.to_string());
        }
        row.notes = notes;

        self.sync_cache(row, month, text);
        info!(
            "[OPD] notes: {} {} {}",
            row.channel_name,
            month,
            if deleting { "deleted" } else { "saved" }
        );
        Ok(if deleting {
            NoteOutcome::Deleted
        } else {
            NoteOutcome::Saved
        })
    }

    /// Mirror an accepted change into the cache. When that write fails the
    /// channel's cached notes are dropped, so a stale local note can not
    /// override the server on the next load.
    fn sync_cache(&self, row: &PivotRow, month: MonthKey, text: &str) {
        let Err(e) = self.cache.set_note(self.year, &row.channel_name, month, text) else {
            return;
        };
        warn!("[OPD] notes: cache update for {} failed: {}", row.channel_name, e);
        match self.cache.forget(self.year, &row.channel_name) {
            Ok(()) => warn!(
                "[OPD] notes: dropped cached notes of {} {}",
                row.channel_name, self.year
            ),
            Err(e) => warn!(
                "[OPD] notes: cached notes of {} may be stale: {}",
                row.channel_name, e
            ),
        }
    }

    async fn persist(&self, row: &PivotRow, month: MonthKey, text: &str) -> opd_core::Result<()> {
        let channel = self
            .backend
            .find_channel(&row.channel_name, &row.site_name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Channel {} not found", row.channel_name)))?;

        let history = self.backend.channel_history(channel.id).await?;
        let record = history.iter().find(|r| record_month(r) == Some(month));
        let notes = (!text.is_empty()).then(|| text.to_string());
        let vswr = row.vswr(month).unwrap_or(DEFAULT_VSWR);
        let fpwr = row.fpwr(month);

        match record {
            Some(record) => {
                let date = parse_backend_date(&record.date)
                    .map(|d| format_date(&d))
                    .unwrap_or_else(|_| record.date.clone());
                let payload = UpdateSwrHistory {
                    date,
                    vswr,
                    fpwr,
                    notes,
                };
                self.backend.update_history(record.id, &payload).await
            }
            None if notes.is_some() => {
                let payload = CreateSwrHistory {
                    swr_channel_id: channel.id,
                    date: month.mid_month(),
                    vswr,
                    fpwr,
                    notes,
                };
                self.backend.create_history(&payload).await
            }
            None => {
                debug!(
                    "[OPD] notes: no record for {} {}, note was local only",
                    row.channel_name, month
                );
                Ok(())
            }
        }
    }
}
