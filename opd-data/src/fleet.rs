//! Fleet call statistics screen state.

use crate::list::user_message;
use chrono::NaiveDate;
use log::{error, info};
use opd_core::backend::FleetBackend;
use opd_core::error::{ApiError, Result};
use opd_core::fleet::{
    FleetCounterpart, FleetStatType, FleetStatisticsDto, FleetStatisticsQuery, SortOrder, MAX_TOP_N,
};
use serde::Serialize;

/// Which side a drill-down was opened from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrillDownKind {
    /// Callers that reached the clicked fleet
    CallersOfFleet,
    /// Fleets the clicked caller reached
    CalledByCaller,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillDown {
    pub kind: DrillDownKind,
    pub fleet: String,
    pub rows: Vec<FleetCounterpart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FleetStatisticsView {
    query: FleetStatisticsQuery,
    stats: Option<FleetStatisticsDto>,
    loading: bool,
    error: Option<String>,
    drill_down: Option<DrillDown>,
}

/// Clamp a requested ranking size into what the backend accepts.
pub fn clamp_top_n(top_n: u32) -> u32 {
    top_n.clamp(1, MAX_TOP_N)
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(ApiError::Validation(
            "Start date must not be after end date".to_string(),
        ));
    }
    Ok(())
}

impl FleetStatisticsView {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            query: FleetStatisticsQuery {
                start_date,
                end_date,
                top_n: 10,
                stat_type: FleetStatType::All,
                sort_order: SortOrder::Desc,
                caller_filter: None,
                called_filter: None,
            },
            stats: None,
            loading: false,
            error: None,
            drill_down: None,
        }
    }

    pub fn query(&self) -> &FleetStatisticsQuery {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut FleetStatisticsQuery {
        &mut self.query
    }

    pub fn stats(&self) -> Option<&FleetStatisticsDto> {
        self.stats.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn drill_down(&self) -> Option<&DrillDown> {
        self.drill_down.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn close_drill_down(&mut self) {
        self.drill_down = None;
    }

    /// Fetch statistics for the current query. On failure the statistics and
    /// any open drill-down are emptied and the banner is set.
    pub async fn load<B: FleetBackend>(&mut self, backend: &B) -> Result<()> {
        self.query.top_n = clamp_top_n(self.query.top_n);
        if let Err(e) = check_range(self.query.start_date, self.query.end_date) {
            self.stats = None;
            self.drill_down = None;
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.loading = true;
        let result = backend.fleet_statistics(&self.query).await;
        self.loading = false;

        match result {
            Ok(stats) => {
                info!(
                    "[OPD] fleet: {} calls, {} callers, {} called fleets",
                    stats.total_calls, stats.unique_callers, stats.unique_called_fleets
                );
                self.stats = Some(stats);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                error!("[OPD] fleet: statistics failed: {}", e);
                self.stats = None;
                self.drill_down = None;
                self.error = Some(user_message(&e, "Failed to load fleet statistics"));
                Err(e)
            }
        }
    }

    /// Open the list of callers that reached `fleet` in the current range.
    pub async fn open_callers_of<B: FleetBackend>(&mut self, backend: &B, fleet: &str) -> Result<()> {
        self.open(backend, DrillDownKind::CallersOfFleet, fleet).await
    }

    /// Open the list of fleets that `caller` reached in the current range.
    pub async fn open_called_by<B: FleetBackend>(&mut self, backend: &B, caller: &str) -> Result<()> {
        self.open(backend, DrillDownKind::CalledByCaller, caller).await
    }

    async fn open<B: FleetBackend>(
        &mut self,
        backend: &B,
        kind: DrillDownKind,
        fleet: &str,
    ) -> Result<()> {
        let (start, end) = (self.query.start_date, self.query.end_date);
        check_range(start, end)?;
        let result = match kind {
            DrillDownKind::CallersOfFleet => backend.unique_callers_for_fleet(fleet, start, end).await,
            DrillDownKind::CalledByCaller => {
                backend.unique_called_fleets_for_caller(fleet, start, end).await
            }
        };
        match result {
            Ok(rows) => {
                self.drill_down = Some(DrillDown {
                    kind,
                    fleet: fleet.to_string(),
                    rows,
                });
                Ok(())
            }
            Err(e) => {
                error!("[OPD] fleet: drill-down for {} failed: {}", fleet, e);
                self.drill_down = None;
                self.error = Some(user_message(&e, "Failed to load details"));
                Err(e)
            }
        }
    }
}
