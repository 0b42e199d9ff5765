//! Backend capabilities the client logic is written against.
//!
//! [`crate::client::ApiClient`] implements all of them over HTTP; tests in
//! `opd-data` use in-process fakes.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::fleet::{FleetCounterpart, FleetStatisticsDto, FleetStatisticsQuery};
use crate::pagination::{ListQuery, Page};
use crate::radio::ScrapSummary;
use crate::resource::Resource;
use crate::swr::{CreateSwrHistory, PivotPayload, SwrChannel, SwrHistory, SwrImportResult, UpdateSwrHistory};
use chrono::NaiveDate;
use std::path::Path;

/// Generic CRUD over any [`Resource`].
pub trait ResourceBackend {
    async fn list<R: Resource>(&self, query: &ListQuery) -> Result<Page<R>>;
    async fn create<R: Resource>(&self, payload: &R::Create) -> Result<()>;
    async fn update<R: Resource>(&self, id: i64, payload: &R::Update) -> Result<()>;
    async fn delete<R: Resource>(&self, id: i64) -> Result<()>;
}

pub trait SwrBackend {
    async fn fetch_pivot(&self, year: i32, site: Option<&str>) -> Result<PivotPayload>;
    /// Channel with this exact name, preferring one at `site_name`.
    async fn find_channel(&self, channel_name: &str, site_name: &str) -> Result<Option<SwrChannel>>;
    /// Every history record of a channel, across all pages.
    async fn channel_history(&self, channel_id: i64) -> Result<Vec<SwrHistory>>;
    async fn create_history(&self, payload: &CreateSwrHistory) -> Result<()>;
    async fn update_history(&self, id: i64, payload: &UpdateSwrHistory) -> Result<()>;
    /// Site names for the site filter. Never fails on odd shapes, only on transport.
    async fn site_names(&self) -> Result<Vec<String>>;
    async fn import_swr(&self, file: &Path) -> Result<SwrImportResult>;
}

pub trait FleetBackend {
    async fn fleet_statistics(&self, query: &FleetStatisticsQuery) -> Result<FleetStatisticsDto>;
    async fn unique_callers_for_fleet(
        &self,
        fleet: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FleetCounterpart>>;
    async fn unique_called_fleets_for_caller(
        &self,
        caller: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FleetCounterpart>>;
}

pub trait ScrapBackend {
    async fn scrap_summary(&self, year: i32) -> Result<ScrapSummary>;
}
