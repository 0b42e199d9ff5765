//! HTTP client for the OPD backend.
//!
//! Two `reqwest` clients share one session: the default one for ordinary
//! reads and writes, and a long-timeout one for spreadsheet imports. Only the
//! default client retries, once, and only when no response came back at all.

use crate::backend::{FleetBackend, ResourceBackend, ScrapBackend, SwrBackend};
use crate::error::{ApiError, Result};
use crate::fleet::{FleetCounterpart, FleetStatisticsDto, FleetStatisticsQuery};
use crate::pagination::{ListEnvelope, ListQuery, Page};
use crate::radio::ScrapSummary;
use crate::resource::Resource;
use crate::storage::{clear_session, keys, ClientStorage};
use crate::swr::{
    CreateSwrHistory, PivotPayload, SwrChannel, SwrHistory, SwrImportResult, UpdateSwrHistory,
};
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use opd_utils::dates::format_date;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Timeout of ordinary calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout of bulk imports.
pub const DEFAULT_IMPORT_TIMEOUT: Duration = Duration::from_secs(300);

const RETRY_DELAY_MILLIS: u64 = 500;
const CHANNEL_SEARCH_PAGE_SIZE: u32 = 100;
const HISTORY_PAGE_SIZE: u32 = 200;
const MAX_HISTORY_PAGES: u32 = 50;
const SITE_LIST_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub import_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            import_timeout: DEFAULT_IMPORT_TIMEOUT,
        }
    }
}

pub struct ApiClient {
    config: ApiConfig,
    http: Client,
    import_http: Client,
    storage: Rc<dyn ClientStorage>,
}

/// Failures where the server never answered.
fn is_transport_error(e: &reqwest::Error) -> bool {
    e.status().is_none() && (e.is_connect() || e.is_timeout() || e.is_request())
}

fn send_error(what: &str, e: reqwest::Error) -> ApiError {
    if e.is_builder() {
        ApiError::Config(format!("{}: {}", what, e))
    } else {
        ApiError::Network(format!("{}: {}", what, e))
    }
}

/// Strip a `{data: ...}` wrapper, unless the object is itself a result
/// carrying a `success` flag.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") && !map.contains_key("success") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Site names out of whatever the sites endpoint returned: a paged envelope,
/// a bare array, objects with `name` or `siteName`, or plain strings.
pub fn extract_site_names(value: Value) -> Vec<String> {
    let items = match unwrap_data(value) {
        Value::Array(items) => items,
        other => {
            warn!("[OPD] api: site list has unexpected shape: {}", other);
            return Vec::new();
        }
    };
    let mut names: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj
                .get("name")
                .or_else(|| obj.get("siteName"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

impl ApiClient {
    pub fn new(config: ApiConfig, storage: Rc<dyn ClientStorage>) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        let import_http = Client::builder()
            .timeout(config.import_timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self {
            config,
            http,
            import_http,
            storage,
        })
    }

    /// Absolute URL of an `/api` path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn token(&self) -> Option<String> {
        match self.storage.get_item(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!("[OPD] api: could not read session token: {}", e);
                None
            }
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send on the default client, retrying once on a pure transport failure.
    async fn execute<F>(&self, what: &str, build: F) -> Result<Value>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let max_tries = 2;
        for attempt in 1..=max_tries {
            let request = self.authorize(build(&self.http));
            match request.send().await {
                Ok(response) => return self.handle_response(what, response).await,
                Err(e) if attempt < max_tries && is_transport_error(&e) => {
                    warn!(
                        "Attempt {}/{}: {} got no response: {}",
                        attempt, max_tries, what, e
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MILLIS)).await;
                }
                Err(e) => {
                    error!("[OPD] api: {} failed without response: {}", what, e);
                    return Err(send_error(what, e));
                }
            }
        }
        Err(ApiError::Network(format!("{}: no response", what)))
    }

    async fn handle_response(&self, what: &str, response: Response) -> Result<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("{}: {}", what, e)))?;
        if status.is_success() {
            debug!("[OPD] api: {} -> {}", what, status);
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body)
                .map_err(|e| ApiError::Decode(format!("{}: {}", what, e)));
        }
        let err = ApiError::from_status(status.as_u16(), &body);
        match &err {
            ApiError::Unauthorized => {
                warn!("[OPD] api: {} returned 401, clearing session", what);
                if let Err(e) = clear_session(self.storage.as_ref()) {
                    error!("[OPD] api: failed to clear session: {}", e);
                }
            }
            ApiError::Forbidden(message) => {
                warn!("[OPD] api: {} forbidden: {}", what, message);
            }
            other => debug!("[OPD] api: {} -> {} ({})", what, status, other),
        }
        Err(err)
    }

    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.endpoint(path);
        self.execute(&format!("GET {}", path), |http| http.get(&url).query(params))
            .await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let url = self.endpoint(path);
        let what = format!("{} {}", method, path);
        self.execute(&what, |http| {
            let request = http.request(method.clone(), &url);
            match body {
                Some(body) => request.json(body),
                None => request,
            }
        })
        .await
    }

    fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{}: {}", what, e)))
    }

    async fn counterparts(
        &self,
        path: &str,
        key: &str,
        fleet: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FleetCounterpart>> {
        let params = vec![
            (key.to_string(), fleet.to_string()),
            ("startDate".to_string(), format_date(&start)),
            ("endDate".to_string(), format_date(&end)),
        ];
        let value = unwrap_data(self.get_json(path, &params).await?);
        match serde_json::from_value::<Vec<FleetCounterpart>>(value) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                warn!("[OPD] api: {} returned an unexpected shape: {}", path, e);
                Ok(Vec::new())
            }
        }
    }
}

impl ResourceBackend for ApiClient {
    async fn list<R: Resource>(&self, query: &ListQuery) -> Result<Page<R>> {
        let value = self.get_json(R::PATH, &query.to_params()).await?;
        let envelope: ListEnvelope<R> = Self::decode(R::PATH, value)?;
        let page = envelope.into_page(query);
        debug!(
            "[OPD] api: listed {} {} rows (page {}/{})",
            page.rows.len(),
            R::LABEL,
            page.info.current_page,
            page.info.total_pages
        );
        Ok(page)
    }

    async fn create<R: Resource>(&self, payload: &R::Create) -> Result<()> {
        self.send_json(Method::POST, R::PATH, Some(payload)).await?;
        info!("[OPD] api: created {}", R::LABEL);
        Ok(())
    }

    async fn update<R: Resource>(&self, id: i64, payload: &R::Update) -> Result<()> {
        let path = format!("{}/{}", R::PATH, id);
        self.send_json(Method::PUT, &path, Some(payload)).await?;
        info!("[OPD] api: updated {} {}", R::LABEL, id);
        Ok(())
    }

    async fn delete<R: Resource>(&self, id: i64) -> Result<()> {
        let path = format!("{}/{}", R::PATH, id);
        self.send_json::<Value>(Method::DELETE, &path, None).await?;
        info!("[OPD] api: deleted {} {}", R::LABEL, id);
        Ok(())
    }
}

impl SwrBackend for ApiClient {
    async fn fetch_pivot(&self, year: i32, site: Option<&str>) -> Result<PivotPayload> {
        let mut params = vec![("year".to_string(), year.to_string())];
        if let Some(site) = site.filter(|s| !s.trim().is_empty()) {
            params.push(("site".to_string(), site.to_string()));
        }
        let value = self.get_json("swr-histories/pivot", &params).await?;
        Ok(PivotPayload::from_value(value))
    }

    async fn find_channel(&self, channel_name: &str, site_name: &str) -> Result<Option<SwrChannel>> {
        let mut query = ListQuery::with_page_size(CHANNEL_SEARCH_PAGE_SIZE);
        query.search = Some(channel_name.to_string());
        let page: Page<SwrChannel> = self.list(&query).await?;
        let mut matches: Vec<SwrChannel> = page
            .rows
            .into_iter()
            .filter(|c| c.channel_name == channel_name)
            .collect();
        let at_site = matches
            .iter()
            .position(|c| c.site_name.as_deref() == Some(site_name));
        Ok(match at_site {
            Some(idx) => Some(matches.swap_remove(idx)),
            None => matches.into_iter().next(),
        })
    }

    async fn channel_history(&self, channel_id: i64) -> Result<Vec<SwrHistory>> {
        let mut query = ListQuery::with_page_size(HISTORY_PAGE_SIZE);
        query
            .filters
            .insert("swrChannelId".to_string(), channel_id.to_string());
        let mut records = Vec::new();
        loop {
            let page: Page<SwrHistory> = self.list(&query).await?;
            let fetched = page.rows.len();
            records.extend(page.rows);
            if fetched == 0 || !page.info.has_next || query.page >= MAX_HISTORY_PAGES {
                break;
            }
            query.page += 1;
        }
        Ok(records)
    }

    async fn create_history(&self, payload: &CreateSwrHistory) -> Result<()> {
        self.send_json(Method::POST, "swr-histories", Some(payload))
            .await?;
        Ok(())
    }

    async fn update_history(&self, id: i64, payload: &UpdateSwrHistory) -> Result<()> {
        self.send_json(Method::PUT, &format!("swr-histories/{}", id), Some(payload))
            .await?;
        Ok(())
    }

    async fn site_names(&self) -> Result<Vec<String>> {
        let params = vec![
            ("page".to_string(), "1".to_string()),
            ("pageSize".to_string(), SITE_LIST_PAGE_SIZE.to_string()),
        ];
        let value = self.get_json("swr-sites", &params).await?;
        Ok(extract_site_names(value))
    }

    async fn import_swr(&self, file: &Path) -> Result<SwrImportResult> {
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            ApiError::Validation(format!("Cannot read {}: {}", file.display(), e))
        })?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("swr-import.xlsx")
            .to_string();
        info!(
            "[OPD] api: importing {} ({} bytes, timeout {:?})",
            file_name,
            bytes.len(),
            self.config.import_timeout
        );
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .authorize(self.import_http.post(self.endpoint("swr-histories/import")))
            .multipart(form);
        let response = request
            .send()
            .await
            .map_err(|e| send_error("POST swr-histories/import", e))?;
        let value = self
            .handle_response("POST swr-histories/import", response)
            .await?;
        Self::decode("swr import", unwrap_data(value))
    }
}

impl FleetBackend for ApiClient {
    async fn fleet_statistics(&self, query: &FleetStatisticsQuery) -> Result<FleetStatisticsDto> {
        let value = self
            .get_json("callrecords/fleet-statistics", &query.to_params())
            .await?;
        Self::decode("fleet statistics", unwrap_data(value))
    }

    async fn unique_callers_for_fleet(
        &self,
        fleet: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FleetCounterpart>> {
        self.counterparts("callrecords/unique-callers", "fleet", fleet, start, end)
            .await
    }

    async fn unique_called_fleets_for_caller(
        &self,
        caller: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FleetCounterpart>> {
        self.counterparts(
            "callrecords/unique-called-fleets",
            "callerFleet",
            caller,
            start,
            end,
        )
        .await
    }
}

impl ScrapBackend for ApiClient {
    async fn scrap_summary(&self, year: i32) -> Result<ScrapSummary> {
        let params = vec![("year".to_string(), year.to_string())];
        let value = self.get_json("radio-scraps/summary", &params).await?;
        Self::decode("scrap summary", unwrap_data(value))
    }
}
