//! Per-channel yearly pivot of VSWR / FPWR readings and the chart data
//! derived from it.

use super::annotations::AnnotationCache;
use log::{info, warn};
use opd_core::backend::SwrBackend;
use opd_core::error::Result;
use opd_core::swr::{
    ChannelMonthReading, PivotPayload, PivotRowDto, SiteType, FPWR_RANGE, VSWR_RANGE,
};
use opd_core::MonthKey;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Rows per pivot page. Charts only ever see one page.
pub const PIVOT_PAGE_SIZE: usize = 16;

/// VSWR at or above the channel's expected maximum but below this is a
/// warning; anything higher is critical.
pub const VSWR_WARNING_LIMIT: f64 = 2.0;
pub const FPWR_GOOD_LIMIT: f64 = 100.0;
pub const FPWR_WARNING_LIMIT: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Good,
    Warning,
    Critical,
    NoData,
}

impl Status {
    pub fn vswr(value: Option<f64>, expected_max: f64) -> Self {
        match value {
            None => Status::NoData,
            Some(v) if v < expected_max => Status::Good,
            Some(v) if v < VSWR_WARNING_LIMIT => Status::Warning,
            Some(_) => Status::Critical,
        }
    }

    pub fn fpwr(value: Option<f64>) -> Self {
        match value {
            None => Status::NoData,
            Some(w) if w <= FPWR_GOOD_LIMIT => Status::Good,
            Some(w) if w <= FPWR_WARNING_LIMIT => Status::Warning,
            Some(_) => Status::Critical,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Good => write!(f, "good"),
            Status::Warning => write!(f, "warning"),
            Status::Critical => write!(f, "critical"),
            Status::NoData => write!(f, "noData"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub good: usize,
    pub warning: usize,
    pub critical: usize,
    pub no_data: usize,
}

impl StatusCounts {
    fn add(&mut self, status: Status) {
        match status {
            Status::Good => self.good += 1,
            Status::Warning => self.warning += 1,
            Status::Critical => self.critical += 1,
            Status::NoData => self.no_data += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.good + self.warning + self.critical + self.no_data
    }
}

/// One channel's year. Both reading maps always hold the twelve months of
/// the year; missing readings are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRow {
    pub channel_name: String,
    pub site_name: String,
    pub site_type: Option<SiteType>,
    pub expected_swr_max: f64,
    pub monthly_vswr: BTreeMap<MonthKey, Option<f64>>,
    pub monthly_fpwr: BTreeMap<MonthKey, Option<f64>>,
    pub notes: BTreeMap<MonthKey, String>,
    /// History records the server pointed at, when it sent readings
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub history_record_ids: BTreeMap<MonthKey, i64>,
}

impl PivotRow {
    pub fn new(
        year: i32,
        channel_name: &str,
        site_name: &str,
        site_type: Option<SiteType>,
        expected_swr_max: f64,
    ) -> Self {
        let empty: BTreeMap<MonthKey, Option<f64>> =
            MonthKey::year_keys(year).map(|k| (k, None)).collect();
        Self {
            channel_name: channel_name.to_string(),
            site_name: site_name.to_string(),
            site_type,
            expected_swr_max,
            monthly_vswr: empty.clone(),
            monthly_fpwr: empty,
            notes: BTreeMap::new(),
            history_record_ids: BTreeMap::new(),
        }
    }

    pub fn vswr(&self, month: MonthKey) -> Option<f64> {
        self.monthly_vswr.get(&month).copied().flatten()
    }

    pub fn fpwr(&self, month: MonthKey) -> Option<f64> {
        self.monthly_fpwr.get(&month).copied().flatten()
    }

    pub fn note(&self, month: MonthKey) -> Option<&str> {
        self.notes.get(&month).map(String::as_str)
    }

    pub fn vswr_status(&self, month: MonthKey) -> Status {
        Status::vswr(self.vswr(month), self.expected_swr_max)
    }

    pub fn fpwr_status(&self, month: MonthKey) -> Status {
        Status::fpwr(self.fpwr(month))
    }

    /// Label used for chart series.
    pub fn series_name(&self) -> String {
        if self.site_name.is_empty() {
            self.channel_name.clone()
        } else {
            format!("{} ({})", self.channel_name, self.site_name)
        }
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.channel_name.to_lowercase().contains(needle)
            || self.site_name.to_lowercase().contains(needle)
    }

    /// Resolve a wire month key to one of this row's months. Keys of another
    /// year or unparsable keys are dropped.
    fn month_slot(&self, raw: &str, year: i32) -> Option<MonthKey> {
        match MonthKey::parse_in_year(raw, year) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("[OPD] pivot: {} has unusable month key: {}", self.channel_name, e);
                None
            }
        }
    }

    fn set_reading(&mut self, month: MonthKey, vswr: Option<f64>, fpwr: Option<f64>) {
        check_domain(&self.channel_name, month, "VSWR", vswr, VSWR_RANGE);
        check_domain(&self.channel_name, month, "FPWR", fpwr, FPWR_RANGE);
        if vswr.is_some() {
            self.monthly_vswr.insert(month, vswr);
        }
        if fpwr.is_some() {
            self.monthly_fpwr.insert(month, fpwr);
        }
    }

    fn set_note(&mut self, month: MonthKey, note: Option<String>) {
        if let Some(text) = note.filter(|n| !n.trim().is_empty()) {
            self.notes.insert(month, text);
        }
    }
}

/// Out-of-domain readings are kept, just reported.
fn check_domain(channel: &str, month: MonthKey, what: &str, value: Option<f64>, range: (f64, f64)) {
    if let Some(v) = value {
        if !(range.0..=range.1).contains(&v) {
            warn!(
                "[OPD] pivot: {} {} {} = {} outside [{}, {}]",
                channel, month, what, v, range.0, range.1
            );
        }
    }
}

fn row_from_dto(dto: PivotRowDto, year: i32) -> PivotRow {
    let mut row = PivotRow::new(
        year,
        &dto.channel_name,
        &dto.site_name,
        dto.site_type,
        dto.expected_swr_max,
    );
    for (raw, vswr) in dto.monthly_vswr {
        if let Some(month) = row.month_slot(&raw, year) {
            row.set_reading(month, vswr, None);
        }
    }
    for (raw, fpwr) in dto.monthly_fpwr {
        if let Some(month) = row.month_slot(&raw, year) {
            row.set_reading(month, None, fpwr);
        }
    }
    for (raw, note) in dto.notes {
        if let Some(month) = row.month_slot(&raw, year) {
            row.set_note(month, note);
        }
    }
    row
}

/// Group flat readings by (channel, site), keeping first-seen order.
fn rows_from_readings(readings: Vec<ChannelMonthReading>, year: i32) -> Vec<PivotRow> {
    let mut rows: Vec<PivotRow> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for reading in readings {
        let key = (reading.channel_name.clone(), reading.site_name.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            rows.push(PivotRow::new(
                year,
                &reading.channel_name,
                &reading.site_name,
                reading.site_type,
                reading.expected_swr_max,
            ));
            rows.len() - 1
        });
        let row = &mut rows[slot];
        if row.site_type.is_none() {
            row.site_type = reading.site_type;
        }
        let Some(month) = row.month_slot(&reading.month, year) else {
            continue;
        };
        row.set_reading(month, reading.vswr, reading.fpwr);
        row.set_note(month, reading.note);
        if let Some(id) = reading.history_record_id {
            row.history_record_ids.insert(month, id);
        }
    }
    rows
}

/// Normalize any supported payload into one row per channel.
pub fn build_rows(payload: PivotPayload, year: i32) -> Vec<PivotRow> {
    match payload {
        PivotPayload::Rows(dtos) => dtos.into_iter().map(|d| row_from_dto(d, year)).collect(),
        PivotPayload::Readings(readings) => rows_from_readings(readings, year),
        PivotPayload::Wrapped { data } => build_rows(*data, year),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SiteTypeFilter {
    #[default]
    All,
    Only(SiteType),
}

impl FromStr for SiteTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(SiteTypeFilter::All);
        }
        s.parse::<SiteType>().map(SiteTypeFilter::Only)
    }
}

/// Client-side pivot filters, applied as search, then sites, then site type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotFilter {
    pub search: String,
    /// Empty means every site
    pub sites: BTreeSet<String>,
    pub site_type: SiteTypeFilter,
}

impl PivotFilter {
    pub fn apply<'r>(&self, rows: &'r [PivotRow]) -> Vec<&'r PivotRow> {
        let needle = self.search.trim().to_lowercase();
        rows.iter()
            .filter(|row| needle.is_empty() || row.matches_search(&needle))
            .filter(|row| self.sites.is_empty() || self.sites.contains(&row.site_name))
            .filter(|row| match self.site_type {
                SiteTypeFilter::All => true,
                SiteTypeFilter::Only(t) => row.site_type == Some(t),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    /// Twelve points, January first
    pub points: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBar {
    pub site_name: String,
    /// Mean of the non-null VSWR cells, `None` when there are none
    pub mean_vswr: Option<f64>,
    pub warning_cells: usize,
    pub critical_cells: usize,
}

/// Everything the charts of one page need.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotCharts {
    pub months: Vec<String>,
    pub line: Vec<LineSeries>,
    pub vswr_status: StatusCounts,
    pub fpwr_status: StatusCounts,
    pub site_bars: Vec<SiteBar>,
}

/// Fetched pivot of one year plus the view state on top of it.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    year: i32,
    rows: Vec<PivotRow>,
    filter: PivotFilter,
    page: usize,
}

impl PivotTable {
    pub fn new(year: i32, rows: Vec<PivotRow>) -> Self {
        Self {
            year,
            rows,
            filter: PivotFilter::default(),
            page: 1,
        }
    }

    /// Fetch, normalize and overlay cached notes.
    pub async fn load<B: SwrBackend>(
        backend: &B,
        cache: &AnnotationCache<'_>,
        year: i32,
        site: Option<&str>,
    ) -> Result<Self> {
        let payload = backend.fetch_pivot(year, site).await?;
        let mut rows = build_rows(payload, year);
        cache.merge_all(year, &mut rows);
        info!("[OPD] pivot: {} channels for {}", rows.len(), year);
        Ok(Self::new(year, rows))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn months(&self) -> impl Iterator<Item = MonthKey> {
        MonthKey::year_keys(self.year)
    }

    pub fn filter(&self) -> &PivotFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: PivotFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Move to `page`, clamped into the existing pages.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages().max(1));
    }

    pub fn filtered(&self) -> Vec<&PivotRow> {
        self.filter.apply(&self.rows)
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(PIVOT_PAGE_SIZE)
    }

    pub fn page_rows(&self) -> Vec<&PivotRow> {
        self.filtered()
            .into_iter()
            .skip((self.page - 1) * PIVOT_PAGE_SIZE)
            .take(PIVOT_PAGE_SIZE)
            .collect()
    }

    /// Distinct site names across all fetched rows, sorted.
    pub fn site_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.site_name.clone())
            .filter(|s| !s.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn row_mut(&mut self, channel_name: &str, site_name: &str) -> Option<&mut PivotRow> {
        self.rows
            .iter_mut()
            .find(|r| r.channel_name == channel_name && r.site_name == site_name)
    }

    pub fn line_series(&self) -> Vec<LineSeries> {
        self.page_rows()
            .into_iter()
            .map(|row| LineSeries {
                name: row.series_name(),
                points: row.monthly_vswr.values().copied().collect(),
            })
            .collect()
    }

    pub fn status_distribution(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for row in self.page_rows() {
            for month in self.months() {
                counts.add(row.vswr_status(month));
            }
        }
        counts
    }

    pub fn fpwr_distribution(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for row in self.page_rows() {
            for month in self.months() {
                counts.add(row.fpwr_status(month));
            }
        }
        counts
    }

    pub fn site_bars(&self) -> Vec<SiteBar> {
        let mut sites: BTreeMap<&str, (f64, usize, usize, usize)> = BTreeMap::new();
        for row in self.page_rows() {
            let entry = sites.entry(row.site_name.as_str()).or_default();
            for month in self.months() {
                if let Some(v) = row.vswr(month) {
                    entry.0 += v;
                    entry.1 += 1;
                }
                match row.vswr_status(month) {
                    Status::Warning => entry.2 += 1,
                    Status::Critical => entry.3 += 1,
                    _ => {}
                }
            }
        }
        sites
            .into_iter()
            .map(|(site, (sum, n, warning, critical))| SiteBar {
                site_name: site.to_string(),
                mean_vswr: (n > 0).then(|| sum / n as f64),
                warning_cells: warning,
                critical_cells: critical,
            })
            .collect()
    }

    pub fn charts(&self) -> PivotCharts {
        PivotCharts {
            months: self.months().map(|m| m.to_string()).collect(),
            line: self.line_series(),
            vswr_status: self.status_distribution(),
            fpwr_status: self.fpwr_distribution(),
            site_bars: self.site_bars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn row(channel: &str, site: &str, site_type: SiteType) -> PivotRow {
        PivotRow::new(2025, channel, site, Some(site_type), 1.5)
    }

    #[test]
    fn vswr_buckets() {
        assert_eq!(Status::vswr(Some(1.4), 1.5), Status::Good);
        assert_eq!(Status::vswr(Some(1.5), 1.5), Status::Warning);
        assert_eq!(Status::vswr(Some(1.5), 1.6), Status::Good);
        assert_eq!(Status::vswr(Some(1.6), 1.5), Status::Warning);
        assert_eq!(Status::vswr(Some(2.1), 1.5), Status::Critical);
        assert_eq!(Status::vswr(None, 1.5), Status::NoData);
    }

    #[test]
    fn fpwr_buckets() {
        assert_eq!(Status::fpwr(Some(90.0)), Status::Good);
        assert_eq!(Status::fpwr(Some(100.0)), Status::Good);
        assert_eq!(Status::fpwr(Some(120.0)), Status::Warning);
        assert_eq!(Status::fpwr(Some(160.0)), Status::Critical);
        assert_eq!(Status::fpwr(None), Status::NoData);
    }

    #[test]
    fn dto_rows_always_have_twelve_months() {
        let payload: PivotPayload = serde_json::from_value(json!([{
            "channelName": "CH-1",
            "siteName": "Bengalon",
            "siteType": "Trunking",
            "expectedSwrMax": 1.5,
            "monthlyVswr": {"Feb-25": 1.3, "Jul-25": null, "Mar-24": 1.9},
            "monthlyFpwr": {"Feb-25": 80.0},
            "notes": {"Feb-25": "antenna replaced", "Mar-25": null}
        }]))
        .unwrap();
        let rows = build_rows(payload, 2025);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        let expected: Vec<String> = MonthKey::year_keys(2025).map(|k| k.to_string()).collect();
        let vswr_keys: Vec<String> = row.monthly_vswr.keys().map(|k| k.to_string()).collect();
        let fpwr_keys: Vec<String> = row.monthly_fpwr.keys().map(|k| k.to_string()).collect();
        assert_eq!(vswr_keys, expected);
        assert_eq!(fpwr_keys, expected);
        assert_eq!(row.vswr(key("Feb-25")), Some(1.3));
        assert_eq!(row.vswr(key("Jan-25")), None);
        assert_eq!(row.fpwr(key("Feb-25")), Some(80.0));
        assert_eq!(row.note(key("Feb-25")), Some("antenna replaced"));
        assert_eq!(row.notes.len(), 1);
    }

    #[test]
    fn month_keys_follow_the_selected_year_outside_the_2000s() {
        let payload: PivotPayload = serde_json::from_value(json!([{
            "channelName": "CH-1",
            "siteName": "Bengalon",
            "expectedSwrMax": 1.5,
            "monthlyVswr": {"Feb-99": 1.3, "Mar-98": 1.9},
            "monthlyFpwr": {"Feb-99": 80.0},
            "notes": {"Feb-99": "x"}
        }]))
        .unwrap();
        let rows = build_rows(payload, 1999);
        let row = &rows[0];
        let feb = MonthKey::new(1999, 2).unwrap();
        assert!(row.monthly_vswr.keys().all(|k| k.year() == 1999));
        assert_eq!(row.vswr(feb), Some(1.3));
        assert_eq!(row.fpwr(feb), Some(80.0));
        assert_eq!(row.note(feb), Some("x"));
        assert_eq!(row.monthly_vswr.values().flatten().count(), 1);
    }

    #[test]
    fn readings_are_grouped_per_channel_and_site() {
        let payload = PivotPayload::from_value(json!({"data": [
            {"channelName": "CH-1", "siteName": "A", "month": "Jan-25", "vswr": 1.2, "historyRecordId": 7},
            {"channelName": "CH-2", "siteName": "A", "month": "Jan-25", "vswr": 2.4},
            {"channelName": "CH-1", "siteName": "A", "month": "Apr-25", "fpwr": 120.0, "note": "check"},
            {"channelName": "CH-1", "siteName": "B", "month": "Jan-25", "vswr": 1.1}
        ]}));
        let rows = build_rows(payload, 2025);
        let names: Vec<String> = rows.iter().map(|r| r.series_name()).collect();
        assert_eq!(names, vec!["CH-1 (A)", "CH-2 (A)", "CH-1 (B)"]);
        for row in &rows {
            assert_eq!(row.monthly_vswr.len(), 12);
            assert_eq!(row.monthly_fpwr.len(), 12);
        }
        assert_eq!(rows[0].vswr(key("Jan-25")), Some(1.2));
        assert_eq!(rows[0].fpwr(key("Apr-25")), Some(120.0));
        assert_eq!(rows[0].note(key("Apr-25")), Some("check"));
        assert_eq!(rows[0].history_record_ids.get(&key("Jan-25")), Some(&7));
    }

    #[test]
    fn unknown_payload_gives_no_rows() {
        let payload = PivotPayload::from_value(json!({"unexpected": true}));
        assert!(build_rows(payload, 2025).is_empty());
    }

    #[test]
    fn filters_apply_in_order() {
        let rows = vec![
            row("CH-1", "Bengalon", SiteType::Trunking),
            row("CH-2", "Sangatta", SiteType::Conventional),
            row("Repeater", "Bengalon", SiteType::Conventional),
        ];
        let mut table = PivotTable::new(2025, rows);

        table.set_filter(PivotFilter {
            search: "BENG".to_string(),
            ..Default::default()
        });
        assert_eq!(table.filtered().len(), 2);

        table.set_filter(PivotFilter {
            search: "ch-".to_string(),
            sites: BTreeSet::from(["Sangatta".to_string()]),
            site_type: SiteTypeFilter::All,
        });
        assert_eq!(table.filtered()[0].channel_name, "CH-2");

        table.set_filter(PivotFilter {
            site_type: "trunking".parse().unwrap(),
            ..Default::default()
        });
        let names: Vec<&str> = table.filtered().iter().map(|r| r.channel_name.as_str()).collect();
        assert_eq!(names, vec!["CH-1"]);
    }

    #[test]
    fn charts_reflect_only_the_current_page() {
        let rows: Vec<PivotRow> = (0..20)
            .map(|i| {
                let mut r = row(&format!("CH-{:02}", i), "Site", SiteType::Trunking);
                r.monthly_vswr.insert(key("Jan-25"), Some(1.2));
                r
            })
            .collect();
        let mut table = PivotTable::new(2025, rows);
        assert_eq!(table.total_pages(), 2);
        assert_eq!(table.page_rows().len(), 16);
        assert_eq!(table.line_series().len(), 16);
        assert_eq!(table.status_distribution().total(), 16 * 12);
        assert_eq!(table.status_distribution().good, 16);

        table.set_page(2);
        assert_eq!(table.page_rows().len(), 4);
        assert_eq!(table.status_distribution().good, 4);

        table.set_page(9);
        assert_eq!(table.page(), 2);
    }

    #[test]
    fn filter_change_resets_page() {
        let rows: Vec<PivotRow> = (0..40)
            .map(|i| row(&format!("CH-{}", i), "S", SiteType::Trunking))
            .collect();
        let mut table = PivotTable::new(2025, rows);
        table.set_page(3);
        assert_eq!(table.page(), 3);
        table.set_filter(PivotFilter {
            search: "ch".to_string(),
            ..Default::default()
        });
        assert_eq!(table.page(), 1);
    }

    #[test]
    fn site_bars_average_non_null_cells() {
        let mut a = row("CH-1", "Alpha", SiteType::Trunking);
        a.monthly_vswr.insert(key("Jan-25"), Some(1.2));
        a.monthly_vswr.insert(key("Feb-25"), Some(1.8));
        let mut b = row("CH-2", "Alpha", SiteType::Trunking);
        b.monthly_vswr.insert(key("Jan-25"), Some(2.4));
        let c = row("CH-3", "Beta", SiteType::Conventional);
        let table = PivotTable::new(2025, vec![a, b, c]);

        let bars = table.site_bars();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].site_name, "Alpha");
        let mean = bars[0].mean_vswr.unwrap();
        assert!((mean - 1.8).abs() < 1e-9);
        assert_eq!(bars[0].warning_cells, 1);
        assert_eq!(bars[0].critical_cells, 1);
        assert_eq!(bars[1].mean_vswr, None);
    }

    #[test]
    fn rows_serialize_with_month_key_strings() {
        let mut r = row("CH-1", "A", SiteType::Trunking);
        r.notes.insert(key("Mar-25"), "ok".to_string());
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["monthlyVswr"].as_object().unwrap().len(), 12);
        assert!(value["monthlyVswr"]["Jan-25"].is_null());
        assert_eq!(value["notes"]["Mar-25"], "ok");
        assert!(value.get("historyRecordIds").is_none());
    }
}
