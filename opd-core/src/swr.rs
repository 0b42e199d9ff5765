//! SWR (standing wave ratio) monitoring: sites, channels, monthly history
//! records and the yearly pivot payload.

use crate::error::Result;
use crate::resource::{require_non_blank, require_range, require_selected, Resource, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// VSWR readings live in this range when present.
pub const VSWR_RANGE: (f64, f64) = (1.0, 4.0);
/// Forward power range in watts.
pub const FPWR_RANGE: (f64, f64) = (0.0, 200.0);
/// Stored in place of a missing VSWR when a history record must be written.
pub const DEFAULT_VSWR: f64 = 1.0;
/// Threshold used when a channel does not declare its own.
pub const DEFAULT_EXPECTED_SWR_MAX: f64 = 1.5;

fn default_expected_swr_max() -> f64 {
    DEFAULT_EXPECTED_SWR_MAX
}

/// Radio network a site (or scrapped radio) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SiteType {
    #[serde(alias = "trunking", alias = "TRUNKING")]
    Trunking,
    #[serde(alias = "conventional", alias = "CONVENTIONAL")]
    Conventional,
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteType::Trunking => write!(f, "Trunking"),
            SiteType::Conventional => write!(f, "Conventional"),
        }
    }
}

impl FromStr for SiteType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trunking" => Ok(SiteType::Trunking),
            "conventional" => Ok(SiteType::Conventional),
            other => Err(format!("unknown site type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwrSite {
    pub id: i64,
    pub name: String,
    pub site_type: SiteType,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwrSiteForm {
    pub name: String,
    pub site_type: SiteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Validate for SwrSiteForm {
    fn validate(&self) -> Result<()> {
        require_non_blank("Site name", &self.name)
    }
}

impl Resource for SwrSite {
    const PATH: &'static str = "swr-sites";
    const LABEL: &'static str = "SWR site";
    type Create = SwrSiteForm;
    type Update = SwrSiteForm;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwrChannel {
    pub id: i64,
    pub channel_name: String,
    pub swr_site_id: i64,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default = "default_expected_swr_max")]
    pub expected_swr_max: f64,
    #[serde(default)]
    pub expected_pwr_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwrChannelForm {
    pub channel_name: String,
    #[serde(default)]
    pub swr_site_id: i64,
    #[serde(default = "default_expected_swr_max")]
    pub expected_swr_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_pwr_max: Option<f64>,
}

impl Validate for SwrChannelForm {
    fn validate(&self) -> Result<()> {
        require_non_blank("Channel name", &self.channel_name)?;
        require_selected("site", self.swr_site_id)?;
        require_range("Expected SWR max", self.expected_swr_max, VSWR_RANGE.0, VSWR_RANGE.1)
    }
}

impl Resource for SwrChannel {
    const PATH: &'static str = "swr-channels";
    const LABEL: &'static str = "SWR channel";
    type Create = SwrChannelForm;
    type Update = SwrChannelForm;

    fn id(&self) -> i64 {
        self.id
    }
}

/// One monthly measurement of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwrHistory {
    pub id: i64,
    pub swr_channel_id: i64,
    /// Backend date, plain or with a time component
    pub date: String,
    #[serde(default)]
    pub vswr: Option<f64>,
    #[serde(default)]
    pub fpwr: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwrHistory {
    pub swr_channel_id: i64,
    pub date: NaiveDate,
    pub vswr: f64,
    #[serde(default)]
    pub fpwr: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSwrHistory {
    pub date: String,
    pub vswr: f64,
    #[serde(default)]
    pub fpwr: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn validate_reading(vswr: f64, fpwr: Option<f64>) -> Result<()> {
    require_range("VSWR", vswr, VSWR_RANGE.0, VSWR_RANGE.1)?;
    if let Some(fpwr) = fpwr {
        require_range("FPWR", fpwr, FPWR_RANGE.0, FPWR_RANGE.1)?;
    }
    Ok(())
}

impl Validate for CreateSwrHistory {
    fn validate(&self) -> Result<()> {
        require_selected("channel", self.swr_channel_id)?;
        validate_reading(self.vswr, self.fpwr)
    }
}

impl Validate for UpdateSwrHistory {
    fn validate(&self) -> Result<()> {
        validate_reading(self.vswr, self.fpwr)
    }
}

impl Resource for SwrHistory {
    const PATH: &'static str = "swr-histories";
    const LABEL: &'static str = "SWR history";
    type Create = CreateSwrHistory;
    type Update = UpdateSwrHistory;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Pivot row exactly as the server sends it. Month maps may be sparse and
/// keyed by `Mon-YY` strings; `opd-data` normalizes them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRowDto {
    pub channel_name: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub site_type: Option<SiteType>,
    #[serde(default = "default_expected_swr_max")]
    pub expected_swr_max: f64,
    pub monthly_vswr: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub monthly_fpwr: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub notes: BTreeMap<String, Option<String>>,
}

/// Flat form of the same data: one entry per (channel, month).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMonthReading {
    pub channel_name: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub site_type: Option<SiteType>,
    /// `Mon-YY`
    pub month: String,
    #[serde(default)]
    pub vswr: Option<f64>,
    #[serde(default)]
    pub fpwr: Option<f64>,
    #[serde(default = "default_expected_swr_max")]
    pub expected_swr_max: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub history_record_id: Option<i64>,
}

/// Everything the pivot endpoint has been seen to return.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PivotPayload {
    Rows(Vec<PivotRowDto>),
    Readings(Vec<ChannelMonthReading>),
    Wrapped { data: Box<PivotPayload> },
}

impl PivotPayload {
    /// Decode a raw body, falling back to an empty payload when the shape is
    /// not recognized.
    pub fn from_value(value: serde_json::Value) -> Self {
        match serde_json::from_value::<PivotPayload>(value) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("[OPD] pivot: unrecognized payload shape, showing no rows: {}", e);
                PivotPayload::Rows(Vec::new())
            }
        }
    }
}

/// Result of a spreadsheet import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwrImportResult {
    pub success: bool,
    pub records_created: u32,
    pub records_updated: u32,
    pub channels_created: u32,
    pub errors: Vec<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pivot_payload_accepts_rows_readings_and_wrapped() {
        let rows = PivotPayload::from_value(json!([{
            "channelName": "CH-1", "siteName": "Hauling", "siteType": "Trunking",
            "expectedSwrMax": 1.5, "monthlyVswr": {"Jan-25": 1.3}
        }]));
        assert!(matches!(rows, PivotPayload::Rows(ref r) if r.len() == 1));

        let readings = PivotPayload::from_value(json!([{
            "channelName": "CH-1", "siteName": "Hauling", "month": "Feb-25", "vswr": 1.7
        }]));
        assert!(matches!(readings, PivotPayload::Readings(ref r) if r[0].month == "Feb-25"));

        let wrapped = PivotPayload::from_value(json!({"data": [{
            "channelName": "CH-2", "monthlyVswr": {}
        }]}));
        match wrapped {
            PivotPayload::Wrapped { data } => {
                assert!(matches!(*data, PivotPayload::Rows(ref r) if r[0].channel_name == "CH-2"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pivot_payload_garbage_is_empty() {
        let payload = PivotPayload::from_value(json!({"status": "ok"}));
        assert_eq!(payload, PivotPayload::Rows(Vec::new()));
    }

    #[test]
    fn site_type_is_lenient() {
        let t: SiteType = serde_json::from_str(r#""conventional""#).unwrap();
        assert_eq!(t, SiteType::Conventional);
        assert_eq!("TRUNKING".parse::<SiteType>(), Ok(SiteType::Trunking));
    }

    #[test]
    fn history_reading_ranges() {
        let ok = UpdateSwrHistory {
            date: "2025-01-15".to_string(),
            vswr: 1.2,
            fpwr: Some(95.0),
            notes: None,
        };
        assert!(ok.validate().is_ok());
        let bad = UpdateSwrHistory { vswr: 4.5, ..ok.clone() };
        assert!(bad.validate().is_err());
        let bad_power = UpdateSwrHistory { fpwr: Some(250.0), ..ok };
        assert!(bad_power.validate().is_err());
    }

    #[test]
    fn import_result_tolerates_missing_fields() {
        let result: SwrImportResult =
            serde_json::from_str(r#"{"success":true,"recordsCreated":12}"#).unwrap();
        assert!(result.success);
        assert_eq!(result.records_created, 12);
        assert!(result.errors.is_empty());
    }
}
