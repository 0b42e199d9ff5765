//! Call record statistics per fleet (caller / called party identifiers).

use chrono::NaiveDate;
use opd_utils::dates::format_date;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on the ranking size the backend will compute.
pub const MAX_TOP_N: u32 = 100;

/// Which side of the call the ranking is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FleetStatType {
    #[default]
    All,
    Caller,
    Called,
}

impl fmt::Display for FleetStatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetStatType::All => write!(f, "All"),
            FleetStatType::Caller => write!(f, "Caller"),
            FleetStatType::Called => write!(f, "Called"),
        }
    }
}

impl FromStr for FleetStatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(FleetStatType::All),
            "caller" => Ok(FleetStatType::Caller),
            "called" => Ok(FleetStatType::Called),
            other => Err(format!("unknown statistics type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetStatisticsQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub top_n: u32,
    pub stat_type: FleetStatType,
    pub sort_order: SortOrder,
    pub caller_filter: Option<String>,
    pub called_filter: Option<String>,
}

impl FleetStatisticsQuery {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("startDate".to_string(), format_date(&self.start_date)),
            ("endDate".to_string(), format_date(&self.end_date)),
            ("top".to_string(), self.top_n.to_string()),
            ("type".to_string(), self.stat_type.to_string()),
            ("sortOrder".to_string(), self.sort_order.to_string()),
        ];
        if let Some(caller) = self.caller_filter.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("callerFleet".to_string(), caller.trim().to_string()));
        }
        if let Some(called) = self.called_filter.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("calledFleet".to_string(), called.trim().to_string()));
        }
        params
    }
}

/// One line of a top-N ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetRank {
    pub fleet: String,
    #[serde(default)]
    pub call_count: u64,
    #[serde(default)]
    pub total_duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FleetStatisticsDto {
    pub total_calls: u64,
    pub unique_callers: u64,
    pub unique_called_fleets: u64,
    pub top_callers: Vec<FleetRank>,
    pub top_called_fleets: Vec<FleetRank>,
}

/// A counterpart listed in a drill-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetCounterpart {
    pub fleet: String,
    #[serde(default)]
    pub call_count: u64,
}
