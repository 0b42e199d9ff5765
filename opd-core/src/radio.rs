//! Radio asset inventory: trunking, conventional, engraved (grafir) and
//! scrapped units, plus the yearly scrap summary.

use crate::error::Result;
use crate::resource::{require_non_blank, Resource, Validate};
use crate::swr::SiteType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioTrunking {
    pub id: i64,
    /// Unit fleet identifier
    pub ufi: String,
    pub serial_number: String,
    pub radio_type: String,
    #[serde(default)]
    pub fleet: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioTrunkingForm {
    pub ufi: String,
    pub serial_number: String,
    pub radio_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for RadioTrunkingForm {
    fn validate(&self) -> Result<()> {
        require_non_blank("UFI", &self.ufi)?;
        require_non_blank("Serial number", &self.serial_number)
    }
}

impl Resource for RadioTrunking {
    const PATH: &'static str = "radio-trunkings";
    const LABEL: &'static str = "trunking radio";
    type Create = RadioTrunkingForm;
    type Update = RadioTrunkingForm;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioConventional {
    pub id: i64,
    pub serial_number: String,
    pub radio_type: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioConventionalForm {
    pub serial_number: String,
    pub radio_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for RadioConventionalForm {
    fn validate(&self) -> Result<()> {
        require_non_blank("Serial number", &self.serial_number)
    }
}

impl Resource for RadioConventional {
    const PATH: &'static str = "radio-conventionals";
    const LABEL: &'static str = "conventional radio";
    type Create = RadioConventionalForm;
    type Update = RadioConventionalForm;

    fn id(&self) -> i64 {
        self.id
    }
}

/// A radio carrying an asset engraving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioGrafir {
    pub id: i64,
    pub serial_number: String,
    pub unit_number: String,
    #[serde(default)]
    pub nrp: Option<String>,
    #[serde(default)]
    pub engraving: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioGrafirForm {
    pub serial_number: String,
    pub unit_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nrp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engraving: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for RadioGrafirForm {
    fn validate(&self) -> Result<()> {
        require_non_blank("Serial number", &self.serial_number)?;
        require_non_blank("Unit number", &self.unit_number)
    }
}

impl Resource for RadioGrafir {
    const PATH: &'static str = "radio-grafirs";
    const LABEL: &'static str = "grafir radio";
    type Create = RadioGrafirForm;
    type Update = RadioGrafirForm;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioScrap {
    pub id: i64,
    pub serial_number: String,
    pub category: SiteType,
    pub scrap_date: NaiveDate,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioScrapForm {
    pub serial_number: String,
    pub category: SiteType,
    pub scrap_date: NaiveDate,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validate for RadioScrapForm {
    fn validate(&self) -> Result<()> {
        require_non_blank("Serial number", &self.serial_number)?;
        if self.quantity == 0 {
            return Err(crate::error::ApiError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Resource for RadioScrap {
    const PATH: &'static str = "radio-scraps";
    const LABEL: &'static str = "scrapped radio";
    type Create = RadioScrapForm;
    type Update = RadioScrapForm;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Scrapped radio counts of one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapMonthTotal {
    /// 1-based month
    pub month: u32,
    pub trunking: u64,
    pub conventional: u64,
    pub total: u64,
}

/// Monthly scrap totals of one year, as the backend computes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapSummary {
    pub year: i32,
    pub months: Vec<ScrapMonthTotal>,
    pub trunking_total: u64,
    pub conventional_total: u64,
    pub grand_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrap_form_rejects_zero_quantity() {
        let form = RadioScrapForm {
            serial_number: "SN-1".to_string(),
            category: SiteType::Trunking,
            scrap_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            quantity: 0,
            reason: None,
        };
        assert!(form.validate().is_err());
        assert!(RadioScrapForm { quantity: 2, ..form }.validate().is_ok());
    }

    #[test]
    fn scrap_summary_tolerates_missing_fields() {
        let summary: ScrapSummary =
            serde_json::from_str(r#"{"year":2025,"months":[{"month":3,"trunking":2}]}"#).unwrap();
        assert_eq!(summary.months[0].conventional, 0);
        assert_eq!(summary.grand_total, 0);
    }
}
