//! Scrap summary chart data.

use log::warn;
use opd_core::backend::ScrapBackend;
use opd_core::error::Result;
use opd_core::radio::{ScrapMonthTotal, ScrapSummary};
use opd_utils::dates::month_abbreviation;
use serde::Serialize;

/// One bar group of the monthly scrap chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapBar {
    pub label: &'static str,
    pub trunking: u64,
    pub conventional: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapChart {
    pub year: i32,
    pub bars: Vec<ScrapBar>,
    pub trunking_total: u64,
    pub conventional_total: u64,
    pub grand_total: u64,
}

/// Ensure all twelve months are present, January first. Months the backend
/// omitted become zeros.
pub fn pad_months(summary: &ScrapSummary) -> Vec<ScrapMonthTotal> {
    let mut months: Vec<ScrapMonthTotal> = (1..=12)
        .map(|month| ScrapMonthTotal {
            month,
            ..Default::default()
        })
        .collect();
    let mut seen = [false; 12];
    for entry in &summary.months {
        let Some(index) = entry.month.checked_sub(1).filter(|i| *i < 12) else {
            warn!("[OPD] scrap: ignoring month {} in {} summary", entry.month, summary.year);
            continue;
        };
        let index = index as usize;
        if seen[index] {
            warn!("[OPD] scrap: duplicate month {} in {} summary", entry.month, summary.year);
            continue;
        }
        seen[index] = true;
        months[index] = *entry;
    }
    months
}

impl ScrapChart {
    pub fn from_summary(summary: &ScrapSummary) -> Self {
        let bars = pad_months(summary)
            .into_iter()
            .map(|m| ScrapBar {
                label: month_abbreviation(m.month).unwrap_or("???"),
                trunking: m.trunking,
                conventional: m.conventional,
                total: m.total,
            })
            .collect();
        Self {
            year: summary.year,
            bars,
            trunking_total: summary.trunking_total,
            conventional_total: summary.conventional_total,
            grand_total: summary.grand_total,
        }
    }
}

pub async fn load_scrap_chart<B: ScrapBackend>(backend: &B, year: i32) -> Result<ScrapChart> {
    let summary = backend.scrap_summary(year).await?;
    Ok(ScrapChart::from_summary(&summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(month: u32, trunking: u64, conventional: u64) -> ScrapMonthTotal {
        ScrapMonthTotal {
            month,
            trunking,
            conventional,
            total: trunking + conventional,
        }
    }

    #[test]
    fn missing_months_become_zero() {
        let summary = ScrapSummary {
            year: 2025,
            months: vec![month(3, 2, 1), month(11, 0, 4)],
            trunking_total: 2,
            conventional_total: 5,
            grand_total: 7,
        };
        let chart = ScrapChart::from_summary(&summary);
        assert_eq!(chart.bars.len(), 12);
        assert_eq!(chart.bars[0].label, "Jan");
        assert_eq!(chart.bars[0].total, 0);
        assert_eq!(chart.bars[2].trunking, 2);
        assert_eq!(chart.bars[10].conventional, 4);
        assert_eq!(chart.grand_total, 7);
    }

    #[test]
    fn out_of_range_and_duplicate_months_are_ignored() {
        let summary = ScrapSummary {
            year: 2025,
            months: vec![month(0, 9, 9), month(13, 9, 9), month(5, 1, 0), month(5, 7, 7)],
            ..Default::default()
        };
        let padded = pad_months(&summary);
        assert_eq!(padded.len(), 12);
        assert_eq!(padded[4].trunking, 1);
        assert_eq!(padded.iter().map(|m| m.total).sum::<u64>(), 1);
    }

    #[tokio::test]
    async fn load_pads_backend_answer() {
        struct Empty;
        impl ScrapBackend for Empty {
            async fn scrap_summary(&self, year: i32) -> Result<ScrapSummary> {
                Ok(ScrapSummary {
                    year,
                    ..Default::default()
                })
            }
        }
        let chart = load_scrap_chart(&Empty, 2024).await.unwrap();
        assert_eq!(chart.year, 2024);
        assert!(chart.bars.iter().all(|b| b.total == 0));
        assert_eq!(chart.bars[11].label, "Dec");
    }
}
