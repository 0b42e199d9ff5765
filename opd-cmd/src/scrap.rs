//! Radio scrap summary.

use crate::context::Context;
use crate::output::{print_json, print_table};
use chrono::{Datelike, Local};
use clap::Subcommand;
use opd_data::scrap::{load_scrap_chart, ScrapChart};

const SCRAP_ROUTE: &str = "/inspeksi-kpc/radio-scrap";

#[derive(Subcommand, Debug)]
pub enum ScrapCommand {
    /// Monthly scrap totals of a year
    Summary {
        #[arg(long, default_value_t = Local::now().year())]
        year: i32,
    },
}

fn chart_rows(chart: &ScrapChart) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = chart
        .bars
        .iter()
        .map(|bar| {
            vec![
                bar.label.to_string(),
                bar.trunking.to_string(),
                bar.conventional.to_string(),
                bar.total.to_string(),
            ]
        })
        .collect();
    rows.push(vec![
        "Total".to_string(),
        chart.trunking_total.to_string(),
        chart.conventional_total.to_string(),
        chart.grand_total.to_string(),
    ]);
    rows
}

pub async fn run_scrap(ctx: &Context, command: ScrapCommand) -> anyhow::Result<()> {
    ctx.guard(SCRAP_ROUTE)?;
    match command {
        ScrapCommand::Summary { year } => {
            let api = ctx.api()?;
            let chart = load_scrap_chart(&api, year).await?;
            if ctx.config.json {
                return print_json(&chart);
            }
            print_table(
                &["month", "trunking", "conventional", "total"],
                &chart_rows(&chart),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_core::radio::{ScrapMonthTotal, ScrapSummary};

    #[test]
    fn rows_cover_every_month_and_totals() {
        let chart = ScrapChart::from_summary(&ScrapSummary {
            year: 2025,
            months: vec![ScrapMonthTotal {
                month: 2,
                trunking: 3,
                conventional: 0,
                total: 3,
            }],
            trunking_total: 3,
            conventional_total: 0,
            grand_total: 3,
        });
        let rows = chart_rows(&chart);
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[1], vec!["Feb", "3", "0", "3"]);
        assert_eq!(rows[12], vec!["Total", "3", "0", "3"]);
    }
}
