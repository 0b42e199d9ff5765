//! Call record statistics per fleet.

use crate::context::Context;
use crate::output::{print_json, print_table};
use chrono::{Duration, Local, NaiveDate};
use clap::Subcommand;
use opd_core::fleet::{FleetCounterpart, FleetRank, FleetStatType, SortOrder};
use opd_data::fleet::FleetStatisticsView;
use opd_utils::dates::parse_date;

const FLEET_ROUTE: &str = "/callrecord/fleet-statistics";

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug)]
pub enum FleetCommand {
    /// Totals and top-N rankings for a date range
    Stats {
        /// First day (YYYY-MM-DD), default 30 days ago
        #[arg(long, value_parser = parse_day)]
        start: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD), default today
        #[arg(long, value_parser = parse_day)]
        end: Option<NaiveDate>,

        /// Ranking size, 1 to 100
        #[arg(long, default_value_t = 10)]
        top: u32,

        /// All, Caller or Called
        #[arg(long = "type", default_value = "All")]
        stat_type: FleetStatType,

        /// ASC or DESC
        #[arg(long, default_value = "DESC")]
        sort: SortOrder,

        #[arg(long)]
        caller: Option<String>,

        #[arg(long)]
        called: Option<String>,
    },

    /// Callers that reached a fleet
    Callers {
        fleet: String,

        #[arg(long, value_parser = parse_day)]
        start: Option<NaiveDate>,

        #[arg(long, value_parser = parse_day)]
        end: Option<NaiveDate>,
    },

    /// Fleets a caller reached
    Called {
        caller: String,

        #[arg(long, value_parser = parse_day)]
        start: Option<NaiveDate>,

        #[arg(long, value_parser = parse_day)]
        end: Option<NaiveDate>,
    },
}

fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let start = start.unwrap_or(end - Duration::days(30));
    (start, end)
}

fn ranking_rows(ranks: &[FleetRank]) -> Vec<Vec<String>> {
    ranks
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.fleet.clone(),
                r.call_count.to_string(),
                r.total_duration_seconds
                    .map(|s| format!("{:.0}", s))
                    .unwrap_or_default(),
            ]
        })
        .collect()
}

fn print_counterparts(ctx: &Context, rows: &[FleetCounterpart]) -> anyhow::Result<()> {
    if ctx.config.json {
        return print_json(rows);
    }
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|c| vec![c.fleet.clone(), c.call_count.to_string()])
        .collect();
    print_table(&["fleet", "calls"], &rows)
}

pub async fn run_fleet(ctx: &Context, command: FleetCommand) -> anyhow::Result<()> {
    ctx.guard(FLEET_ROUTE)?;
    let api = ctx.api()?;
    match command {
        FleetCommand::Stats {
            start,
            end,
            top,
            stat_type,
            sort,
            caller,
            called,
        } => {
            let (start, end) = date_range(start, end);
            let mut view = FleetStatisticsView::new(start, end);
            {
                let query = view.query_mut();
                query.top_n = top;
                query.stat_type = stat_type;
                query.sort_order = sort;
                query.caller_filter = caller;
                query.called_filter = called;
            }
            view.load(&api).await?;
            let Some(stats) = view.stats() else {
                return Ok(());
            };
            if ctx.config.json {
                return print_json(stats);
            }
            print_table(
                &["total_calls", "unique_callers", "unique_called_fleets"],
                &[vec![
                    stats.total_calls.to_string(),
                    stats.unique_callers.to_string(),
                    stats.unique_called_fleets.to_string(),
                ]],
            )?;
            let headers = ["rank", "fleet", "calls", "duration_s"];
            if stat_type != FleetStatType::Called {
                println!("\ntop callers");
                print_table(&headers, &ranking_rows(&stats.top_callers))?;
            }
            if stat_type != FleetStatType::Caller {
                println!("\ntop called fleets");
                print_table(&headers, &ranking_rows(&stats.top_called_fleets))?;
            }
            Ok(())
        }
        FleetCommand::Callers { fleet, start, end } => {
            let (start, end) = date_range(start, end);
            let mut view = FleetStatisticsView::new(start, end);
            view.open_callers_of(&api, &fleet).await?;
            let rows = view.drill_down().map(|d| d.rows.as_slice()).unwrap_or_default();
            print_counterparts(ctx, rows)
        }
        FleetCommand::Called { caller, start, end } => {
            let (start, end) = date_range(start, end);
            let mut view = FleetStatisticsView::new(start, end);
            view.open_called_by(&api, &caller).await?;
            let rows = view.drill_down().map(|d| d.rows.as_slice()).unwrap_or_default();
            print_counterparts(ctx, rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_defaults_to_last_thirty_days() {
        let end = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(
            date_range(None, Some(end)),
            (NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), end)
        );
    }

    #[test]
    fn rankings_are_numbered() {
        let rows = ranking_rows(&[
            FleetRank {
                fleet: "1201".to_string(),
                call_count: 9,
                total_duration_seconds: Some(61.4),
            },
            FleetRank {
                fleet: "1300".to_string(),
                call_count: 4,
                total_duration_seconds: None,
            },
        ]);
        assert_eq!(rows[0], vec!["1", "1201", "9", "61"]);
        assert_eq!(rows[1], vec!["2", "1300", "4", ""]);
    }

    #[test]
    fn day_parser_reports_bad_input() {
        assert!(parse_day("2025-02-30").is_err());
        assert_eq!(
            parse_day("2025-02-28").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }
}
