//! SWR signal commands: yearly pivot, cell notes, import.

use crate::context::Context;
use crate::output::{confirm, optional_number, print_json, print_table};
use anyhow::bail;
use chrono::{Datelike, Local};
use clap::Subcommand;
use log::info;
use opd_core::backend::SwrBackend;
use opd_core::MonthKey;
use opd_data::swr::pivot::PivotCharts;
use opd_data::swr::{AnnotationCache, NoteEditor, NoteOutcome, PivotFilter, PivotRow, PivotTable, SiteTypeFilter};
use serde_json::json;
use std::collections::BTreeSet;
use std::path::PathBuf;

const SIGNAL_ROUTE: &str = "/swr/signal";

fn current_year() -> i32 {
    Local::now().year()
}

#[derive(Subcommand, Debug)]
pub enum SwrCommand {
    /// Show one page of the yearly pivot
    Pivot {
        #[arg(long, default_value_t = current_year())]
        year: i32,

        /// Ask the backend for a single site only
        #[arg(long)]
        site: Option<String>,

        /// Case-insensitive match on channel or site name
        #[arg(long, default_value = "")]
        search: String,

        /// Keep only these sites, repeatable
        #[arg(long = "only-site")]
        sites: Vec<String>,

        /// all, Trunking or Conventional
        #[arg(long, default_value = "all")]
        site_type: SiteTypeFilter,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Print the chart data of the page instead of the table
        #[arg(long)]
        charts: bool,
    },

    /// Set, change or delete the note of one channel-month cell
    Note {
        #[arg(long, default_value_t = current_year())]
        year: i32,

        #[arg(long)]
        channel: String,

        /// Site of the channel, needed when a channel name repeats
        #[arg(long)]
        site: Option<String>,

        /// Month as Mon-YY, e.g. Mar-25
        #[arg(long)]
        month: MonthKey,

        /// Note text; empty deletes the existing note
        #[arg(long, default_value = "")]
        text: String,

        /// Do not ask before deleting
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Cached notes of a year
    Notes {
        #[arg(long, default_value_t = current_year())]
        year: i32,
    },

    /// Site names available for filtering
    Sites,

    /// Upload a spreadsheet of readings
    Import { file: PathBuf },
}

/// `Mon-YY` only keeps two year digits, so the parsed key is moved into the
/// selected year.
fn note_month(month: MonthKey, year: i32) -> anyhow::Result<MonthKey> {
    match month.in_year(year) {
        Some(month) => Ok(month),
        None => bail!("Month {} is not in {}", month, year),
    }
}

/// Table header: fixed columns then one per month.
fn pivot_headers(table: &PivotTable) -> Vec<String> {
    let mut headers = vec![
        "channel".to_string(),
        "site".to_string(),
        "type".to_string(),
        "expected".to_string(),
    ];
    headers.extend(table.months().map(|m| m.to_string()));
    headers
}

/// A cell reads `1.32`, `-` without data, and gets `*` when it carries a note.
fn pivot_cells(table: &PivotTable, row: &PivotRow) -> Vec<String> {
    let mut cells = vec![
        row.channel_name.clone(),
        row.site_name.clone(),
        row.site_type.map(|t| t.to_string()).unwrap_or_default(),
        format!("{:.2}", row.expected_swr_max),
    ];
    cells.extend(table.months().map(|month| {
        let value = optional_number(row.vswr(month));
        if row.note(month).is_some() {
            format!("{}*", value)
        } else {
            value
        }
    }));
    cells
}

fn print_charts(charts: &PivotCharts) -> anyhow::Result<()> {
    let counts = &charts.vswr_status;
    print_table(
        &["good", "warning", "critical", "no_data"],
        &[vec![
            counts.good.to_string(),
            counts.warning.to_string(),
            counts.critical.to_string(),
            counts.no_data.to_string(),
        ]],
    )?;
    let rows: Vec<Vec<String>> = charts
        .site_bars
        .iter()
        .map(|bar| {
            vec![
                bar.site_name.clone(),
                optional_number(bar.mean_vswr),
                bar.warning_cells.to_string(),
                bar.critical_cells.to_string(),
            ]
        })
        .collect();
    print_table(&["site", "mean_vswr", "warning", "critical"], &rows)
}

/// Pick the row a note is for. Without a site the channel name must be unique.
fn find_row<'t>(
    table: &'t mut PivotTable,
    channel: &str,
    site: Option<&str>,
) -> anyhow::Result<&'t mut PivotRow> {
    let site = match site {
        Some(site) => site.to_string(),
        None => {
            let sites: Vec<&str> = table
                .rows()
                .iter()
                .filter(|r| r.channel_name == channel)
                .map(|r| r.site_name.as_str())
                .collect();
            match sites.as_slice() {
                [] => bail!("Channel {} has no row in {}", channel, table.year()),
                [only] => only.to_string(),
                many => bail!(
                    "Channel {} exists at several sites ({}); pass --site",
                    channel,
                    many.join(", ")
                ),
            }
        }
    };
    let year = table.year();
    match table.row_mut(channel, &site) {
        Some(row) => Ok(row),
        None => bail!("Channel {} at {} has no row in {}", channel, site, year),
    }
}

pub async fn run_swr(ctx: &Context, command: SwrCommand) -> anyhow::Result<()> {
    ctx.guard(SIGNAL_ROUTE)?;
    let cache = AnnotationCache::new(ctx.storage.as_ref());
    match command {
        SwrCommand::Pivot {
            year,
            site,
            search,
            sites,
            site_type,
            page,
            charts,
        } => {
            let api = ctx.api()?;
            let mut table = PivotTable::load(&api, &cache, year, site.as_deref()).await?;
            table.set_filter(PivotFilter {
                search,
                sites: sites.into_iter().collect::<BTreeSet<_>>(),
                site_type,
            });
            table.set_page(page);
            info!(
                "[OPD] cli: pivot page {}/{} of {} matching channels",
                table.page(),
                table.total_pages(),
                table.filtered().len()
            );

            if ctx.config.json {
                return print_json(&json!({
                    "year": year,
                    "page": table.page(),
                    "totalPages": table.total_pages(),
                    "rows": table.page_rows(),
                    "charts": table.charts(),
                }));
            }
            if charts {
                return print_charts(&table.charts());
            }
            let headers = pivot_headers(&table);
            let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
            let rows: Vec<Vec<String>> = table
                .page_rows()
                .into_iter()
                .map(|row| pivot_cells(&table, row))
                .collect();
            print_table(&headers, &rows)
        }
        SwrCommand::Note {
            year,
            channel,
            site,
            month,
            text,
            yes,
        } => {
            let month = note_month(month, year)?;
            let api = ctx.api()?;
            let mut table = PivotTable::load(&api, &cache, year, None).await?;
            let row = find_row(&mut table, &channel, site.as_deref())?;
            let editor = NoteEditor::new(&api, AnnotationCache::new(ctx.storage.as_ref()), year);
            let outcome = editor
                .save_note(row, month, &text, |note| {
                    confirm(&format!("Delete note \"{}\"?", note), yes)
                })
                .await?;
            let verb = match outcome {
                NoteOutcome::Saved => "saved",
                NoteOutcome::Deleted => "deleted",
                NoteOutcome::Cancelled => "cancelled",
                NoteOutcome::Unchanged => "unchanged",
            };
            println!("note {} {} {}", channel, month, verb);
            Ok(())
        }
        SwrCommand::Notes { year } => {
            let mut rows = Vec::new();
            for channel in cache.channels(year)? {
                for (month, note) in cache.get(year, &channel) {
                    rows.push(vec![channel.clone(), month.to_string(), note]);
                }
            }
            if ctx.config.json {
                print_json(&rows)
            } else {
                print_table(&["channel", "month", "note"], &rows)
            }
        }
        SwrCommand::Sites => {
            let api = ctx.api()?;
            let names = api.site_names().await?;
            if ctx.config.json {
                print_json(&names)
            } else {
                let rows: Vec<Vec<String>> = names.into_iter().map(|n| vec![n]).collect();
                print_table(&["site"], &rows)
            }
        }
        SwrCommand::Import { file } => {
            if !file.is_file() {
                bail!("{} is not a file", file.display());
            }
            let api = ctx.api()?;
            let result = api.import_swr(&file).await?;
            if ctx.config.json {
                return print_json(&result);
            }
            print_table(
                &["success", "records_created", "records_updated", "channels_created", "errors"],
                &[vec![
                    result.success.to_string(),
                    result.records_created.to_string(),
                    result.records_updated.to_string(),
                    result.channels_created.to_string(),
                    result.errors.len().to_string(),
                ]],
            )?;
            for error in &result.errors {
                log::warn!("[OPD] cli: import: {}", error);
            }
            if let Some(message) = &result.message {
                println!("{}", message);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_core::swr::SiteType;

    fn table() -> PivotTable {
        let mut a = PivotRow::new(2025, "CH-1", "Alpha", Some(SiteType::Trunking), 1.5);
        a.monthly_vswr.insert("Feb-25".parse().unwrap(), Some(1.234));
        a.notes.insert("Feb-25".parse().unwrap(), "checked".to_string());
        let b = PivotRow::new(2025, "CH-1", "Beta", None, 1.5);
        let c = PivotRow::new(2025, "CH-2", "Beta", None, 1.5);
        PivotTable::new(2025, vec![a, b, c])
    }

    #[test]
    fn cells_mark_notes_and_gaps() {
        let table = table();
        let headers = pivot_headers(&table);
        assert_eq!(headers.len(), 16);
        assert_eq!(headers[4], "Jan-25");
        let cells = pivot_cells(&table, &table.rows()[0]);
        assert_eq!(cells[2], "Trunking");
        assert_eq!(cells[4], "-");
        assert_eq!(cells[5], "1.23*");
    }

    #[test]
    fn ambiguous_channel_needs_site() {
        let mut table = table();
        assert!(find_row(&mut table, "CH-1", None).is_err());
        assert_eq!(find_row(&mut table, "CH-1", Some("Beta")).unwrap().site_name, "Beta");
        assert_eq!(find_row(&mut table, "CH-2", None).unwrap().site_name, "Beta");
        assert!(find_row(&mut table, "CH-9", None).is_err());
    }

    #[test]
    fn note_month_takes_the_selected_century() {
        let feb_99: MonthKey = "Feb-99".parse().unwrap();
        assert_eq!(note_month(feb_99, 1999).unwrap(), MonthKey::new(1999, 2).unwrap());
        let mar_25: MonthKey = "Mar-25".parse().unwrap();
        assert_eq!(note_month(mar_25, 2025).unwrap(), mar_25);
        assert!(note_month(mar_25, 2024).is_err());
    }
}
