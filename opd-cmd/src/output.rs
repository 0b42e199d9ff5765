//! Terminal output: tab-separated tables, JSON and confirmation prompts.

use serde::Serialize;
use serde_json::Value;
use std::io::{self, BufRead, Write};

/// Write a table as tab-separated values with a header line.
pub fn write_table<W: Write>(out: W, headers: &[&str], rows: &[Vec<String>]) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) -> anyhow::Result<()> {
    write_table(io::stdout().lock(), headers, rows)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Render a scalar JSON value for a table cell.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn optional_number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

/// Turn serialized records into table columns, taking the column set from
/// the first record.
pub fn records_table<T: Serialize>(records: &[T]) -> anyhow::Result<(Vec<String>, Vec<Vec<String>>)> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()?;
    let headers: Vec<String> = match values.first() {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => return Ok((Vec::new(), Vec::new())),
    };
    let rows = values
        .iter()
        .map(|v| headers.iter().map(|h| cell(&v[h.as_str()])).collect())
        .collect();
    Ok((headers, rows))
}

pub fn print_records<T: Serialize>(records: &[T]) -> anyhow::Result<()> {
    let (headers, rows) = records_table(records)?;
    if headers.is_empty() {
        log::info!("[OPD] cli: nothing to show");
        return Ok(());
    }
    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
    print_table(&headers, &rows)
}

/// Ask a yes/no question on the terminal. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    confirm_from(prompt, io::stdin().lock(), io::stderr())
}

fn confirm_from<R: BufRead, W: Write>(prompt: &str, mut input: R, mut out: W) -> bool {
    if write!(out, "{} [y/N] ", prompt).and_then(|_| out.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
