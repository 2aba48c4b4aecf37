use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

mod rows;
pub mod table;

/// A record type with a fixed column layout for `--format table`.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

/// Render a single value. Tables show an object as sorted key/value pairs.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
        OutputFormat::Table => {
            let rows = match serde_json::to_value(value)? {
                Value::Object(map) => {
                    let mut rows: Vec<Vec<String>> = map
                        .into_iter()
                        .map(|(key, value)| vec![key, cell(&value)])
                        .collect();
                    rows.sort();
                    rows
                }
                scalar => vec![vec![String::from("value"), cell(&scalar)]],
            };
            Ok(table::render(&["key", "value"], &rows, table_options()))
        }
    }
}

/// Render a list of records, one table row each.
pub fn render_rows<T: Serialize + TableRow>(
    records: &[T],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Table if records.is_empty() => Ok(String::from("(no rows)")),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = records.iter().map(TableRow::cells).collect();
            Ok(table::render(T::headers(), &rows, table_options()))
        }
        _ => render(&records, format),
    }
}

pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

pub fn output_rows<T: Serialize + TableRow>(
    records: &[T],
    format: OutputFormat,
) -> anyhow::Result<()> {
    println!("{}", render_rows(records, format)?);
    Ok(())
}

/// Apply the global `--limit` to a listing.
pub fn apply_limit<T>(mut records: Vec<T>, limit: Option<u32>) -> Vec<T> {
    if let Some(limit) = limit.and_then(|limit| usize::try_from(limit).ok()) {
        records.truncate(limit);
    }
    records
}

fn table_options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
