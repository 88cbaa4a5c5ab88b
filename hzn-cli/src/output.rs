//! Terminal output formatting.

use std::error::Error;
use std::io;

use chrono::DateTime;
use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Value};

/// How query results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Console,
    Json,
    Csv,
}

impl Format {
    /// `--json` wins over `--csv` when both are given.
    pub fn from_flags(json: bool, csv: bool) -> Self {
        if json {
            Format::Json
        } else if csv {
            Format::Csv
        } else {
            Format::Console
        }
    }
}

pub type OutputResult = Result<(), Box<dyn Error>>;

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg.red());
}

/// Print an info message.
pub fn info(msg: &str) {
    eprintln!("{} {}", "→".cyan(), msg);
}

/// Print a warning message.
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow().bold(), msg.yellow());
}

/// Print a key-value pair.
pub fn kv(key: &str, value: &str) {
    println!("  {} {}", format!("{}:", key).dimmed(), value);
}

/// Print a list of records in the requested format.
pub fn records<T: Serialize>(items: &[T], format: Format) -> OutputResult {
    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
            Ok(())
        }
        Format::Csv => {
            let values = items
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            write_csv(&values, io::stdout().lock())
        }
        Format::Console => {
            for item in items {
                console(&serde_json::to_value(item)?);
            }
            Ok(())
        }
    }
}

/// Print a single record (totals, counts, stream items).
pub fn record<T: Serialize>(item: &T, format: Format) -> OutputResult {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(item)?),
        Format::Csv => write_csv(&[serde_json::to_value(item)?], io::stdout().lock())?,
        Format::Console => console(&serde_json::to_value(item)?),
    }
    Ok(())
}

/// With `DEBUG` set, report how many entries came back.
pub fn result_count(count: usize, max: &str) {
    if debug_enabled(std::env::var("DEBUG").ok().as_deref()) {
        println!("{} entries returned (max supplied: {})", count, max);
    }
}

/// `DEBUG` counts as set only when it holds a non-empty value.
fn debug_enabled(value: Option<&str>) -> bool {
    value.map_or(false, |v| !v.is_empty())
}

fn console(value: &Value) {
    match value {
        Value::Object(fields) => {
            println!("{}", "─".repeat(42).dimmed());
            for (key, field) in fields {
                kv(key, &colored_scalar(field));
            }
        }
        other => println!("{}", colored_scalar(other)),
    }
}

fn colored_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".dimmed().to_string(),
        Value::Bool(b) => b.to_string().yellow().to_string(),
        Value::Number(_) => scalar_text(value).yellow().to_string(),
        Value::String(s) => s.green().to_string(),
        other => other.to_string(),
    }
}

/// Plain text for a JSON scalar; whole floats print without a fraction.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Drop raw `*Bytes` columns and humanize `date`.
fn csv_fields(record: &Value) -> Map<String, Value> {
    match record {
        Value::Object(fields) => fields
            .iter()
            .filter(|(key, _)| !key.ends_with("Bytes"))
            .map(|(key, value)| {
                let value = match (key.as_str(), value) {
                    ("date", Value::String(s)) => Value::String(human_date(s)),
                    _ => value.clone(),
                };
                (key.clone(), value)
            })
            .collect(),
        other => {
            let mut single = Map::new();
            single.insert("value".to_string(), other.clone());
            single
        }
    }
}

/// `2026-10-19T12:00:00Z` as `Mon Oct 19 2026 12:00:00 GMT+0000`.
fn human_date(rfc3339: &str) -> String {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|d| d.format("%a %b %d %Y %H:%M:%S GMT%z").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}

/// Header from the union of record keys (first-seen order), one row per record.
pub fn write_csv<W: io::Write>(records: &[Value], out: W) -> OutputResult {
    let rows: Vec<Map<String, Value>> = records.iter().map(csv_fields).collect();

    let mut headers: Vec<&str> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(out);
    if !headers.is_empty() {
        writer.write_record(&headers)?;
    }
    for row in &rows {
        writer.write_record(
            headers
                .iter()
                .map(|key| row.get(*key).map(scalar_text).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_debug_needs_a_value() {
        assert!(debug_enabled(Some("1")));
        assert!(debug_enabled(Some("hzn:*")));
        assert!(!debug_enabled(Some("")));
        assert!(!debug_enabled(None));
    }

    fn csv_string(records: &[Value]) -> String {
        let mut out = Vec::new();
        write_csv(records, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv_drops_bytes_and_humanizes_date() {
        let rows = vec![json!({
            "hash": "0xabc",
            "fromCurrencyKey": "zUSD",
            "fromCurrencyKeyBytes": "0x7a555344",
            "fromAmount": 150.0,
            "date": "2026-10-19T12:00:00Z"
        })];
        let text = csv_string(&rows);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("hash,fromCurrencyKey,fromAmount,date"));
        assert_eq!(
            lines.next(),
            Some("0xabc,zUSD,150,Mon Oct 19 2026 12:00:00 GMT+0000")
        );
        assert!(!text.contains("Bytes"));
    }

    #[test]
    fn test_csv_nulls_and_nested_values() {
        let rows = vec![json!({ "a": null, "b": [1, 2], "c": 0.25 })];
        let text = csv_string(&rows);
        assert_eq!(text.lines().nth(1), Some(",\"[1,2]\",0.25"));
    }

    #[test]
    fn test_csv_scalars_use_value_column() {
        let text = csv_string(&[json!("0x1"), json!("0x2")]);
        assert_eq!(text, "value\n0x1\n0x2\n");
    }

    #[test]
    fn test_format_from_flags() {
        assert_eq!(Format::from_flags(true, true), Format::Json);
        assert_eq!(Format::from_flags(false, true), Format::Csv);
        assert_eq!(Format::from_flags(false, false), Format::Console);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!(150.0)), "150");
        assert_eq!(scalar_text(&json!(0.5)), "0.5");
        assert_eq!(scalar_text(&json!(7)), "7");
        assert_eq!(scalar_text(&json!(null)), "");
    }
}
