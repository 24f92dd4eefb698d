//! Output formatters for the demo report.

use clap::ValueEnum;
use comfy_table::{Cell, Table};

use crate::demo::{CheckRow, KeyRow, Report};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tables for humans
    Text,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format the keys section.
    fn format_keys(&self, rows: &[KeyRow]) -> String;

    /// Format the validation section.
    fn format_checks(&self, rows: &[CheckRow]) -> String;

    /// Format a whole report.
    fn format_report(&self, report: &Report) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_keys(&self, rows: &[KeyRow]) -> String {
        let with_fingerprint = rows.iter().any(|row| row.fingerprint.is_some());

        let mut table = Table::new();
        let mut header = vec!["Entity", "Group", "Key"];
        if with_fingerprint {
            header.push("Fingerprint");
        }
        table.set_header(header);

        for row in rows {
            let mut cells = vec![
                Cell::new(&row.entity),
                Cell::new(row.group.as_str()),
                Cell::new(row.key.to_string()),
            ];
            if with_fingerprint {
                cells.push(Cell::new(row.fingerprint.as_deref().unwrap_or("")));
            }
            table.add_row(cells);
        }

        table.to_string()
    }

    fn format_checks(&self, rows: &[CheckRow]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Check", "Result"]);

        for row in rows {
            let result = match &row.failure {
                None => "valid".to_string(),
                Some(failure) => format!("invalid: {failure}"),
            };
            table.add_row(vec![Cell::new(&row.label), Cell::new(result)]);
        }

        table.to_string()
    }

    fn format_report(&self, report: &Report) -> String {
        format!(
            "{}\n\n{}",
            self.format_keys(&report.keys),
            self.format_checks(&report.checks)
        )
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl JsonFormatter {
    fn keys_json(rows: &[KeyRow]) -> serde_json::Value {
        rows.iter()
            .map(|row| {
                let mut obj = serde_json::json!({
                    "entity": row.entity,
                    "group": row.group.as_str(),
                    "key": serde_json::to_value(&row.key).unwrap_or(serde_json::Value::Null),
                });
                if let (Some(fingerprint), Some(map)) = (&row.fingerprint, obj.as_object_mut()) {
                    map.insert("fingerprint".into(), fingerprint.clone().into());
                }
                obj
            })
            .collect()
    }

    fn checks_json(rows: &[CheckRow]) -> serde_json::Value {
        rows.iter()
            .map(|row| {
                serde_json::json!({
                    "check": row.label,
                    "valid": row.failure.is_none(),
                    "error": row.failure,
                })
            })
            .collect()
    }
}

impl Formatter for JsonFormatter {
    fn format_keys(&self, rows: &[KeyRow]) -> String {
        serde_json::to_string_pretty(&Self::keys_json(rows)).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_checks(&self, rows: &[CheckRow]) -> String {
        serde_json::to_string_pretty(&Self::checks_json(rows)).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_report(&self, report: &Report) -> String {
        let obj = serde_json::json!({
            "keys": Self::keys_json(&report.keys),
            "checks": Self::checks_json(&report.checks),
        });
        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}
