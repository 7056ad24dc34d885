//! Output formatting for the console binary.
//!
//! Console actions produce [`ConsoleOutput`] values; an [`OutputWriter`]
//! turns them into human-readable text or line-delimited JSON.

use crate::backend::ParameterTable;
use crate::persistence::Favorites;
use crate::session::ResultEntry;
use crate::splitter::SplitQuery;
use serde_json::json;

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Text,
    /// One JSON document per line.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Something the console wants to show.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleOutput {
    /// Entries produced by one run, in dispatch order.
    Results(Vec<ResultEntry>),
    /// How a block splits, without executing it.
    Split(SplitQuery),
    /// The favorites list.
    Favorites(Favorites),
    /// The session parameter table, if fetched.
    Params(Option<ParameterTable>),
    /// Past results, newest first.
    History(Vec<ResultEntry>),
    /// Informational message.
    Info(String),
    /// Error message.
    Error(String),
}

impl ConsoleOutput {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Returns true for outputs that belong on stderr.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Formats console outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// Formats the output according to the configured format.
    pub fn format(&self, output: &ConsoleOutput) -> String {
        match self.format {
            OutputFormat::Text => format_text(output),
            OutputFormat::Json => format_json(output),
        }
    }
}

fn format_text(output: &ConsoleOutput) -> String {
    match output {
        ConsoleOutput::Results(entries) => entries
            .iter()
            .map(format_entry)
            .collect::<Vec<_>>()
            .join("\n\n"),
        ConsoleOutput::Split(split) => {
            let mut lines = Vec::new();
            for directive in &split.param_directives {
                lines.push(format!("directive: {directive}"));
            }
            for statement in &split.statements {
                lines.push(format!("statement: {statement}"));
            }
            if lines.is_empty() {
                lines.push("(nothing to run)".to_string());
            }
            lines.join("\n")
        }
        ConsoleOutput::Favorites(favorites) => {
            if favorites.is_empty() {
                return "No favorites saved.".to_string();
            }
            let rows: Vec<Vec<String>> = favorites
                .iter()
                .map(|(name, statement)| vec![name.to_string(), statement.to_string()])
                .collect();
            format_table(&["Name".to_string(), "Statement".to_string()], &rows)
        }
        ConsoleOutput::Params(None) => "Parameters not fetched yet.".to_string(),
        ConsoleOutput::Params(Some(params)) if params.is_empty() => {
            "No session parameters.".to_string()
        }
        ConsoleOutput::Params(Some(params)) => {
            let rows: Vec<Vec<String>> = params
                .iter()
                .map(|(name, value)| vec![name.clone(), value.to_string()])
                .collect();
            format_table(&["Name".to_string(), "Value".to_string()], &rows)
        }
        ConsoleOutput::History(entries) if entries.is_empty() => "History is empty.".to_string(),
        ConsoleOutput::History(entries) => entries
            .iter()
            .map(|entry| {
                let status = if entry.response.is_success() { "ok" } else { "error" };
                format!("#{:<4} {:<5} {}", entry.seq, status, entry.text)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ConsoleOutput::Info(msg) => msg.clone(),
        ConsoleOutput::Error(msg) => format!("Error: {msg}"),
    }
}

fn format_entry(entry: &ResultEntry) -> String {
    let response = &entry.response;
    let mut out = format!("> {}\n", entry.text);

    if !response.is_success() {
        out.push_str(&format!(
            "Error ({}): {}",
            response.code,
            response.message.as_deref().unwrap_or("unknown error")
        ));
        return out;
    }

    match &response.data {
        Some(data) if !data.headers.is_empty() => {
            let rows: Vec<Vec<String>> = data
                .rows
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect();
            out.push_str(&format_table(&data.headers, &rows));
            out.push_str(&format!(
                "\n{} row(s) in {}us",
                data.row_count(),
                data.time_cost.as_micros()
            ));
        }
        Some(data) => out.push_str(&format!("OK in {}us", data.time_cost.as_micros())),
        None => out.push_str("OK"),
    }
    out
}

/// Formats a table as a string for display.
fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    output.push_str(&header_line.join(" │ "));
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join("─┼─"));
    output.push('\n');

    for row in rows {
        let row_line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = width)
            })
            .collect();
        output.push_str(&row_line.join(" │ "));
        output.push('\n');
    }

    output
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_json(output: &ConsoleOutput) -> String {
    let value = match output {
        ConsoleOutput::Results(entries) => json!({ "results": entries }),
        ConsoleOutput::Split(split) => json!({ "split": split }),
        ConsoleOutput::Favorites(favorites) => json!({ "favorites": favorites }),
        ConsoleOutput::Params(params) => json!({ "params": params }),
        ConsoleOutput::History(entries) => json!({ "history": entries }),
        ConsoleOutput::Info(msg) => json!({ "info": msg }),
        ConsoleOutput::Error(msg) => json!({ "error": msg }),
    };

    serde_json::to_string(&value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}"))
}
