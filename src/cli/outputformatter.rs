use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use terminal_size::{terminal_size, Height, Width};
use tracing::debug;

use crate::gateway::{HistoryEntry, ModuleResult};
use crate::pipeline::{AttributeValue, Operation, ResultSet};

/// Renders a result set for the plain-text sinks.
pub trait Formatter {
    fn format(&self, results: &ResultSet) -> String;
}

/// `key: value` per line; boolean results go through the command's labels.
pub struct GenericFormatter {
    pub labels: Option<(&'static str, &'static str)>,
}

/// `key:a;b;c` per line, `None` for an empty list.
pub struct ListFormatter;

/// Pulls the new password out of the reset confirmation markup.
pub struct ResetFormatter;

/// One line per matching record: `key | firstName: .. | lastName: ..`.
pub struct SearchFormatter;

pub const SEARCH_FIELDS: [&str; 7] = ["firstName", "lastName", "affiliations", "userNames", "XID", "CUID", "employeeId"];

pub fn formatter_for(op: Operation) -> Box<dyn Formatter> {
    match op {
        Operation::Department | Operation::Supervisor => Box::new(ListFormatter),
        Operation::Reset => Box::new(ResetFormatter),
        Operation::Search => Box::new(SearchFormatter),
        other => Box::new(GenericFormatter { labels: other.labels() }),
    }
}

fn compact(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_value(value: &AttributeValue, labels: Option<(&str, &str)>) -> String {
    match value {
        AttributeValue::Flag(b) => match labels {
            Some((yes, no)) => if *b { yes.to_string() } else { no.to_string() },
            None => b.to_string(),
        },
        AttributeValue::Text(s) | AttributeValue::Timestamp(s) => s.clone(),
        AttributeValue::List(items) => items.join(";"),
        AttributeValue::Error { error } => format!("error: {}", error),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

impl Formatter for GenericFormatter {
    fn format(&self, results: &ResultSet) -> String {
        results
            .iter()
            .map(|(k, v)| format!("{}: {}", k, render_value(v, self.labels)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Formatter for ListFormatter {
    fn format(&self, results: &ResultSet) -> String {
        results
            .iter()
            .map(|(k, v)| match v {
                AttributeValue::List(items) if items.is_empty() => format!("{}:None", k),
                other => format!("{}:{}", k, render_value(other, None)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Text between the last `<br><br><b>` and the following `</b>`.
pub fn reset_password_value(message: &str) -> &str {
    let tail = message.rsplit("<br><br><b>").next().unwrap_or(message);
    tail.split("</b>").next().unwrap_or(tail)
}

impl Formatter for ResetFormatter {
    fn format(&self, results: &ResultSet) -> String {
        results
            .iter()
            .map(|(k, v)| match v {
                AttributeValue::Reset(outcome) => match (&outcome.success_message, &outcome.error) {
                    (Some(msg), _) => format!("{}: Password reset to '{}'", k, reset_password_value(msg)),
                    (None, Some(err)) => format!("{}: {}", k, err),
                    (None, None) => format!("{}: Unknown error occurred", k),
                },
                AttributeValue::Error { error } => format!("{}: {}", k, error),
                other => format!("{}: {}", k, render_value(other, None)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn search_line(key: &str, record: &Value) -> String {
    let mut entry = vec![key.to_string()];
    for field in SEARCH_FIELDS {
        let rendered = match record.get(field) {
            Some(Value::Array(items)) if !items.is_empty() => items.iter().map(compact).collect::<Vec<_>>().join(", "),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => continue,
        };
        entry.push(format!("{}: {}", field, rendered));
    }
    entry.join(" | ")
}

impl Formatter for SearchFormatter {
    fn format(&self, results: &ResultSet) -> String {
        let mut lines = Vec::new();
        for (k, v) in results.iter() {
            match v {
                AttributeValue::Records(records) if records.is_empty() => lines.push(format!("{} | No results", k)),
                AttributeValue::Records(records) => lines.extend(records.iter().map(|r| search_line(k, r))),
                other => lines.push(format!("{} | {}", k, render_value(other, None))),
            }
        }
        lines.join("\n")
    }
}

/// Generic module rendering: every schema field with a non-empty value.
pub fn format_module(module: &ModuleResult) -> String {
    if module.items.is_empty() { return "No data found.".to_string(); }
    let mut lines = Vec::new();
    for item in &module.items {
        for field in &item.properties.fields {
            let value = match item.data.get(&field.id) {
                None | Some(Value::Null) | Some(Value::Bool(false)) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(v) => compact(v),
            };
            lines.push(format!("{}: {}", field.display_label(), value));
        }
    }
    lines.join("\n")
}

pub const HISTORY_LIMIT: usize = 10;

pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() { return "No vault history found.".to_string(); }
    let mut lines = Vec::new();
    for e in entries.iter().take(HISTORY_LIMIT) {
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        lines.push(format!("[{}] {} {}", or_na(&e.datetime), or_na(&e.operation), or_na(&e.name)));
        lines.push(format!("  Reason: {}", or_na(&e.reason)));
        lines.push("-".repeat(20));
    }
    lines.join("\n")
}

// --- Sinks ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    Plain,
    Structured,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTarget {
    Plain(PathBuf),
    Structured(PathBuf),
    /// `<base>.txt` and `<base>.json` together.
    Pair(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Console(PrintMode),
    File(FileTarget),
}

/// A file target when one was requested, plus a console sink when no file
/// target was requested or a print mode was asked for explicitly.
pub fn select_sinks(print: Option<PrintMode>, file: Option<FileTarget>) -> Vec<Sink> {
    let mut sinks = Vec::new();
    let has_file = file.is_some();
    if let Some(target) = file { sinks.push(Sink::File(target)); }
    if !has_file || print.is_some() {
        sinks.push(Sink::Console(print.unwrap_or(PrintMode::Plain)));
    }
    sinks
}

pub fn structured(results: &ResultSet) -> Result<String> {
    serde_json::to_string_pretty(results).context("failed to serialize results")
}

fn pair_paths(base: &Path) -> (PathBuf, PathBuf) {
    let with_ext = |ext: &str| {
        let mut s = base.as_os_str().to_os_string();
        s.push(ext);
        PathBuf::from(s)
    };
    (with_ext(".txt"), with_ext(".json"))
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(target: "hdtools::output", "wrote {}", path.display());
    Ok(())
}

/// Render `results` into every sink; console sinks write to `out`.
pub fn emit_to(results: &ResultSet, sinks: &[Sink], formatter: &dyn Formatter, out: &mut dyn Write) -> Result<()> {
    for sink in sinks {
        match sink {
            Sink::Console(PrintMode::Plain) => writeln!(out, "{}", formatter.format(results))?,
            Sink::Console(PrintMode::Structured) => writeln!(out, "{}", structured(results)?)?,
            Sink::Console(PrintMode::Raw) => writeln!(out, "{}", serde_json::to_string(results)?)?,
            Sink::File(FileTarget::Plain(path)) => write_file(path, &formatter.format(results))?,
            Sink::File(FileTarget::Structured(path)) => write_file(path, &structured(results)?)?,
            Sink::File(FileTarget::Pair(base)) => {
                let (txt, json) = pair_paths(base);
                write_file(&txt, &formatter.format(results))?;
                write_file(&json, &structured(results)?)?;
            }
        }
    }
    Ok(())
}

pub fn emit(results: &ResultSet, sinks: &[Sink], formatter: &dyn Formatter) -> Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    emit_to(results, sinks, formatter, &mut lock)
}

// --- ASCII tables for the search view ---

/// Render `rows` under `cols` as a boxed table no wider than `maxw` columns.
pub fn render_table(cols: &[String], rows: &[Vec<String>], maxw: usize) -> String {
    let mut widths: Vec<usize> = cols.iter().map(|c| visible_len(c).min(maxw)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            widths[i] = widths[i].max(visible_len(cell).min(maxw));
        }
    }
    let sep = build_separator(&widths);
    let mut out = vec![sep.clone(), build_row(cols, &widths, true), sep.clone()];
    out.extend(rows.iter().map(|r| build_row(r, &widths, false)));
    out.push(sep);
    out.push(format!("rows: {}", rows.len()));
    out.iter().map(|l| fit_line_to_width(l, maxw)).collect::<Vec<_>>().join("\n")
}

pub fn terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), Height(_))) if w > 4 => (w - 4) as usize,
        _ => 80,
    }
}

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::from("+");
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

// Header cells are colored green; padding is computed on visible width.
fn build_row(cells: &[String], widths: &[usize], header: bool) -> String {
    let mut s = String::from("|");
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let text = truncate(cell, *w);
        let pad = " ".repeat(w.saturating_sub(visible_len(&text)));
        s.push(' ');
        if header { s.push_str(&format!("\x1b[32m{}\x1b[0m", text)); } else { s.push_str(&text); }
        s.push_str(&pad);
        s.push_str(" |");
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

/// Visible chars, skipping ANSI CSI sequences.
pub fn visible_len(s: &str) -> usize {
    let mut count = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        count += 1;
    }
    count
}

fn fit_line_to_width(s: &str, maxw: usize) -> String {
    if visible_len(s) <= maxw { return s.to_string(); }
    elide_end_preserving_ansi(s, maxw)
}

// Keep the first `maxw - 1` visible chars (escape sequences pass through
// untouched), then an ellipsis and a color reset so nothing bleeds.
fn elide_end_preserving_ansi(s: &str, maxw: usize) -> String {
    let budget = maxw.saturating_sub(1);
    let mut out = String::new();
    let mut shown = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            out.push(ch);
            if chars.peek() == Some(&'[') {
                for c in chars.by_ref() {
                    out.push(c);
                    if c.is_ascii_alphabetic() { break; }
                }
            }
            continue;
        }
        if shown >= budget { break; }
        out.push(ch);
        shown += 1;
    }
    out.push('…');
    out.push_str("\x1b[0m");
    out
}

#[cfg(test)]
#[path = "outputformatter_tests.rs"]
mod outputformatter_tests;
