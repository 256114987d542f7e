use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde_json::Value;
use tracing::debug;

use super::outputformatter::{format_history, format_module, render_table, terminal_width};
use crate::error::{PortalError, PortalResult};
use crate::extract::IDENTITY_MODULE;
use crate::gateway::response::error_envelope;
use crate::gateway::{Portal, Tristate};
use crate::identity::{bare_record_id, IdentityRecord};

const HELP: &str = "Commands:
  search <query>    look up an identity and show its modules
  history <query>   show recent vault history for an identity
  help              show this help
  exit | quit       leave the shell";

/// Every record a search returns, in portal order.
pub fn search_matches(portal: &dyn Portal, query: &str) -> PortalResult<Vec<IdentityRecord>> {
    match portal.search(query)? {
        Value::Array(items) => items.into_iter().map(IdentityRecord::from_value).collect(),
        other => match error_envelope(&other) {
            Some(msg) => Err(PortalError::BackendError(msg)),
            None => Err(PortalError::UnexpectedShape("search did not return a list".into())),
        },
    }
}

/// One line per match for the numbered chooser.
pub fn choice_lines(matches: &[IdentityRecord]) -> Vec<String> {
    matches
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} ({})", i + 1, r.display_name(), r.primary_alias().unwrap_or("-")))
        .collect()
}

/// 1-based `answer` into `matches`.
pub fn pick<'a>(matches: &'a [IdentityRecord], answer: &str) -> Option<&'a IdentityRecord> {
    let n: usize = answer.trim().parse().ok()?;
    matches.get(n.checked_sub(1)?)
}

fn record_id(record: &IdentityRecord) -> PortalResult<String> {
    let zid = record.zid.as_deref().filter(|z| !z.trim().is_empty()).ok_or(PortalError::MissingField("id"))?;
    Ok(bare_record_id(zid).to_string())
}

/// Name, per-module access and the identity module of one record.
pub fn describe(portal: &dyn Portal, record: &IdentityRecord) -> PortalResult<String> {
    let id = record_id(record)?;
    let name = portal.name_by_id(&id).unwrap_or_else(|e| {
        debug!(target: "hdtools::cli", "name lookup for {} failed: {}", id, e);
        record.display_name()
    });
    let mut out = vec![format!("Name: {}", name), "Modules:".to_string()];
    for m in portal.list_modules()? {
        let status = portal.check_module_authorized(&m.module, &id).unwrap_or(Tristate::Unknown);
        let label = if m.label.is_empty() { &m.module } else { &m.label };
        out.push(format!("  [{}] {}", status.tag(), label));
    }
    out.push(String::new());
    out.push(match portal.fetch_module(IDENTITY_MODULE, &id) {
        Ok(module) => format_module(&module),
        Err(e) => format!("error: {}", e),
    });
    Ok(out.join("\n"))
}

pub fn history(portal: &dyn Portal, record: &IdentityRecord) -> PortalResult<String> {
    Ok(format_history(&portal.fetch_history(&record_id(record)?)?))
}

/// Columns of the tabular search view.
pub const MATCH_COLUMNS: [&str; 4] = ["#", "Name", "Username", "ID"];

pub fn match_rows(matches: &[IdentityRecord]) -> Vec<Vec<String>> {
    matches
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.display_name(),
                r.primary_alias().unwrap_or("").to_string(),
                r.zid.as_deref().map(bare_record_id).unwrap_or("").to_string(),
            ]
        })
        .collect()
}

fn read(rl: &mut DefaultEditor, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() { rl.add_history_entry(line.as_str())?; }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// A single match is taken as is; otherwise ask.
fn choose(rl: &mut DefaultEditor, matches: Vec<IdentityRecord>) -> Result<Option<IdentityRecord>> {
    match matches.len() {
        0 => {
            println!("No matches.");
            Ok(None)
        }
        1 => Ok(matches.into_iter().next()),
        n => {
            for line in choice_lines(&matches) { println!("{}", line); }
            let answer = read(rl, &format!("Select [1-{}]: ", n))?.unwrap_or_default();
            match pick(&matches, &answer) {
                Some(r) => Ok(Some(r.clone())),
                None => {
                    println!("Invalid selection.");
                    Ok(None)
                }
            }
        }
    }
}

pub fn shell(portal: &dyn Portal) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("hdtools interactive shell. Type 'help' for commands.");
    while let Some(line) = read(&mut rl, "hdtools> ")? {
        let line = line.trim();
        if line.is_empty() { continue; }
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match cmd.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "help" => println!("{}", HELP),
            "search" | "history" if rest.is_empty() => println!("usage: {} <query>", cmd),
            "search" | "history" => {
                let matches = match search_matches(portal, rest) {
                    Ok(m) => m,
                    Err(e) => {
                        eprintln!("error: {}", e);
                        continue;
                    }
                };
                let Some(record) = choose(&mut rl, matches)? else { continue };
                let shown = if cmd.eq_ignore_ascii_case("search") { describe(portal, &record) } else { history(portal, &record) };
                match shown {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            other => println!("unknown command '{}'; type 'help'", other),
        }
    }
    Ok(())
}

pub fn search_view(portal: &dyn Portal) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Enter a search query, or an empty line to quit.");
    while let Some(query) = read(&mut rl, "search> ")? {
        let query = query.trim();
        if query.is_empty() { break; }
        match search_matches(portal, query) {
            Ok(matches) if matches.is_empty() => println!("No matches."),
            Ok(matches) => {
                let cols: Vec<String> = MATCH_COLUMNS.iter().map(|c| c.to_string()).collect();
                println!("{}", render_table(&cols, &match_rows(&matches), terminal_width()));
            }
            Err(e) => eprintln!("error: {}", e),
        }
    }
    Ok(())
}
