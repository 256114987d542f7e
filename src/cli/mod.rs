//! Command surface: argument parsing, the session liveness gate, and batch
//! dispatch into the pipeline and output sinks.

pub mod interactive;
pub mod outputformatter;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use crate::config::Config;
use crate::gateway::{Portal, SessionContext};
use crate::identity::load_credentials;
use crate::pipeline::{self, Filter, Operation};
use outputformatter::{emit, formatter_for, select_sinks, FileTarget, PrintMode};

#[derive(Parser, Debug)]
#[command(name = "hdtools")]
#[command(about = "Batch account lookups against the HDTools portal")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// File of `identity<TAB>secret` lines, read after positional usernames
    #[arg(short, long, global = true, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Print to the console as plain text (N), indented JSON (J) or raw JSON (R)
    #[arg(short, long, global = true, value_enum, value_name = "MODE")]
    pub print: Option<PrintArg>,

    /// Write plain text to FILE
    #[arg(long, global = true, value_name = "FILE", conflicts_with_all = ["out_json", "out_all"])]
    pub out_plain: Option<PathBuf>,

    /// Write indented JSON to FILE
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "out_all")]
    pub out_json: Option<PathBuf>,

    /// Write BASE.txt and BASE.json
    #[arg(long, global = true, value_name = "BASE")]
    pub out_all: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrintArg {
    #[value(alias = "N")]
    Plain,
    #[value(alias = "J")]
    Json,
    #[value(alias = "R")]
    Raw,
}

impl From<PrintArg> for PrintMode {
    fn from(p: PrintArg) -> Self {
        match p {
            PrintArg::Plain => PrintMode::Plain,
            PrintArg::Json => PrintMode::Structured,
            PrintArg::Raw => PrintMode::Raw,
        }
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct Targets {
    /// Usernames or email addresses
    pub usernames: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search identities and list every match
    Search(Targets),
    /// Whether each account is active
    Active {
        #[command(flatten)]
        targets: Targets,
        /// Also treat locked accounts as inactive
        #[arg(long)]
        locked: bool,
        /// all, active or inactive
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    /// Whether each account is locked out
    Lockout {
        #[command(flatten)]
        targets: Targets,
        /// all, locked or unlocked
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    /// Whether each identity is enrolled in a study-abroad program
    Abroad {
        #[command(flatten)]
        targets: Targets,
        /// all, abroad or local
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    /// Departments of active employee records
    Department(Targets),
    /// Supervisors of active employee records
    Supervisor(Targets),
    /// Time of the last password change
    Lastpass(Targets),
    /// Check `identity<TAB>password` pairs from --input
    Login(Targets),
    /// Reset passwords
    Reset(Targets),
    /// Interactive lookup shell
    Cli,
    /// Interactive search with tabular results
    Tui,
}

impl Command {
    /// Operation, identities and filter label of a batch command.
    pub fn batch(&self) -> Option<(Operation, &Targets, &str)> {
        Some(match self {
            Command::Search(t) => (Operation::Search, t, "all"),
            Command::Active { targets, locked, filter } => (Operation::Active { lockout_aware: *locked }, targets, filter.as_str()),
            Command::Lockout { targets, filter } => (Operation::Lockout, targets, filter.as_str()),
            Command::Abroad { targets, filter } => (Operation::Abroad, targets, filter.as_str()),
            Command::Department(t) => (Operation::Department, t, "all"),
            Command::Supervisor(t) => (Operation::Supervisor, t, "all"),
            Command::Lastpass(t) => (Operation::LastPassword, t, "all"),
            Command::Login(t) => (Operation::Login, t, "all"),
            Command::Reset(t) => (Operation::Reset, t, "all"),
            Command::Cli | Command::Tui => return None,
        })
    }
}

impl Args {
    pub fn file_target(&self) -> Option<FileTarget> {
        if let Some(p) = &self.out_plain { return Some(FileTarget::Plain(p.clone())); }
        if let Some(p) = &self.out_json { return Some(FileTarget::Structured(p.clone())); }
        self.out_all.clone().map(FileTarget::Pair)
    }
}

/// How a command ended; maps onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    SessionInvalid,
}

impl Outcome {
    pub fn exit_status(self) -> u8 {
        match self {
            Outcome::Completed => 0,
            Outcome::SessionInvalid => 1,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(o: Outcome) -> Self { ExitCode::from(o.exit_status()) }
}

/// The session check has to pass twice in a row before anything runs.
pub fn session_alive(portal: &dyn Portal) -> bool {
    (0..2).all(|attempt| {
        let ok = portal.verify_session();
        if !ok { info!(target: "hdtools::cli", "session check {} failed", attempt + 1); }
        ok
    })
}

pub fn run(args: Args) -> Result<ExitCode> {
    let config = Config::from_env()?;
    let session = SessionContext::connect(&config)?;
    run_with(&session, &args).map(ExitCode::from)
}

pub fn run_with(portal: &dyn Portal, args: &Args) -> Result<Outcome> {
    let batch = args.command.batch();
    let filter = match &batch {
        Some((op, _, label)) => Filter::from_label(*op, label).map_err(|e| anyhow!(e))?,
        None => Filter::All,
    };

    if !session_alive(portal) {
        error!(target: "hdtools::cli", "HDTools session is not valid; refresh the cookie and try again");
        return Ok(Outcome::SessionInvalid);
    }

    match batch {
        Some((op, targets, _)) => {
            let credentials = load_credentials(&targets.usernames, args.input.as_deref())?;
            let results = pipeline::apply(pipeline::run(portal, &credentials, op), filter);
            let sinks = select_sinks(args.print.map(PrintMode::from), args.file_target());
            emit(&results, &sinks, formatter_for(op).as_ref())?;
        }
        None => match args.command {
            Command::Tui => interactive::search_view(portal)?,
            _ => interactive::shell(portal)?,
        },
    }
    Ok(Outcome::Completed)
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
