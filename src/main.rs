use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use hdtools::cli::{self, Args};
use hdtools::config::load_dotenv;

fn main() -> ExitCode {
    let args = Args::parse();

    // Init logging; stdout is reserved for results.
    let default_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(e) = load_dotenv(Path::new(".env")) {
        error!(target: "hdtools", "{:#}", e);
    }

    match cli::run(args) {
        Ok(code) => code,
        Err(e) => {
            error!(target: "hdtools", "{:#}", e);
            ExitCode::from(1)
        }
    }
}
