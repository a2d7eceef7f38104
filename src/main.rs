//! Arrakeen -- a battle-phase adjudicator driven over a line protocol.
//!
//! This binary reads commands from stdin and writes announcements and
//! acknowledgements to stdout. Logs go to stderr, filtered by `RUST_LOG`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use arrakeen::config::RulesConfig;
use arrakeen::engine::Engine;
use arrakeen::protocol::parse_command;

#[derive(Parser, Debug)]
#[command(name = "arrakeen", version, about = "Battle-phase adjudicator")]
struct Args {
    /// Rules configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Runs the protocol loop until `quit` or end of input.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => match RulesConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load rules");
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => RulesConfig::default(),
    };
    info!(?config, "engine started");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new(config);

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                if writeln!(out, "error {}", e).and_then(|_| out.flush()).is_err() {
                    break;
                }
                continue;
            }
        };

        match engine.handle(cmd, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!(error = %e, "failed to write response");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
