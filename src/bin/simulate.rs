//! Battle-phase simulation CLI.
//!
//! Plays random battle phases and writes one JSON record per game, followed
//! by a summary on stderr.
//!
//! Usage:
//!   cargo run --release --bin simulate -- [OPTIONS]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::error;

use arrakeen::config::RulesConfig;
use arrakeen::simulate::{self, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "simulate", version, about = "Plays random battle phases")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Factions seated per game (2-12)
    #[arg(long, default_value_t = 6)]
    factions: usize,

    /// Force stacks each faction places
    #[arg(long, default_value_t = 3)]
    stacks: usize,

    /// Territories forces are dealt into
    #[arg(long, default_value_t = 8)]
    territories: usize,

    /// Number of parallel threads
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Random seed, 0 for entropy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Rules configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Suppress per-game logging and the summary
    #[arg(short, long)]
    quiet: bool,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let rules = match &args.config {
        Some(path) => RulesConfig::load(path)?,
        None => RulesConfig::default(),
    };
    let config = SimulationConfig {
        games: args.games,
        factions: args.factions,
        stacks: args.stacks,
        territories: args.territories,
        threads: args.threads,
        seed: args.seed,
        quiet: args.quiet,
        rules,
    };

    if !args.quiet {
        eprintln!(
            "Simulation: {} games, {} factions, {} stacks over {} territories, {} threads",
            config.games, config.factions, config.stacks, config.territories, config.threads
        );
    }

    let start = Instant::now();
    let games = simulate::run_simulation(&config)?;
    let elapsed = start.elapsed();

    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            simulate::write_jsonl(&games, &mut writer)?;
            if !args.quiet {
                eprintln!("Wrote {} games to {}", games.len(), path.display());
            }
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            simulate::write_jsonl(&games, &mut writer)?;
        }
    }

    if !args.quiet {
        eprintln!("Completed {} games in {:.2}s", games.len(), elapsed.as_secs_f64());
        let summary = simulate::summarize(&games);
        let mut err = io::stderr().lock();
        serde_json::to_writer_pretty(&mut err, &summary)?;
        writeln!(err)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
