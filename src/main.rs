mod config;
mod engine;
mod manager;
mod model;
mod neighbors;
mod stats;
mod world;

use crate::config::Config;
use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{io, path::PathBuf};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Perform a single run and print its trajectory.
    Run {
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = 0)]
        run_idx: usize,
    },

    /// Perform a batch of independent runs and print their statistics.
    Batch {
        #[arg(long)]
        n_runs: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mut cfg = Config::from_file(&args.config).context("failed to construct cfg")?;

    let mut stdout = io::stdout().lock();
    match args.command {
        Command::Run { seed, run_idx } => {
            if seed.is_some() {
                cfg.run.seed = seed;
            }
            let mgr = Manager::new(cfg).context("failed to construct mgr")?;
            let n_inf_vec = mgr.run_simulation(run_idx)?;
            Manager::write_trajectory(&mut stdout, &n_inf_vec)?;
        }
        Command::Batch { n_runs, seed } => {
            if let Some(n_runs) = n_runs {
                cfg.run.n_runs = n_runs;
            }
            if seed.is_some() {
                cfg.run.seed = seed;
            }
            let n_runs = cfg.run.n_runs;
            let mgr = Manager::new(cfg).context("failed to construct mgr")?;
            let stats = mgr.run_batch(n_runs)?;
            Manager::write_batch_report(&mut stdout, &stats)?;
        }
    }

    Ok(())
}
