use crate::config::Config;
use crate::engine::Engine;
use crate::stats::BatchStats;
use anyhow::{Context, Result};
use std::io::Write;

/// Drives independent runs of one configuration and reports their results.
pub struct Manager {
    cfg: Config,
}

impl Manager {
    pub fn new(cfg: Config) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;
        log::info!("{cfg:#?}");
        Ok(Self { cfg })
    }

    /// Perform run `run_idx` and return its trajectory.
    pub fn run_simulation(&self, run_idx: usize) -> Result<Vec<usize>> {
        let mut engine = Engine::generate_initial_condition(self.cfg.clone(), run_idx)
            .context("failed to generate initial condition")?;
        let n_inf_vec = engine.perform_simulation();

        let n_agt = engine.world().agents().len();
        let peak = n_inf_vec.iter().max().copied().unwrap_or(0);
        log::info!("completed run {run_idx:04} (n_agt = {n_agt}, peak = {peak})");

        Ok(n_inf_vec)
    }

    /// Perform `n_runs` runs one after another and aggregate them.
    pub fn run_batch(&self, n_runs: usize) -> Result<BatchStats> {
        let mut stats = BatchStats::new(self.cfg.run.total_steps);
        for run_idx in 0..n_runs {
            let n_inf_vec = self
                .run_simulation(run_idx)
                .with_context(|| format!("failed to perform run {run_idx}"))?;
            stats.add(&n_inf_vec);
        }
        Ok(stats)
    }

    /// Write one trajectory, one count per line.
    pub fn write_trajectory<W: Write>(writer: &mut W, n_inf_vec: &[usize]) -> Result<()> {
        for n_inf in n_inf_vec {
            writeln!(writer, "{n_inf}").context("failed to write trajectory")?;
        }
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Write per-run summaries followed by per-step statistics.
    pub fn write_batch_report<W: Write>(writer: &mut W, stats: &BatchStats) -> Result<()> {
        writeln!(writer, "#run  peak  peak_step  last  extinction_step")?;
        for (run_idx, summary) in stats.summaries().iter().enumerate() {
            let extinction_step = match summary.extinction_step {
                Some(step) => step.to_string(),
                None => "-".to_string(),
            };
            writeln!(
                writer,
                "{run_idx:4} {:5} {:10} {:5} {extinction_step:>16}",
                summary.peak, summary.peak_step, summary.last
            )?;
        }
        writeln!(writer)?;

        writeln!(writer, "#step             mean          std_dev")?;
        for (step, report) in stats.step_reports().iter().enumerate() {
            writeln!(
                writer,
                "{step:5} {:16.8} {:16.8}",
                report.mean, report.std_dev
            )?;
        }
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}
