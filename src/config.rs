use crate::neighbors::NeighborSearch;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Arena geometry.
    pub world: WorldConfig,
    /// Initial population.
    pub population: PopulationConfig,
    /// Run parameters.
    pub run: RunConfig,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldConfig {
    /// Side length of the square arena.
    pub arena_size: f64,
    /// Distance below which an infected agent exposes another one.
    pub infection_radius: f64,
    /// Proximity search strategy.
    #[serde(default)]
    pub neighbor_search: NeighborSearch,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulationConfig {
    /// Number of agents created susceptible.
    pub n_susceptible: usize,
    /// Number of agents created infected.
    pub n_infected: usize,
    /// Number of steps an infection lasts.
    pub infection_timer_max: i32,
    /// Initial resistance of every agent.
    pub resistance: f64,
    /// Resistance gained on each recovery.
    pub resistance_factor: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Number of steps per run.
    pub total_steps: usize,
    /// Standard deviation of the per-axis displacement of each step.
    pub move_step_scale: f64,
    /// Number of independent runs in a batch.
    pub n_runs: usize,
    /// Base seed; each run uses its own stream of it.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// The reference scenario: 199 susceptible agents and 1 infected agent
    /// in a 100 x 100 arena, run for 500 steps.
    #[cfg(test)]
    pub fn reference() -> Self {
        Self {
            world: WorldConfig {
                arena_size: 100.0,
                infection_radius: 5.0,
                neighbor_search: NeighborSearch::Pairwise,
            },
            population: PopulationConfig {
                n_susceptible: 199,
                n_infected: 1,
                infection_timer_max: 20,
                resistance: 0.2,
                resistance_factor: 1.2,
            },
            run: RunConfig {
                total_steps: 500,
                move_step_scale: 1.0,
                n_runs: 20,
                seed: None,
            },
        }
    }

    /// Total number of agents in a run.
    pub fn n_agents(&self) -> usize {
        self.population.n_susceptible + self.population.n_infected
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.world.arena_size, f64::MIN_POSITIVE..f64::INFINITY)
            .context("invalid arena size")?;
        check_num(self.world.infection_radius, f64::MIN_POSITIVE..f64::INFINITY)
            .context("invalid infection radius")?;

        check_num(self.n_agents(), 1..).context("invalid population size")?;
        check_num(self.population.infection_timer_max, 1..)
            .context("invalid maximum infection timer")?;
        check_num(self.population.resistance, f64::MIN..=f64::MAX)
            .context("invalid resistance")?;
        check_num(self.population.resistance_factor, 0.0..=f64::MAX)
            .context("invalid resistance factor")?;

        check_num(self.run.total_steps, 1..).context("invalid total number of steps")?;
        check_num(self.run.move_step_scale, 0.0..=f64::MAX)
            .context("invalid move step scale")?;
        check_num(self.run.n_runs, 1..).context("invalid number of runs")?;

        Ok(())
    }
}

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    // NaN is never contained in a range, so it is rejected here too.
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE_TOML: &str = r#"
[world]
arena_size = 100.0
infection_radius = 5.0

[population]
n_susceptible = 199
n_infected = 1
infection_timer_max = 20
resistance = 0.2
resistance_factor = 1.2

[run]
total_steps = 500
move_step_scale = 1.0
n_runs = 20
"#;

    #[test]
    fn parses_reference_scenario() {
        let cfg = Config::from_toml_str(REFERENCE_TOML).unwrap();
        assert_eq!(cfg, Config::reference());
        assert_eq!(cfg.n_agents(), 200);
    }

    #[test]
    fn parses_grid_search_and_seed() {
        let contents = REFERENCE_TOML
            .replace(
                "infection_radius = 5.0",
                "infection_radius = 5.0\nneighbor_search = \"grid\"",
            )
            .replace("n_runs = 20", "n_runs = 20\nseed = 7");
        let cfg = Config::from_toml_str(&contents).unwrap();
        assert_eq!(cfg.world.neighbor_search, NeighborSearch::Grid);
        assert_eq!(cfg.run.seed, Some(7));
    }

    #[test]
    fn rejects_unknown_fields() {
        let contents = REFERENCE_TOML.replace("n_runs = 20", "n_runs = 20\nquarantine = true");
        assert!(Config::from_toml_str(&contents).is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            ("arena_size = 100.0", "arena_size = 0.0", "invalid arena size"),
            ("infection_radius = 5.0", "infection_radius = -5.0", "invalid infection radius"),
            (
                "infection_timer_max = 20",
                "infection_timer_max = 0",
                "invalid maximum infection timer",
            ),
            ("resistance_factor = 1.2", "resistance_factor = -0.1", "invalid resistance factor"),
            ("total_steps = 500", "total_steps = 0", "invalid total number of steps"),
            ("move_step_scale = 1.0", "move_step_scale = nan", "invalid move step scale"),
            ("n_runs = 20", "n_runs = 0", "invalid number of runs"),
        ];
        for (from, to, msg) in cases {
            let contents = REFERENCE_TOML.replace(from, to);
            let err = Config::from_toml_str(&contents).unwrap_err();
            assert!(
                format!("{err:#}").contains(msg),
                "expected {msg:?} in {err:#}"
            );
        }
    }

    #[test]
    fn rejects_empty_population() {
        let mut cfg = Config::reference();
        cfg.population.n_susceptible = 0;
        cfg.population.n_infected = 0;
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err:#}").contains("invalid population size"));
    }

    #[test]
    fn check_num_rejects_nan() {
        assert!(check_num(f64::NAN, 0.0..=f64::MAX).is_err());
        assert!(check_num(1.0, 0.0..=f64::MAX).is_ok());
    }
}
