use crate::config::Config;
use crate::model::AgentParams;
use crate::world::World;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Simulation engine.
///
/// Holds the configuration, the world of a single run, and the random number
/// generator driving it.
pub struct Engine {
    cfg: Config,
    world: World,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with a random initial state.
    ///
    /// With a configured seed, run `run_idx` draws from its own stream of
    /// that seed; otherwise the generator is seeded from the OS.
    pub fn generate_initial_condition(cfg: Config, run_idx: usize) -> Result<Self> {
        let rng = match cfg.run.seed {
            Some(seed) => {
                let mut rng = ChaCha12Rng::seed_from_u64(seed);
                rng.set_stream(run_idx as u64);
                rng
            }
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng from OS")?,
        };
        Self::with_rng(cfg, rng)
    }

    /// Create a new `Engine` driven by the given generator.
    ///
    /// The configuration is expected to be validated already; only the
    /// geometry and agent parameters are checked again by the world.
    pub fn with_rng(cfg: Config, mut rng: ChaCha12Rng) -> Result<Self> {
        let mut world = World::new(
            cfg.world.arena_size,
            cfg.world.infection_radius,
            cfg.world.neighbor_search,
        )
        .context("failed to construct world")?;

        let params = AgentParams {
            infection_timer_max: cfg.population.infection_timer_max,
            resistance: cfg.population.resistance,
            resistance_factor: cfg.population.resistance_factor,
        };
        world
            .create_agents(cfg.population.n_susceptible, false, params, &mut rng)
            .context("failed to create susceptible agents")?;
        world
            .create_agents(cfg.population.n_infected, true, params, &mut rng)
            .context("failed to create infected agents")?;

        Ok(Self { cfg, world, rng })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Perform the simulation and return the number of infected agents
    /// measured at each step.
    pub fn perform_simulation(&mut self) -> Vec<usize> {
        let total_steps = self.cfg.run.total_steps;
        let steps_per_log = (total_steps / 10).max(1);

        let mut n_inf_vec = Vec::with_capacity(total_steps);
        for i_step in 0..total_steps {
            let n_inf = self.world.step(self.cfg.run.move_step_scale, &mut self.rng);
            n_inf_vec.push(n_inf);

            if (i_step + 1) % steps_per_log == 0 {
                let progress = 100.0 * (i_step + 1) as f64 / total_steps as f64;
                log::debug!("completed {progress:06.2}% (n_inf = {n_inf})");
            }
        }
        log::debug!("mean resistance = {:.4}", self.world.mean_resistance());

        n_inf_vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbors::NeighborSearch;

    fn seeded_reference(seed: u64) -> Config {
        let mut cfg = Config::reference();
        cfg.run.seed = Some(seed);
        cfg
    }

    #[test]
    fn reference_run_invariants() {
        let cfg = seeded_reference(11);
        let mut engine = Engine::generate_initial_condition(cfg, 0).unwrap();
        let n_inf_vec = engine.perform_simulation();

        assert_eq!(n_inf_vec.len(), 500);
        assert_eq!(n_inf_vec[0], 1);
        assert!(n_inf_vec.iter().all(|&n_inf| n_inf <= 200));
        for agt in engine.world().agents() {
            let (x, y) = agt.position();
            assert!((0.0..=100.0).contains(&x) && (0.0..=100.0).contains(&y));
        }
    }

    #[test]
    fn same_seed_same_trajectory() {
        let run = |run_idx| {
            Engine::generate_initial_condition(seeded_reference(42), run_idx)
                .unwrap()
                .perform_simulation()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn runs_draw_from_independent_streams() {
        let cfg = seeded_reference(42);
        let a = Engine::generate_initial_condition(cfg.clone(), 0).unwrap();
        let b = Engine::generate_initial_condition(cfg, 1).unwrap();
        let pos_a: Vec<_> = a.world().agents().iter().map(|agt| agt.position()).collect();
        let pos_b: Vec<_> = b.world().agents().iter().map(|agt| agt.position()).collect();
        assert_ne!(pos_a, pos_b);
    }

    #[test]
    fn unseeded_runs_work() {
        let mut cfg = Config::reference();
        cfg.run.total_steps = 10;
        cfg.world.neighbor_search = NeighborSearch::Grid;
        let n_inf_vec = Engine::generate_initial_condition(cfg, 0)
            .unwrap()
            .perform_simulation();
        assert_eq!(n_inf_vec.len(), 10);
        assert_eq!(n_inf_vec[0], 1);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = Config::reference();
        cfg.world.infection_radius = -1.0;
        assert!(Engine::generate_initial_condition(cfg, 0).is_err());
    }

    #[test]
    fn crowded_arena_stays_infected() {
        // Everyone is within reach of everyone else, so the first exposure
        // phase infects the whole population and later ones keep refreshing
        // every timer before it runs out.
        let mut cfg = seeded_reference(5);
        cfg.world.arena_size = 2.0;
        cfg.population.n_susceptible = 49;
        cfg.population.resistance = 0.0;
        cfg.run.total_steps = 30;
        let n_inf_vec = Engine::generate_initial_condition(cfg, 0)
            .unwrap()
            .perform_simulation();
        assert_eq!(n_inf_vec[0], 1);
        assert!(n_inf_vec[1..].iter().all(|&n_inf| n_inf == 50));
    }
}
