use crate::config::check_num;
use crate::model::{Agent, AgentParams};
use crate::neighbors::NeighborSearch;
use anyhow::{Context, Result};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Square arena holding the population of a single run.
///
/// Agent indices are stable for the lifetime of the world: agents are only
/// ever appended by [`World::create_agents`], never removed.
pub struct World {
    arena_size: f64,
    infection_radius: f64,
    neighbor_search: NeighborSearch,
    agt_vec: Vec<Agent>,
}

impl World {
    /// Create an empty world.
    ///
    /// # Errors
    /// Returns an error if the arena size or the infection radius is not a
    /// positive finite number.
    pub fn new(
        arena_size: f64,
        infection_radius: f64,
        neighbor_search: NeighborSearch,
    ) -> Result<Self> {
        check_num(arena_size, f64::MIN_POSITIVE..f64::INFINITY).context("invalid arena size")?;
        check_num(infection_radius, f64::MIN_POSITIVE..f64::INFINITY)
            .context("invalid infection radius")?;
        Ok(Self {
            arena_size,
            infection_radius,
            neighbor_search,
            agt_vec: Vec::new(),
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agt_vec
    }

    /// Place `n_agt` agents uniformly at random in the arena, all infected or
    /// all susceptible.
    ///
    /// # Errors
    /// Returns an error if the maximum infection timer is not positive or if
    /// the resistance parameters are not finite, or the resistance factor is
    /// negative.
    pub fn create_agents<R: Rng>(
        &mut self,
        n_agt: usize,
        infected: bool,
        params: AgentParams,
        rng: &mut R,
    ) -> Result<()> {
        check_num(params.infection_timer_max, 1..).context("invalid maximum infection timer")?;
        check_num(params.resistance, f64::MIN..=f64::MAX).context("invalid resistance")?;
        check_num(params.resistance_factor, 0.0..=f64::MAX)
            .context("invalid resistance factor")?;

        let pos_dist = Uniform::new(0.0, self.arena_size)?;
        self.agt_vec.reserve(n_agt);
        for _ in 0..n_agt {
            let x = pos_dist.sample(rng);
            let y = pos_dist.sample(rng);
            self.agt_vec.push(Agent::new(x, y, infected, params));
        }

        Ok(())
    }

    /// Move every agent by a normal jitter of standard deviation `step_scale`.
    pub fn move_agents<R: Rng>(&mut self, step_scale: f64, rng: &mut R) {
        for agt in &mut self.agt_vec {
            agt.move_within(step_scale, self.arena_size, rng);
        }
    }

    /// Count down the infection of every infected agent.
    ///
    /// Returns the number of agents that recovered.
    pub fn update_infection_timers(&mut self) -> usize {
        let n_rec = self
            .agt_vec
            .iter_mut()
            .map(|agt| agt.decay_infection())
            .filter(|&recovered| recovered)
            .count();
        debug_assert!(
            self.agt_vec
                .iter()
                .all(|agt| agt.is_infected() || agt.infection_timer() <= 0)
        );
        n_rec
    }

    /// Mean resistance over the population.
    pub fn mean_resistance(&self) -> f64 {
        let sum: f64 = self.agt_vec.iter().map(Agent::resistance).sum();
        sum / self.agt_vec.len() as f64
    }

    pub fn get_number_infected(&self) -> usize {
        self.agt_vec.iter().filter(|agt| agt.is_infected()).count()
    }

    /// Indices of the agents within the infection radius of any agent in
    /// `i_agt_vec`, sorted and deduplicated.
    pub fn find_nearby_agents(&self, i_agt_vec: &[usize]) -> Vec<usize> {
        let positions: Vec<_> = self.agt_vec.iter().map(Agent::position).collect();
        self.neighbor_search.find_nearby(
            &positions,
            self.infection_radius,
            self.arena_size,
            i_agt_vec,
        )
    }

    /// Expose each listed agent once.
    pub fn expose_agents<R: Rng>(&mut self, i_agt_vec: &[usize], rng: &mut R) {
        for &i_agt in i_agt_vec {
            self.agt_vec[i_agt].expose(rng);
        }
    }

    /// Expose every agent near a currently infected agent.
    ///
    /// The infected set is fixed before any exposure is applied, and an agent
    /// near several infected agents is exposed only once.
    ///
    /// Returns the number of exposed agents.
    pub fn update_exposure<R: Rng>(&mut self, rng: &mut R) -> usize {
        let i_agt_inf: Vec<_> = self
            .agt_vec
            .iter()
            .enumerate()
            .filter(|(_, agt)| agt.is_infected())
            .map(|(i_agt, _)| i_agt)
            .collect();
        if i_agt_inf.is_empty() {
            return 0;
        }

        let i_agt_exp = self.find_nearby_agents(&i_agt_inf);
        self.expose_agents(&i_agt_exp, rng);
        i_agt_exp.len()
    }

    /// Perform one step and return the number of infected agents measured
    /// after recovery and before exposure.
    pub fn step<R: Rng>(&mut self, step_scale: f64, rng: &mut R) -> usize {
        // Move all agents.
        self.move_agents(step_scale, rng);

        // Recover agents whose infection ran out.
        let n_rec = self.update_infection_timers();

        // Measure before this step's exposures take effect.
        let n_inf = self.get_number_infected();

        // Expose agents near the infected ones.
        let n_exp = self.update_exposure(rng);

        log::trace!("n_inf = {n_inf}, n_rec = {n_rec}, n_exp = {n_exp}");

        n_inf
    }
}
