use rand::Rng;
use rand_distr::StandardNormal;

/// Per-agent disease parameters, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentParams {
    /// Number of steps an infection lasts.
    pub infection_timer_max: i32,
    /// Initial resistance.
    pub resistance: f64,
    /// Resistance gained on each recovery.
    pub resistance_factor: f64,
}

/// Agent of the simulation.
///
/// Each agent has a position in the arena, an infection status with its
/// countdown, and a resistance that grows every time the agent recovers.
/// State only changes through [`Agent::move_within`], [`Agent::expose`]
/// and [`Agent::decay_infection`].
#[derive(Debug, Clone)]
pub struct Agent {
    x: f64,
    y: f64,

    infected: bool,
    infection_timer: i32,
    infection_timer_max: i32,

    resistance: f64,
    resistance_factor: f64,
}

impl Agent {
    /// Create a new agent at `(x, y)`.
    ///
    /// Infected agents start with a full infection timer.
    pub fn new(x: f64, y: f64, infected: bool, params: AgentParams) -> Self {
        Self {
            x,
            y,
            infected,
            infection_timer: if infected {
                params.infection_timer_max
            } else {
                0
            },
            infection_timer_max: params.infection_timer_max,
            resistance: params.resistance,
            resistance_factor: params.resistance_factor,
        }
    }

    /// Get the current position of the agent.
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn is_infected(&self) -> bool {
        self.infected
    }

    pub fn infection_timer(&self) -> i32 {
        self.infection_timer
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    /// Displace the agent by a normal jitter of standard deviation `step_scale`
    /// along each axis, then clamp it into `[0, bound] x [0, bound]`.
    pub fn move_within<R: Rng>(&mut self, step_scale: f64, bound: f64, rng: &mut R) {
        let dx: f64 = rng.sample(StandardNormal);
        let dy: f64 = rng.sample(StandardNormal);
        self.x = (self.x + step_scale * dx).clamp(0.0, bound);
        self.y = (self.y + step_scale * dy).clamp(0.0, bound);
    }

    /// Model a single contact.
    ///
    /// With probability `1 - resistance` the agent becomes infected and its
    /// timer is reset to the maximum, even if it was already infected.
    pub fn expose<R: Rng>(&mut self, rng: &mut R) {
        let infection_chance = 1.0 - self.resistance;
        if rng.random::<f64>() < infection_chance {
            self.infected = true;
            self.infection_timer = self.infection_timer_max;
        }
    }

    /// Count down the infection timer of an infected agent.
    ///
    /// Returns `true` if the agent recovered, in which case its resistance
    /// has grown by `resistance_factor`. Does nothing to susceptible agents.
    pub fn decay_infection(&mut self) -> bool {
        if !self.infected {
            return false;
        }
        self.infection_timer -= 1;
        if self.infection_timer < 0 {
            self.infected = false;
            self.resistance += self.resistance_factor;
            return true;
        }
        false
    }
}
