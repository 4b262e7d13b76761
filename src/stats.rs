/// Online mean and sample standard deviation (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Shape of a single epidemic curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Largest number of infected agents.
    pub peak: usize,
    /// First step at which the peak was reached.
    pub peak_step: usize,
    /// Number of infected agents at the last step.
    pub last: usize,
    /// First step with no infected agents, if the epidemic died out.
    pub extinction_step: Option<usize>,
}

impl RunSummary {
    pub fn from_trajectory(n_inf_vec: &[usize]) -> Self {
        let mut peak = 0;
        let mut peak_step = 0;
        for (step, &n_inf) in n_inf_vec.iter().enumerate() {
            if n_inf > peak {
                peak = n_inf;
                peak_step = step;
            }
        }
        Self {
            peak,
            peak_step,
            last: n_inf_vec.last().copied().unwrap_or(0),
            extinction_step: n_inf_vec.iter().position(|&n_inf| n_inf == 0),
        }
    }
}

/// Per-step statistics over a batch of trajectories of equal length.
pub struct BatchStats {
    acc_vec: Vec<Accumulator>,
    summaries: Vec<RunSummary>,
}

impl BatchStats {
    pub fn new(n_steps: usize) -> Self {
        let mut acc_vec = Vec::new();
        acc_vec.resize_with(n_steps, Accumulator::new);
        Self {
            acc_vec,
            summaries: Vec::new(),
        }
    }

    pub fn add(&mut self, n_inf_vec: &[usize]) {
        for (acc, &n_inf) in self.acc_vec.iter_mut().zip(n_inf_vec) {
            acc.add(n_inf as f64);
        }
        self.summaries.push(RunSummary::from_trajectory(n_inf_vec));
    }

    pub fn step_reports(&self) -> Vec<AccumulatorReport> {
        self.acc_vec.iter().map(Accumulator::report).collect()
    }

    pub fn summaries(&self) -> &[RunSummary] {
        &self.summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_matches_direct_formulas() {
        let vals = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut acc = Accumulator::new();
        for val in vals {
            acc.add(val);
        }
        let report = acc.report();
        assert!((report.mean - 5.0).abs() < 1e-12);
        // Sample variance is 32 / 7.
        assert!((report.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn accumulator_needs_two_values_for_std_dev() {
        let mut acc = Accumulator::new();
        assert!(acc.report().mean.is_nan());
        acc.add(3.0);
        let report = acc.report();
        assert_eq!(report.mean, 3.0);
        assert!(report.std_dev.is_nan());
    }

    #[test]
    fn summary_of_epidemic_curve() {
        let summary = RunSummary::from_trajectory(&[1, 3, 7, 7, 4, 0, 0]);
        assert_eq!(
            summary,
            RunSummary {
                peak: 7,
                peak_step: 2,
                last: 0,
                extinction_step: Some(5),
            }
        );

        let summary = RunSummary::from_trajectory(&[1, 2, 2]);
        assert_eq!(summary.extinction_step, None);
        assert_eq!(summary.last, 2);
    }

    #[test]
    fn batch_stats_per_step() {
        let mut stats = BatchStats::new(3);
        stats.add(&[1, 2, 3]);
        stats.add(&[1, 4, 5]);
        let reports = stats.step_reports();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].mean, 1.0);
        assert_eq!(reports[0].std_dev, 0.0);
        assert_eq!(reports[1].mean, 3.0);
        assert!((reports[2].std_dev - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.summaries().len(), 2);
    }
}
