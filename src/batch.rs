//! Monte Carlo execution of many independent simulation instances.

use crate::config::{ConfigError, SimulationConfig};
use crate::simulation::Simulation;
use crate::stats::Statistics;
use serde::Serialize;

/// Mean and standard error of one counter across a batch of trials.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SampleStat {
    pub mean: f64,
    pub std_error: f64,
}

impl SampleStat {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        if values.len() < 2 {
            return Self { mean, std_error: 0.0 };
        }
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Self {
            mean,
            std_error: (variance / n).sqrt(),
        }
    }
}

/// Aggregated statistics across a batch of independently seeded trials.
#[derive(Clone, Debug, Serialize)]
pub struct BatchSummary {
    /// The number of trials aggregated.
    pub trials: u32,
    pub total_generated: SampleStat,
    pub landed: SampleStat,
    pub diverted_congestion: SampleStat,
    pub diverted_wind: SampleStat,
    pub diverted_storm: SampleStat,
    pub diverted_closure: SampleStat,
    pub diverted_to_alternate: SampleStat,
    pub successful_reinsertions: SampleStat,
    pub mean_flight_minutes: SampleStat,
}

impl BatchSummary {
    /// Aggregates per-trial statistics into means and standard errors.
    pub fn from_trials(trials: &[Statistics]) -> Self {
        let metric = |pick: fn(&Statistics) -> f64| {
            SampleStat::from_values(&trials.iter().map(pick).collect::<Vec<_>>())
        };
        Self {
            trials: trials.len() as u32,
            total_generated: metric(|s| s.total_generated as f64),
            landed: metric(|s| s.landed as f64),
            diverted_congestion: metric(|s| s.diverted_congestion as f64),
            diverted_wind: metric(|s| s.diverted_wind as f64),
            diverted_storm: metric(|s| s.diverted_storm as f64),
            diverted_closure: metric(|s| s.diverted_closure as f64),
            diverted_to_alternate: metric(|s| s.diverted_to_alternate as f64),
            successful_reinsertions: metric(|s| s.successful_reinsertions as f64),
            mean_flight_minutes: metric(|s| s.mean_flight_minutes),
        }
    }
}

/// Runs `trials` independently seeded instances of one configuration and
/// aggregates their statistics. Trial `i` runs with seed `config.seed + i`,
/// so a whole batch is reproducible from the base seed.
pub fn run_batch(config: &SimulationConfig, trials: u32) -> Result<BatchSummary, ConfigError> {
    let mut results = Vec::with_capacity(trials as usize);
    for trial in 0..trials {
        let mut config = config.clone();
        config.seed = config.seed.wrapping_add(trial as u64);
        let mut sim = Simulation::new(config)?;
        sim.run();
        results.push(sim.statistics().clone());
    }
    Ok(BatchSummary::from_trials(&results))
}
