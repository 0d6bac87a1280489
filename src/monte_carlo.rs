/// Monte Carlo simulation and statistical analysis module

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::errors::{SimError, SimResult};
use crate::models::{SampleStats, SimulationConfig};
use crate::returns::{percentile, substream, PercentileSource, ReturnSampler};

/// Run `trials` independent trials on one stream.
/// Each trial draws a brand-new set of 1-day returns; results come back in
/// call order.
pub fn run<R: Rng + ?Sized>(
    config: &SimulationConfig,
    trials: usize,
    rng: &mut R,
) -> SimResult<Vec<f64>> {
    if trials < 1 {
        return Err(SimError::config("trials must be at least 1"));
    }
    let mut sampler = ReturnSampler::new(config.clone(), &mut *rng)?;

    info!(
        trials,
        num_observations = config.num_observations,
        ndays = config.ndays,
        "running Monte Carlo"
    );

    let mut percentiles = Vec::with_capacity(trials);
    for _ in 0..trials {
        percentiles.push(sampler.next_percentile()?);
    }

    debug!(trials, "Monte Carlo finished");
    Ok(percentiles)
}

/// Parallel counterpart of [`run`].
/// Trial `i` draws from substream `i` of `seed`, so the output does not
/// depend on the number of worker threads.
pub fn run_parallel(config: &SimulationConfig, trials: usize, seed: u64) -> SimResult<Vec<f64>> {
    if trials < 1 {
        return Err(SimError::config("trials must be at least 1"));
    }
    config.validate()?;

    info!(trials, seed, "running parallel Monte Carlo");

    (0..trials)
        .into_par_iter()
        .map(|trial| {
            let mut sampler = ReturnSampler::new(config.clone(), substream(seed, trial as u64))?;
            sampler.next_percentile()
        })
        .collect()
}

/// Mean, population standard deviation, range and a few percentiles
pub fn summarize(sample: &[f64]) -> SimResult<SampleStats> {
    if sample.is_empty() {
        return Err(SimError::EmptySeries);
    }

    let (mean, std_dev) = mean_and_std(sample);
    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(SampleStats {
        count: sample.len(),
        mean,
        std_dev,
        min,
        max,
        percentile_5: percentile(sample, 0.05)?,
        percentile_25: percentile(sample, 0.25)?,
        percentile_50: percentile(sample, 0.50)?,
        percentile_75: percentile(sample, 0.75)?,
        percentile_95: percentile(sample, 0.95)?,
    })
}

/// Mean and population (ddof = 0) standard deviation
pub(crate) fn mean_and_std(sample: &[f64]) -> (f64, f64) {
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let variance = sample.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            num_observations: 80,
            ndays: 4,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_run_returns_exactly_trials_values() {
        let sample = run(&small_config(), 250, &mut substream(1, 0)).unwrap();
        assert_eq!(sample.len(), 250);
        assert!(sample.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_run_rejects_zero_trials() {
        assert!(matches!(
            run(&small_config(), 0, &mut substream(1, 0)),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(run_parallel(&small_config(), 0, 1).is_err());
    }

    #[test]
    fn test_run_rejects_bad_config_before_sampling() {
        let config = SimulationConfig {
            ndays: 0,
            ..small_config()
        };
        assert!(run(&config, 10, &mut substream(1, 0)).is_err());
        assert!(run_parallel(&config, 10, 1).is_err());
    }

    #[test]
    fn test_run_is_deterministic_per_stream() {
        let a = run(&small_config(), 50, &mut substream(5, 0)).unwrap();
        let b = run(&small_config(), 50, &mut substream(5, 0)).unwrap();
        let c = run(&small_config(), 50, &mut substream(6, 0)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_trials_are_not_repeats() {
        let sample = run(&small_config(), 100, &mut substream(8, 0)).unwrap();
        let mut sorted = sample.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted.dedup();
        assert!(sorted.len() > 95);
    }

    #[test]
    fn test_run_parallel_matches_per_trial_streams() {
        let config = small_config();
        let parallel = run_parallel(&config, 64, 21).unwrap();
        assert_eq!(parallel.len(), 64);

        for (trial, value) in parallel.iter().enumerate().step_by(13) {
            let single = run(&config, 1, &mut substream(21, trial as u64)).unwrap();
            assert_eq!(single[0], *value);
        }
        assert_eq!(parallel, run_parallel(&config, 64, 21).unwrap());
    }

    #[test]
    fn test_summarize() {
        let stats = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!((stats.percentile_50 - 4.5).abs() < 1e-12);
        assert!(stats.percentile_5 <= stats.percentile_25);
        assert!(stats.percentile_75 <= stats.percentile_95);

        assert_eq!(summarize(&[]), Err(SimError::EmptySeries));
    }
}
