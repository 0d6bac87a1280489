/// Return generation module
/// Draws 1-day returns, compounds them into overlapping n-day returns and
/// reads a quantile off the result

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Distribution;

use crate::errors::{SimError, SimResult};
use crate::models::{validate_quantile, DistributionParameters, SimulationConfig};
use crate::stable::StableDistribution;

/// Independent, reproducible substream `stream` of `seed`
pub fn substream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Draw `n` i.i.d. 1-day returns
pub fn sample_one_day<R: Rng + ?Sized>(
    params: &DistributionParameters,
    n: usize,
    rng: &mut R,
) -> SimResult<Vec<f64>> {
    let dist = StableDistribution::new(params)?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// Overlapping compounded returns: for every window of `ndays` consecutive
/// 1-day returns, the product of `1 + r` minus one.
///
/// Returns an empty series when the window is longer than the input.
pub fn compound(one_day: &[f64], ndays: usize) -> Vec<f64> {
    if ndays == 0 {
        return Vec::new();
    }
    if ndays == 1 {
        return one_day.to_vec();
    }
    one_day
        .windows(ndays)
        .map(|window| window.iter().map(|r| 1.0 + r).product::<f64>() - 1.0)
        .collect()
}

/// `q`-quantile (q on the 0-1 scale) with linear interpolation between
/// order statistics.
pub fn percentile(series: &[f64], q: f64) -> SimResult<f64> {
    validate_quantile(q)?;
    if series.is_empty() {
        return Err(SimError::EmptySeries);
    }
    if let Some(index) = series.iter().position(|x| x.is_nan()) {
        return Err(SimError::NonFiniteSample { index });
    }

    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let h = (sorted.len() - 1) as f64 * q;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let weight = h - lower as f64;

    let (lo, hi) = (sorted[lower], sorted[upper]);
    if weight == 0.0 || lo == hi || lo.is_infinite() {
        // An infinite lower neighbour absorbs the interpolation
        Ok(lo)
    } else if hi.is_infinite() {
        Ok(hi)
    } else {
        Ok(lo + weight * (hi - lo))
    }
}

/// One trial: fresh 1-day draws, compounded, reduced to a single percentile
pub fn get_percentile<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> SimResult<f64> {
    config.validate()?;
    let one_day = sample_one_day(&config.params, config.num_observations, rng)?;
    let n_day = compound(&one_day, config.ndays);
    percentile(&n_day, config.quantile)
}

/// Anything that can hand out one percentile per call
pub trait PercentileSource {
    fn next_percentile(&mut self) -> SimResult<f64>;
}

/// A simulation config bound to its own random stream.
///
/// The config is validated once at construction so repeated draws skip it.
#[derive(Clone, Debug)]
pub struct ReturnSampler<R> {
    config: SimulationConfig,
    dist: StableDistribution,
    rng: R,
}

impl<R: Rng> ReturnSampler<R> {
    pub fn new(config: SimulationConfig, rng: R) -> SimResult<Self> {
        config.validate()?;
        let dist = StableDistribution::new(&config.params)?;
        Ok(Self { config, dist, rng })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

impl<R: Rng> PercentileSource for ReturnSampler<R> {
    fn next_percentile(&mut self) -> SimResult<f64> {
        let one_day: Vec<f64> = (0..self.config.num_observations)
            .map(|_| self.dist.sample(&mut self.rng))
            .collect();
        let n_day = compound(&one_day, self.config.ndays);
        percentile(&n_day, self.config.quantile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            num_observations: 60,
            ndays: 5,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_compound_known_values() {
        let one_day = [0.1, -0.5, 1.0, 0.0];
        let two_day = compound(&one_day, 2);
        let expected = [1.1 * 0.5 - 1.0, 0.5 * 2.0 - 1.0, 2.0 * 1.0 - 1.0];
        assert_eq!(two_day.len(), 3);
        for (got, want) in two_day.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_compound_window_longer_than_series() {
        assert!(compound(&[0.1, 0.2], 3).is_empty());
        assert_eq!(compound(&[0.1, 0.2], 2).len(), 1);
    }

    #[test]
    fn test_percentile_interpolates() {
        let series = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&series, 0.0).unwrap(), 1.0);
        assert_eq!(percentile(&series, 1.0).unwrap(), 5.0);
        assert_eq!(percentile(&series, 0.5).unwrap(), 3.0);
        assert!((percentile(&series, 0.1).unwrap() - 1.4).abs() < 1e-12);
        assert_eq!(percentile(&[7.5], 0.3).unwrap(), 7.5);
    }

    #[test]
    fn test_percentile_with_infinite_neighbours() {
        use std::f64::{INFINITY, NEG_INFINITY};

        assert_eq!(percentile(&[NEG_INFINITY, NEG_INFINITY, 1.0], 0.25).unwrap(), NEG_INFINITY);
        assert_eq!(percentile(&[NEG_INFINITY, 0.0, 1.0], 0.25).unwrap(), NEG_INFINITY);
        assert_eq!(percentile(&[-1.0, 0.0, INFINITY], 0.75).unwrap(), INFINITY);
        assert_eq!(percentile(&[1.0, INFINITY, INFINITY], 0.75).unwrap(), INFINITY);
        assert!((percentile(&[NEG_INFINITY, 0.0, 1.0], 0.75).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_errors() {
        assert_eq!(percentile(&[], 0.5), Err(SimError::EmptySeries));
        assert!(matches!(
            percentile(&[1.0, 2.0], 1.01),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            percentile(&[1.0, 2.0], -0.1),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert_eq!(
            percentile(&[1.0, f64::NAN, 2.0], 0.5),
            Err(SimError::NonFiniteSample { index: 1 })
        );
    }

    #[test]
    fn test_sample_one_day_length_and_validation() {
        let mut rng = substream(1, 0);
        let draws = sample_one_day(&DistributionParameters::default(), 250, &mut rng).unwrap();
        assert_eq!(draws.len(), 250);

        let bad: DistributionParameters =
            serde_json::from_str(r#"{ "beta": 2.0 }"#).unwrap();
        match sample_one_day(&bad, 10, &mut rng) {
            Err(SimError::InvalidParameter { name, .. }) => assert_eq!(name, "beta"),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_get_percentile_rejects_bad_config_before_sampling() {
        let config = SimulationConfig {
            num_observations: 3,
            ndays: 4,
            ..SimulationConfig::default()
        };
        let mut rng = substream(2, 0);
        assert!(matches!(
            get_percentile(&config, &mut rng),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_get_percentile_is_reproducible() {
        let config = small_config();
        let a = get_percentile(&config, &mut substream(42, 0)).unwrap();
        let b = get_percentile(&config, &mut substream(42, 0)).unwrap();
        assert_eq!(a, b);

        let c = get_percentile(&config, &mut substream(42, 1)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_sampler_matches_free_function() {
        let config = small_config();
        let mut sampler = ReturnSampler::new(config.clone(), substream(9, 3)).unwrap();
        let mut rng = substream(9, 3);
        for _ in 0..5 {
            let expected = get_percentile(&config, &mut rng).unwrap();
            assert_eq!(sampler.next_percentile().unwrap(), expected);
        }
    }
}
