/// Alpha-stable sampler for heavy-tailed 1-day returns
/// Uses the Chambers-Mallows-Stuck construction in the S1 parameterisation

use std::f64::consts::{FRAC_2_PI, FRAC_PI_2};

use rand::Rng;
use rand_distr::{Distribution, Exp1, Uniform};

use crate::errors::SimResult;
use crate::models::DistributionParameters;

/// Stable distribution S1(alpha, beta, scale, location).
///
/// Every draw consumes one uniform angle and one unit exponential from the
/// caller's stream, so a seeded stream reproduces the same draws.
#[derive(Clone, Debug)]
pub struct StableDistribution {
    alpha: f64,
    beta: f64,
    scale: f64,
    location: f64,
    // Skew shift B and scale factor S of the alpha != 1 branch
    shift: f64,
    factor: f64,
    angle: Uniform<f64>,
}

impl StableDistribution {
    pub fn new(params: &DistributionParameters) -> SimResult<Self> {
        params.validate()?;

        let alpha = params.alpha();
        let beta = params.beta();
        let (shift, factor) = if alpha == 1.0 {
            (0.0, 1.0)
        } else {
            let zeta = beta * (std::f64::consts::PI * alpha / 2.0).tan();
            (zeta.atan() / alpha, (1.0 + zeta * zeta).powf(1.0 / (2.0 * alpha)))
        };

        Ok(Self {
            alpha,
            beta,
            scale: params.scale(),
            location: params.location(),
            shift,
            factor,
            angle: Uniform::new(-FRAC_PI_2, FRAC_PI_2),
        })
    }

    fn standard(&self, v: f64, w: f64) -> f64 {
        if self.alpha == 1.0 {
            let tilt = FRAC_PI_2 + self.beta * v;
            FRAC_2_PI * (tilt * v.tan() - self.beta * ((FRAC_PI_2 * w * v.cos()) / tilt).ln())
        } else {
            let a = self.alpha;
            let av = a * (v + self.shift);
            self.factor * av.sin() / v.cos().powf(1.0 / a)
                * ((v - av).cos() / w).powf((1.0 - a) / a)
        }
    }
}

impl Distribution<f64> for StableDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let v = self.angle.sample(rng);
        let w: f64 = Exp1.sample(rng);
        let z = self.standard(v, w);

        if self.alpha == 1.0 {
            self.scale * z + FRAC_2_PI * self.beta * self.scale * self.scale.ln() + self.location
        } else {
            self.scale * z + self.location
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn draws(params: DistributionParameters, n: usize, seed: u64) -> Vec<f64> {
        let dist = StableDistribution::new(&params).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut values: Vec<f64> = (0..n).map(|_| dist.sample(&mut rng)).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values
    }

    fn order_stat(sorted: &[f64], p: f64) -> f64 {
        sorted[((sorted.len() - 1) as f64 * p).round() as usize]
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let params = DistributionParameters::default();
        assert!(StableDistribution::new(&params).is_ok());

        let json = r#"{ "alpha": 3.0, "beta": 0.0, "scale": 1.0, "location": 0.0 }"#;
        let bad: DistributionParameters = serde_json::from_str(json).unwrap();
        assert!(StableDistribution::new(&bad).is_err());
    }

    #[test]
    fn test_gaussian_limit_has_variance_two() {
        // alpha = 2 is N(location, 2 * scale^2)
        let params = DistributionParameters::new(2.0, 0.0, 1.0, 0.5).unwrap();
        let values = draws(params, 50_000, 7);
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!((mean - 0.5).abs() < 0.05, "mean = {mean}");
        assert!((var - 2.0).abs() < 0.1, "variance = {var}");
    }

    #[test]
    fn test_cauchy_quartiles() {
        // alpha = 1, beta = 0 is Cauchy(location, scale)
        let params = DistributionParameters::new(1.0, 0.0, 1.0, 0.0).unwrap();
        let values = draws(params, 40_000, 11);
        assert!((order_stat(&values, 0.25) + 1.0).abs() < 0.06);
        assert!(order_stat(&values, 0.5).abs() < 0.05);
        assert!((order_stat(&values, 0.75) - 1.0).abs() < 0.06);
    }

    #[test]
    fn test_symmetric_median_sits_at_location() {
        let values = draws(DistributionParameters::default(), 40_000, 3);
        let median = order_stat(&values, 0.5);
        assert!((median - 1.0).abs() < 0.05, "median = {median}");
    }

    #[test]
    fn test_positive_skew_pushes_mass_right() {
        let right = DistributionParameters::new(1.5, 1.0, 1.0, 0.0).unwrap();
        let left = DistributionParameters::new(1.5, -1.0, 1.0, 0.0).unwrap();
        let right_values = draws(right, 20_000, 5);
        let left_values = draws(left, 20_000, 5);
        assert!(order_stat(&right_values, 0.01) > order_stat(&left_values, 0.01));
        assert!(order_stat(&right_values, 0.99) > order_stat(&left_values, 0.99));
    }

    #[test]
    fn test_draws_are_finite() {
        let values = draws(DistributionParameters::default(), 10_000, 19);
        assert!(values.iter().all(|x| x.is_finite()));
    }
}
