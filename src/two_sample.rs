//! Kolmogorov-Smirnov tests used by the convergence checks.
//!
//! - [`ks_2samp`] compares two percentile samples: the statistic is the
//!   largest gap between their empirical CDFs, the p-value comes from the
//!   limiting Kolmogorov distribution with Stephens' small-sample
//!   correction `λ = (√nₑ + 0.12 + 0.11/√nₑ)·D`, `nₑ = nm/(n+m)`.
//! - [`ks_1samp`] compares one sample against a reference CDF; the CLT
//!   check uses it through [`ks_1samp_normal`].
//!
//! Both reject empty input and NaN values instead of producing a
//! meaningless statistic.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::errors::{SimError, SimResult};
use crate::models::KsOutcome;

/// Two-sided two-sample KS test.
///
/// The p-value is asymptotic (Stephens-corrected Kolmogorov limit) at every
/// sample size, so near a significance threshold it can differ slightly
/// from an exact small-sample p-value.
pub fn ks_2samp(a: &[f64], b: &[f64]) -> SimResult<KsOutcome> {
    let a = sorted_copy(a)?;
    let b = sorted_copy(b)?;
    let (n, m) = (a.len(), b.len());

    let mut i = 0;
    let mut j = 0;
    let mut statistic: f64 = 0.0;
    while i < n && j < m {
        let x = a[i].min(b[j]);
        // Step past every tie at x in both samples before comparing CDFs
        while i < n && a[i] <= x {
            i += 1;
        }
        while j < m && b[j] <= x {
            j += 1;
        }
        let gap = (i as f64 / n as f64 - j as f64 / m as f64).abs();
        statistic = statistic.max(gap);
    }

    let effective = (n * m) as f64 / (n + m) as f64;
    Ok(KsOutcome {
        statistic,
        p_value: kolmogorov_sf(stephens_lambda(effective, statistic)),
    })
}

/// Two-sided one-sample KS test against `cdf`
pub fn ks_1samp<F>(sample: &[f64], cdf: F) -> SimResult<KsOutcome>
where
    F: Fn(f64) -> f64,
{
    let sorted = sorted_copy(sample)?;
    let n = sorted.len() as f64;

    let statistic = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let f = cdf(x);
            let above = (i + 1) as f64 / n - f;
            let below = f - i as f64 / n;
            above.max(below)
        })
        .fold(0.0_f64, f64::max);

    Ok(KsOutcome {
        statistic,
        p_value: kolmogorov_sf(stephens_lambda(n, statistic)),
    })
}

/// One-sample KS test against `N(mean, std_dev)`
pub fn ks_1samp_normal(sample: &[f64], mean: f64, std_dev: f64) -> SimResult<KsOutcome> {
    let normal = Normal::new(mean, std_dev).map_err(|e| {
        SimError::config(format!("cannot build N({mean}, {std_dev}): {e}"))
    })?;
    ks_1samp(sample, |x| normal.cdf(x))
}

/// Survival function of the Kolmogorov distribution, `P(K > λ)`
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }

    let sf = if lambda < 1.18 {
        // Theta-function form converges fast for small λ
        let y = (-std::f64::consts::PI.powi(2) / (8.0 * lambda * lambda)).exp();
        let cdf = (2.0 * std::f64::consts::PI).sqrt() / lambda
            * (y + y.powi(9) + y.powi(25) + y.powi(49));
        1.0 - cdf
    } else {
        let x = (-2.0 * lambda * lambda).exp();
        2.0 * (x - x.powi(4) + x.powi(9) - x.powi(16))
    };

    sf.clamp(0.0, 1.0)
}

fn stephens_lambda(effective_n: f64, statistic: f64) -> f64 {
    let root = effective_n.sqrt();
    (root + 0.12 + 0.11 / root) * statistic
}

fn sorted_copy(sample: &[f64]) -> SimResult<Vec<f64>> {
    if sample.is_empty() {
        return Err(SimError::EmptySeries);
    }
    if let Some(index) = sample.iter().position(|x| x.is_nan()) {
        return Err(SimError::NonFiniteSample { index });
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(sorted)
}
