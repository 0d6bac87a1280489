/// Checks for whether a Monte Carlo trial count is large enough
/// Three procedures: CLT means, running-mean monitoring and a two-sample
/// KS stopping rule

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::errors::SimResult;
use crate::models::{
    CltRecord, CltSettings, ConvergenceMethod, ConvergenceRecord, ConvergenceSettings,
    KsCheckpoint, KsOutcome, MonitoringRecord, MonitoringSettings, SimulationConfig, StopReason,
    TestStatisticRecord, TestStatisticSettings,
};
use crate::monte_carlo::{self, mean_and_std};
use crate::returns::{substream, PercentileSource, ReturnSampler};
use crate::two_sample::{ks_1samp_normal, ks_2samp};

/// Run one convergence procedure on streams derived from `seed`
pub fn check_monte_carlo_trials(
    method: ConvergenceMethod,
    config: &SimulationConfig,
    settings: &ConvergenceSettings,
    seed: u64,
) -> SimResult<ConvergenceRecord> {
    info!(%method, seed, "checking Monte Carlo trial sufficiency");

    match method {
        ConvergenceMethod::Clt => {
            clt(config, &settings.clt, &mut substream(seed, 0)).map(ConvergenceRecord::Clt)
        }
        ConvergenceMethod::Monitoring => {
            monitoring(config, &settings.monitoring, &mut substream(seed, 0))
                .map(ConvergenceRecord::Monitoring)
        }
        ConvergenceMethod::TestStatistic => {
            test_statistic_seeded(config, &settings.test_statistic, seed, None)
                .map(ConvergenceRecord::TestStatistic)
        }
    }
}

/// Repeat a fixed-size Monte Carlo run `samples` times and keep the mean
/// and standard deviation of each run.
pub fn clt<R: Rng + ?Sized>(
    config: &SimulationConfig,
    settings: &CltSettings,
    rng: &mut R,
) -> SimResult<CltRecord> {
    settings.validate()?;
    config.validate()?;

    let mut means = Vec::with_capacity(settings.samples);
    let mut std_devs = Vec::with_capacity(settings.samples);

    for sample in 0..settings.samples {
        let percentiles = monte_carlo::run(config, settings.trials, &mut *rng)?;
        let (mean, std_dev) = mean_and_std(&percentiles);
        debug!(sample, mean, std_dev, "CLT outer sample");
        means.push(mean);
        std_devs.push(std_dev);
    }

    Ok(CltRecord {
        trials_per_sample: settings.trials,
        means,
        std_devs,
    })
}

impl CltRecord {
    /// KS test of the sample means against a normal fitted to them
    pub fn normality(&self) -> SimResult<KsOutcome> {
        let (mean, std_dev) = mean_and_std(&self.means);
        ks_1samp_normal(&self.means, mean, std_dev)
    }
}

/// Draw trials one at a time and record the running mean after each
pub fn monitoring<R: Rng + ?Sized>(
    config: &SimulationConfig,
    settings: &MonitoringSettings,
    rng: &mut R,
) -> SimResult<MonitoringRecord> {
    settings.validate()?;
    let mut sampler = ReturnSampler::new(config.clone(), &mut *rng)?;

    let mut running_means = Vec::with_capacity(settings.max_trials);
    let mut sum = 0.0;
    for trial in 1..=settings.max_trials {
        sum += sampler.next_percentile()?;
        running_means.push(sum / trial as f64);
    }

    info!(
        trials = settings.max_trials,
        final_mean = running_means.last().copied().unwrap_or(f64::NAN),
        "monitoring finished"
    );
    Ok(MonitoringRecord { running_means })
}

/// Two-sample stopping rule over accumulators A and B on substreams 0 and 1
/// of `seed`.
pub fn test_statistic_seeded(
    config: &SimulationConfig,
    settings: &TestStatisticSettings,
    seed: u64,
    cancel: Option<&AtomicBool>,
) -> SimResult<TestStatisticRecord> {
    let mut first = ReturnSampler::new(config.clone(), substream(seed, 0))?;
    let mut second = ReturnSampler::new(config.clone(), substream(seed, 1))?;
    test_statistic(&mut first, &mut second, settings, cancel)
}

/// Grow two percentile samples one trial at a time until they are
/// indistinguishable under a two-sample KS test.
///
/// Every `batch` trials the test runs on everything drawn so far. Sampling
/// stops once `statistic <= discrepancy` and `p_value >= significance_level`,
/// when `cancel` is set at a batch boundary, or at `max_trials_cap` trials.
/// The cap is always evaluated, even when it is not a batch multiple.
pub fn test_statistic<A, B>(
    first: &mut A,
    second: &mut B,
    settings: &TestStatisticSettings,
    cancel: Option<&AtomicBool>,
) -> SimResult<TestStatisticRecord>
where
    A: PercentileSource + ?Sized,
    B: PercentileSource + ?Sized,
{
    settings.validate()?;

    let cap = settings.max_trials_cap;
    let mut sample_a = Vec::new();
    let mut sample_b = Vec::new();
    let mut checkpoints = Vec::new();
    let mut trials = 0;

    let (stop_reason, latest) = loop {
        sample_a.push(first.next_percentile()?);
        sample_b.push(second.next_percentile()?);
        trials += 1;

        if trials % settings.batch != 0 && trials < cap {
            continue;
        }

        let latest = ks_2samp(&sample_a, &sample_b)?;
        checkpoints.push(KsCheckpoint {
            trials,
            statistic: latest.statistic,
            p_value: latest.p_value,
        });
        debug!(
            statistic = latest.statistic,
            p_value = latest.p_value,
            trials,
            "KS checkpoint"
        );

        if latest.statistic <= settings.discrepancy && latest.p_value >= settings.significance_level
        {
            break (StopReason::Converged, latest);
        }
        if trials >= cap {
            warn!(trials, "simulation failed to converge before the trial cap");
            break (StopReason::CapReached, latest);
        }
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            warn!(trials, "convergence check cancelled");
            break (StopReason::Cancelled, latest);
        }
    };

    info!(
        trials,
        statistic = latest.statistic,
        p_value = latest.p_value,
        ?stop_reason,
        "two-sample stopping rule finished"
    );

    sample_a.extend(sample_b);
    Ok(TestStatisticRecord {
        percentiles: sample_a,
        trials,
        statistic: latest.statistic,
        p_value: latest.p_value,
        converged: stop_reason == StopReason::Converged,
        stop_reason,
        checkpoints,
    })
}
