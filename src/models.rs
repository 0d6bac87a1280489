use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{SimError, SimResult};

/// Parameters of the alpha-stable distribution used for 1-day returns
/// (S1 parameterisation: stability, skewness, scale, location).
///
/// Fields are private so a value that went through `new` stays valid.
/// Deserialised values are re-checked by the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionParameters {
    alpha: f64,
    beta: f64,
    scale: f64,
    location: f64,
}

impl DistributionParameters {
    pub fn new(alpha: f64, beta: f64, scale: f64, location: f64) -> SimResult<Self> {
        let params = Self {
            alpha,
            beta,
            scale,
            location,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0 && self.alpha <= 2.0) {
            return Err(SimError::InvalidParameter {
                name: "alpha",
                value: self.alpha,
                reason: "stability must lie in (0, 2]",
            });
        }
        if !(self.beta.is_finite() && (-1.0..=1.0).contains(&self.beta)) {
            return Err(SimError::InvalidParameter {
                name: "beta",
                value: self.beta,
                reason: "skewness must lie in [-1, 1]",
            });
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(SimError::InvalidParameter {
                name: "scale",
                value: self.scale,
                reason: "scale must be positive",
            });
        }
        if !self.location.is_finite() {
            return Err(SimError::InvalidParameter {
                name: "location",
                value: self.location,
                reason: "location must be finite",
            });
        }
        Ok(())
    }
}

impl Default for DistributionParameters {
    fn default() -> Self {
        Self {
            alpha: 1.7,
            beta: 0.0,
            scale: 1.0,
            location: 1.0,
        }
    }
}

/// What one trial computes: the `quantile` of overlapping `ndays` returns
/// built from `num_observations` 1-day draws.
///
/// `quantile` is a probability on the 0-1 scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub num_observations: usize,
    pub ndays: usize,
    pub params: DistributionParameters,
    pub quantile: f64,
}

impl SimulationConfig {
    /// Same config with the quantile given on the 0-100 percentile scale.
    pub fn with_quantile_percent(mut self, percent: f64) -> Self {
        self.quantile = percent / 100.0;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.ndays < 1 {
            return Err(SimError::config("ndays must be at least 1"));
        }
        if self.num_observations < self.ndays {
            return Err(SimError::config(format!(
                "num_observations ({}) must be at least ndays ({})",
                self.num_observations, self.ndays
            )));
        }
        validate_quantile(self.quantile)?;
        self.params
            .validate()
            .map_err(|e| SimError::config(format!("distribution parameters: {e}")))
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_observations: 750,
            ndays: 10,
            params: DistributionParameters::default(),
            quantile: 0.01,
        }
    }
}

pub(crate) fn validate_quantile(q: f64) -> SimResult<()> {
    if (0.0..=1.0).contains(&q) {
        Ok(())
    } else {
        Err(SimError::config(format!(
            "quantile {q} must be a probability in [0, 1]"
        )))
    }
}

/// Summary statistics of a percentile sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_5: f64,
    pub percentile_25: f64,
    pub percentile_50: f64, // Median
    pub percentile_75: f64,
    pub percentile_95: f64,
}

/// Convergence-check procedure selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceMethod {
    #[serde(rename = "CLT")]
    Clt,
    #[serde(rename = "monitoring")]
    Monitoring,
    #[serde(rename = "test_statistic")]
    TestStatistic,
}

impl FromStr for ConvergenceMethod {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLT" | "clt" => Ok(ConvergenceMethod::Clt),
            "monitoring" => Ok(ConvergenceMethod::Monitoring),
            "test_statistic" => Ok(ConvergenceMethod::TestStatistic),
            other => Err(SimError::config(format!(
                "unknown convergence method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ConvergenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConvergenceMethod::Clt => "CLT",
            ConvergenceMethod::Monitoring => "monitoring",
            ConvergenceMethod::TestStatistic => "test_statistic",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CltSettings {
    /// Outer samples, one mean per sample
    pub samples: usize,
    /// Trials per outer sample
    pub trials: usize,
}

impl Default for CltSettings {
    fn default() -> Self {
        Self {
            samples: 100,
            trials: 15_000,
        }
    }
}

impl CltSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.samples < 1 {
            return Err(SimError::config("CLT samples must be at least 1"));
        }
        if self.trials < 1 {
            return Err(SimError::config("CLT trials must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    pub max_trials: usize,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self { max_trials: 30_000 }
    }
}

impl MonitoringSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.max_trials < 1 {
            return Err(SimError::config("monitoring max_trials must be at least 1"));
        }
        Ok(())
    }
}

/// Stopping rule for the two-sample procedure.
///
/// Sampling continues while `statistic > discrepancy` or
/// `p_value < significance_level`, evaluated every `batch` trials, and never
/// past `max_trials_cap` trials per accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestStatisticSettings {
    pub significance_level: f64,
    pub discrepancy: f64,
    pub batch: usize,
    pub max_trials_cap: usize,
}

impl Default for TestStatisticSettings {
    fn default() -> Self {
        Self {
            significance_level: 0.6,
            discrepancy: 0.01,
            batch: 100,
            max_trials_cap: 200_000,
        }
    }
}

impl TestStatisticSettings {
    pub fn validate(&self) -> SimResult<()> {
        if !(0.0..=1.0).contains(&self.significance_level) {
            return Err(SimError::config(format!(
                "significance_level {} must lie in [0, 1]",
                self.significance_level
            )));
        }
        if !(0.0..=1.0).contains(&self.discrepancy) {
            return Err(SimError::config(format!(
                "discrepancy {} must lie in [0, 1]",
                self.discrepancy
            )));
        }
        if self.batch < 1 {
            return Err(SimError::config("batch must be at least 1"));
        }
        if self.max_trials_cap < 1 {
            return Err(SimError::config("max_trials_cap must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceSettings {
    pub clt: CltSettings,
    pub monitoring: MonitoringSettings,
    pub test_statistic: TestStatisticSettings,
}

/// Outcome of a two-sample (or one-sample) Kolmogorov-Smirnov test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// KS result recorded at a batch boundary of the stopping rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsCheckpoint {
    pub trials: usize,
    pub statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    Converged,
    CapReached,
    Cancelled,
}

/// Means and standard deviations of repeated fixed-size Monte Carlo runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CltRecord {
    pub trials_per_sample: usize,
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
}

/// Running mean of the percentile after each trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringRecord {
    pub running_means: Vec<f64>,
}

impl MonitoringRecord {
    /// Trial counts matching `running_means`, starting at 1.
    pub fn trial_axis(&self) -> impl Iterator<Item = usize> + '_ {
        1..=self.running_means.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestStatisticRecord {
    /// Accumulator A followed by accumulator B
    pub percentiles: Vec<f64>,
    /// Trials drawn per accumulator
    pub trials: usize,
    pub statistic: f64,
    pub p_value: f64,
    pub converged: bool,
    pub stop_reason: StopReason,
    pub checkpoints: Vec<KsCheckpoint>,
}

impl TestStatisticRecord {
    /// Turn a non-converged record into `SimulationDidNotConverge`.
    pub fn into_converged(self) -> SimResult<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(SimError::SimulationDidNotConverge {
                trials: self.trials,
                statistic: self.statistic,
                p_value: self.p_value,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConvergenceRecord {
    Clt(CltRecord),
    Monitoring(MonitoringRecord),
    TestStatistic(TestStatisticRecord),
}

impl ConvergenceRecord {
    pub fn method(&self) -> ConvergenceMethod {
        match self {
            ConvergenceRecord::Clt(_) => ConvergenceMethod::Clt,
            ConvergenceRecord::Monitoring(_) => ConvergenceMethod::Monitoring,
            ConvergenceRecord::TestStatistic(_) => ConvergenceMethod::TestStatistic,
        }
    }
}
