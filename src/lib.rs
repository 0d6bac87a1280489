//! Monte Carlo estimation of a low percentile of overlapping n-day returns
//! built from alpha-stable 1-day returns, plus checks on how many trials
//! the estimate needs.
//!
//! Randomness is always passed in explicitly; seeded runs use
//! `rand_chacha::ChaCha8Rng` substreams (see [`returns::substream`]).

pub mod convergence;
pub mod errors;
pub mod models;
pub mod monte_carlo;
pub mod returns;
pub mod stable;
pub mod two_sample;

pub use convergence::{
    check_monte_carlo_trials, clt, monitoring, test_statistic, test_statistic_seeded,
};
pub use errors::{SimError, SimResult};
pub use models::{
    CltRecord, CltSettings, ConvergenceMethod, ConvergenceRecord, ConvergenceSettings,
    DistributionParameters, KsCheckpoint, KsOutcome, MonitoringRecord, MonitoringSettings,
    SampleStats, SimulationConfig, StopReason, TestStatisticRecord, TestStatisticSettings,
};
pub use returns::{
    compound, get_percentile, percentile, sample_one_day, substream, PercentileSource,
    ReturnSampler,
};
pub use stable::StableDistribution;
