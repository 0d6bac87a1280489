/// Error types shared by the sampling, Monte Carlo and convergence modules

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

/// Failures surfaced by the simulation core.
///
/// Configuration problems are reported before any sampling starts.
/// `SimulationDidNotConverge` is only produced on request through
/// `TestStatisticRecord::into_converged`; the stopping rule itself returns
/// a record flagged as not converged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid distribution parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("cannot compute a statistic of an empty series")]
    EmptySeries,

    #[error("sample contains a NaN value at index {index}")]
    NonFiniteSample { index: usize },

    #[error(
        "simulation did not converge after {trials} trials \
         (statistic = {statistic}, p-value = {p_value})"
    )]
    SimulationDidNotConverge {
        trials: usize,
        statistic: f64,
        p_value: f64,
    },
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message_names_the_parameter() {
        let err = SimError::InvalidParameter {
            name: "alpha",
            value: 2.5,
            reason: "must lie in (0, 2]",
        };
        let msg = err.to_string();
        assert!(msg.contains("alpha"));
        assert!(msg.contains("2.5"));
    }

    #[test]
    fn test_did_not_converge_message_carries_trials() {
        let err = SimError::SimulationDidNotConverge {
            trials: 1000,
            statistic: 0.4,
            p_value: 0.001,
        };
        assert!(err.to_string().contains("1000 trials"));
    }
}
