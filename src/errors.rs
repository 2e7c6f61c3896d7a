//! Error hierarchy for polling sessions, probes and configuration.
//!
//! Probe errors produced by caller-supplied probes are never wrapped by the
//! sampler; the types here cover the probes this crate ships and the one
//! exceptional outcome the sampler itself reports: [`TimeoutExpired`].

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A value-seeking wait exhausted its timeout
    #[error(transparent)]
    Timeout(#[from] TimeoutExpired),

    /// Failures raised by the probes shipped with this crate
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Rejected timeout/sleep combination
    #[error("Invalid poll policy: {0}")]
    InvalidPolicy(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Raised by `wait_for_func_value` when no sample matched before the timeout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Timed out after {timeout:?} waiting for {expected} ({iterations} samples, last observed {last_observed})"
)]
pub struct TimeoutExpired {
    /// Configured timeout of the session
    pub timeout: Duration,
    /// Number of probe invocations performed
    pub iterations: usize,
    /// `Debug` rendering of the expected value
    pub expected: String,
    /// `Debug` rendering of the last sample the probe produced
    pub last_observed: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The probe command could not be started
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe command exited unsuccessfully
    #[error("`{program}` exited with {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Output could not be interpreted as a sample
    #[error("Invalid probe output: {0}")]
    InvalidOutput(String),

    /// A single async attempt exceeded its per-attempt timeout
    #[error("Probe attempt timed out after {0:?}")]
    AttemptTimedOut(Duration),
}
