//! Condition polling with a timeout.
//!
//! A [`Sampler`] invokes its probe, hands the sample to the caller, and on the
//! next request either stops (timeout observed) or sleeps and samples again:
//!
//! 1. the first probe call happens immediately, there is no leading sleep;
//! 2. the timeout is checked only after a sample has been handed out, so at
//!    least one call happens even with a zero timeout;
//! 3. a caller that stops iterating after a match never pays for a sleep.
//!
//! A never-matching, zero-duration probe is therefore invoked
//! `floor(timeout / sleep) + 1` times. Probe errors are yielded unchanged and
//! end the session.

mod async_sampler;
mod clock;
pub use async_sampler::*;
pub use clock::*;

use std::fmt::Debug;
use std::iter::FusedIterator;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::probe::Probe;
use crate::Error;
use crate::PollPolicy;
use crate::Result;
use crate::TimeoutExpired;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Another sample will be taken after sleeping
    Running,
    /// Terminal; timeout observed or the probe failed
    Stopped,
}

/// One blocking wait session over a probe.
pub struct Sampler<P, C = SystemClock> {
    timeout: Duration,
    sleep: Duration,
    probe: P,
    clock: C,
    state: SamplerState,
    started_at: Option<Instant>,
    iterations: usize,
}

impl<P: Probe> Sampler<P> {
    pub fn new(
        timeout: Duration,
        sleep: Duration,
        probe: P,
    ) -> Result<Self> {
        Self::with_clock(timeout, sleep, probe, SystemClock)
    }

    pub fn from_policy(
        policy: &PollPolicy,
        probe: P,
    ) -> Result<Self> {
        Self::new(policy.timeout(), policy.sleep(), probe)
    }
}

impl<P: Probe, C: Clock> Sampler<P, C> {
    pub fn with_clock(
        timeout: Duration,
        sleep: Duration,
        probe: P,
        clock: C,
    ) -> Result<Self> {
        validate_timing(sleep)?;
        Ok(Self {
            timeout,
            sleep,
            probe,
            clock,
            state: SamplerState::Running,
            started_at: None,
            iterations: 0,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn sleep(&self) -> Duration {
        self.sleep
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SamplerState::Stopped
    }

    /// Probe invocations performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Time since the first probe invocation.
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|t0| self.clock.now().saturating_duration_since(t0))
            .unwrap_or(Duration::ZERO)
    }

    /// Samples until a value equals `expected`.
    ///
    /// Returns `Ok(false)` when the timeout elapses first; that outcome is not
    /// an error. Probe errors are returned as-is.
    pub fn wait_for_func_status(
        &mut self,
        expected: P::Output,
    ) -> std::result::Result<bool, P::Error>
    where
        P::Output: PartialEq + Debug,
    {
        while let Some(sample) = self.next() {
            let value = sample?;
            if value == expected {
                info!(iterations = self.iterations, ?expected, "sampler matched expected status");
                return Ok(true);
            }
        }

        warn!(
            timeout_ms = self.timeout.as_millis() as u64,
            iterations = self.iterations,
            ?expected,
            "sampler timed out waiting for status"
        );
        Ok(false)
    }

    /// Samples until a value equals `expected`, failing with
    /// [`TimeoutExpired`] when the timeout elapses first.
    pub fn wait_for_func_value(
        &mut self,
        expected: P::Output,
    ) -> std::result::Result<(), P::Error>
    where
        P::Output: PartialEq + Debug,
        P::Error: From<TimeoutExpired>,
    {
        let mut last_observed = None;
        while let Some(sample) = self.next() {
            let value = sample?;
            if value == expected {
                info!(iterations = self.iterations, ?expected, "sampler reached expected value");
                return Ok(());
            }
            last_observed = Some(value);
        }

        let err = timeout_expired(self.timeout, self.iterations, &expected, last_observed.as_ref());
        warn!("{}", err);
        Err(err.into())
    }
}

impl<P: Probe, C: Clock> Iterator for Sampler<P, C> {
    type Item = std::result::Result<P::Output, P::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == SamplerState::Stopped {
            return None;
        }

        match self.started_at {
            None => self.started_at = Some(self.clock.now()),
            Some(started_at) => {
                let elapsed = self.clock.now().saturating_duration_since(started_at);
                if elapsed >= self.timeout {
                    debug!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        iterations = self.iterations,
                        "sampler timeout reached"
                    );
                    self.state = SamplerState::Stopped;
                    return None;
                }
                self.clock.sleep(self.sleep);
            }
        }

        self.iterations += 1;
        debug!(iteration = self.iterations, "invoking probe");
        let sample = self.probe.sample();
        if sample.is_err() {
            self.state = SamplerState::Stopped;
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.state == SamplerState::Stopped {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

impl<P: Probe, C: Clock> FusedIterator for Sampler<P, C> {}

pub(crate) fn validate_timing(sleep: Duration) -> Result<()> {
    if sleep.is_zero() {
        return Err(Error::InvalidPolicy("sleep must be greater than zero".into()));
    }
    Ok(())
}

pub(crate) fn timeout_expired<T: Debug>(
    timeout: Duration,
    iterations: usize,
    expected: &T,
    last_observed: Option<&T>,
) -> TimeoutExpired {
    TimeoutExpired {
        timeout,
        iterations,
        expected: format!("{expected:?}"),
        last_observed: last_observed
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|| "nothing".to_string()),
    }
}
