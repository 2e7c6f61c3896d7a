use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use futures::Stream;
use tokio::time::sleep;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::timeout_expired;
use super::validate_timing;
use super::SamplerState;
use crate::PollPolicy;
use crate::Result;
use crate::TimeoutExpired;

/// [`Sampler`](super::Sampler) for probes returning futures.
///
/// Timing follows the blocking sampler exactly, with `tokio::time` as the
/// clock. An optional [`CancellationToken`] is raced against the sleep
/// between samples and against a probe call still in flight; cancellation
/// ends the sequence the same way the timeout does. A probe future that is
/// already complete when the token fires still has its sample reported, so a
/// pre-cancelled session takes exactly one sample from an immediate probe.
pub struct AsyncSampler<F> {
    timeout: Duration,
    sleep: Duration,
    probe: F,
    cancel: Option<CancellationToken>,
    state: SamplerState,
    started_at: Option<Instant>,
    iterations: usize,
}

impl<F, Fut, T, E> AsyncSampler<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    pub fn new(
        timeout: Duration,
        sleep: Duration,
        probe: F,
    ) -> Result<Self> {
        validate_timing(sleep)?;
        Ok(Self {
            timeout,
            sleep,
            probe,
            cancel: None,
            state: SamplerState::Running,
            started_at: None,
            iterations: 0,
        })
    }

    pub fn from_policy(
        policy: &PollPolicy,
        probe: F,
    ) -> Result<Self> {
        Self::new(policy.timeout(), policy.sleep(), probe)
    }

    pub fn with_cancellation(
        mut self,
        token: CancellationToken,
    ) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t0| t0.elapsed()).unwrap_or(Duration::ZERO)
    }

    /// Takes the next sample, or `None` once the session has stopped.
    pub async fn next_sample(&mut self) -> Option<std::result::Result<T, E>> {
        if self.state == SamplerState::Stopped {
            return None;
        }

        match self.started_at {
            None => self.started_at = Some(Instant::now()),
            Some(started_at) => {
                let elapsed = started_at.elapsed();
                if elapsed >= self.timeout {
                    debug!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        iterations = self.iterations,
                        "async sampler timeout reached"
                    );
                    self.state = SamplerState::Stopped;
                    return None;
                }

                match &self.cancel {
                    Some(token) => {
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => {
                                info!(iterations = self.iterations, "async sampler cancelled");
                                self.state = SamplerState::Stopped;
                                return None;
                            }
                            _ = sleep(self.sleep) => {}
                        }
                    }
                    None => sleep(self.sleep).await,
                }
            }
        }

        self.iterations += 1;
        debug!(iteration = self.iterations, "invoking async probe");
        let pending = (self.probe)();
        let sample = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    sample = pending => sample,
                    _ = token.cancelled() => {
                        info!(iterations = self.iterations, "async sampler cancelled during probe");
                        self.state = SamplerState::Stopped;
                        return None;
                    }
                }
            }
            None => pending.await,
        };
        if sample.is_err() {
            self.state = SamplerState::Stopped;
        }
        Some(sample)
    }

    /// Consumes the session as a stream of samples.
    pub fn into_stream(self) -> impl Stream<Item = std::result::Result<T, E>> {
        futures::stream::unfold(self, |mut sampler| async move {
            let sample = sampler.next_sample().await?;
            Some((sample, sampler))
        })
    }

    /// Async counterpart of
    /// [`Sampler::wait_for_func_status`](super::Sampler::wait_for_func_status).
    pub async fn wait_for_func_status(
        &mut self,
        expected: T,
    ) -> std::result::Result<bool, E>
    where
        T: PartialEq + Debug,
    {
        while let Some(sample) = self.next_sample().await {
            if sample? == expected {
                info!(
                    iterations = self.iterations,
                    ?expected,
                    "async sampler matched expected status"
                );
                return Ok(true);
            }
        }

        warn!(
            timeout_ms = self.timeout.as_millis() as u64,
            iterations = self.iterations,
            ?expected,
            "async sampler gave up waiting for status"
        );
        Ok(false)
    }

    /// Async counterpart of
    /// [`Sampler::wait_for_func_value`](super::Sampler::wait_for_func_value).
    pub async fn wait_for_func_value(
        &mut self,
        expected: T,
    ) -> std::result::Result<(), E>
    where
        T: PartialEq + Debug,
        E: From<TimeoutExpired>,
    {
        let mut last_observed = None;
        while let Some(sample) = self.next_sample().await {
            let value = sample?;
            if value == expected {
                info!(
                    iterations = self.iterations,
                    ?expected,
                    "async sampler reached expected value"
                );
                return Ok(());
            }
            last_observed = Some(value);
        }

        let err = timeout_expired(self.timeout, self.iterations, &expected, last_observed.as_ref());
        warn!("{}", err);
        Err(err.into())
    }
}
