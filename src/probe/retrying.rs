use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tokio::time::Instant;
use tracing::warn;

use super::Probe;
use crate::BackoffPolicy;
use crate::Clock;
use crate::ProbeError;
use crate::SystemClock;

/// Wraps a probe so transient failures are retried before a sample is
/// reported.
///
/// After the last allowed attempt the inner probe's error is returned
/// unchanged, so the sampler still sees the original failure.
pub struct RetryingProbe<P, C = SystemClock> {
    inner: P,
    policy: BackoffPolicy,
    clock: C,
}

impl<P: Probe> RetryingProbe<P> {
    pub fn new(
        inner: P,
        policy: BackoffPolicy,
    ) -> Self {
        Self::with_clock(inner, policy, SystemClock)
    }
}

impl<P: Probe, C: Clock> RetryingProbe<P, C> {
    pub fn with_clock(
        inner: P,
        policy: BackoffPolicy,
        clock: C,
    ) -> Self {
        Self { inner, policy, clock }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}

impl<P, C> Probe for RetryingProbe<P, C>
where
    P: Probe,
    P::Error: Display,
    C: Clock,
{
    type Output = P::Output;
    type Error = P::Error;

    fn sample(&mut self) -> Result<P::Output, P::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.sample() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if self.policy.exhausted(attempt) {
                        warn!(attempt, error = %e, "probe failed after max retries");
                        return Err(e);
                    }

                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "probe failed, retrying"
                    );
                    self.clock.sleep(delay);
                }
            }
        }
    }
}

/// Runs an async task until it succeeds, bounding every attempt by
/// `policy.timeout_ms` and backing off exponentially between attempts.
///
/// Returns the last error once `policy.max_retries` attempts have failed; an
/// attempt that overran its timeout is reported as
/// [`ProbeError::AttemptTimedOut`].
pub async fn retry_with_backoff<F, Fut, T, E>(
    task: F,
    policy: BackoffPolicy,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<ProbeError> + Display,
{
    retry_until(task, policy, None).await
}

/// [`retry_with_backoff`] that also stops retrying at `deadline`.
///
/// No retry is scheduled whose backoff would end at or past the deadline, so
/// the whole call overruns `deadline` by at most one attempt
/// (`policy.timeout_ms`). The first attempt always runs. `None` means no
/// deadline, which with `max_retries == 0` retries forever.
pub async fn retry_until<F, Fut, T, E>(
    mut task: F,
    policy: BackoffPolicy,
    deadline: Option<Instant>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<ProbeError> + Display,
{
    let attempt_timeout = Duration::from_millis(policy.timeout_ms);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match timeout(attempt_timeout, task()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => E::from(ProbeError::AttemptTimedOut(attempt_timeout)),
        };

        if policy.exhausted(attempt) {
            warn!(attempt, error = %error, "task failed after max retries");
            return Err(error);
        }

        let delay = policy.delay_after(attempt);
        if let Some(deadline) = deadline {
            let retry_at = Instant::now().checked_add(delay);
            if retry_at.map_or(true, |at| at >= deadline) {
                warn!(attempt, error = %error, "task failed, no time left to retry");
                return Err(error);
            }
        }

        warn!(
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "task failed, retrying"
        );
        sleep(delay).await;
    }
}
