use std::time::Duration;
use std::time::Instant;

#[cfg(test)]
use mockall::automock;

/// Time source of a blocking sampler session.
#[cfg_attr(test, automock)]
pub trait Clock {
    fn now(&self) -> Instant;

    /// Blocks the calling thread for `duration`.
    fn sleep(
        &self,
        duration: Duration,
    );
}

/// Wall clock backed by `std::time` and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(
        &self,
        duration: Duration,
    ) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(
        &self,
        duration: Duration,
    ) {
        (**self).sleep(duration)
    }
}
