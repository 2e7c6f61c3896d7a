//! Probes: the callables a sampler session invokes.
//!
//! Any `FnMut() -> Result<T, E>` is a [`Probe`]. [`BoundProbe`] forwards a
//! stored argument set on every call, [`RetryingProbe`] absorbs transient
//! failures before a sample is reported, and [`CommandProbe`] samples the
//! trimmed stdout of an external program run against an explicit
//! [`ClusterTarget`].

mod command;
mod retrying;
pub use command::*;
pub use retrying::*;

/// A source of samples.
pub trait Probe {
    type Output;
    type Error;

    fn sample(&mut self) -> Result<Self::Output, Self::Error>;
}

impl<F, T, E> Probe for F
where
    F: FnMut() -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn sample(&mut self) -> Result<T, E> {
        self()
    }
}

/// Calls `func(&args)` on every sample.
///
/// The arguments are owned by the probe for the whole session and are never
/// mutated between calls.
#[derive(Debug, Clone)]
pub struct BoundProbe<F, A> {
    func: F,
    args: A,
}

impl<F, A> BoundProbe<F, A> {
    pub fn new(
        func: F,
        args: A,
    ) -> Self {
        Self { func, args }
    }

    pub fn args(&self) -> &A {
        &self.args
    }
}

impl<F, A, T, E> Probe for BoundProbe<F, A>
where
    F: FnMut(&A) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn sample(&mut self) -> Result<T, E> {
        (self.func)(&self.args)
    }
}
