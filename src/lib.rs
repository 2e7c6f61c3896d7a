//! Condition polling for disaster-recovery end-to-end suites.
//!
//! A DR workflow (failover, relocate, hub recovery) is driven by issuing
//! operations against managed clusters and then *waiting*: until a
//! DRPlacementControl reports `FailedOver`, until a workload has its replicas
//! back, until mirroring is healthy again. [`Sampler`] is that wait: it calls a
//! [`Probe`] at a fixed interval until the expected sample shows up or the
//! timeout elapses.
//!
//! ```ignore
//! use std::time::Duration;
//! use dr_sampler::{ClusterTarget, CommandProbe, Sampler};
//!
//! let probe = CommandProbe::new(
//!     "oc",
//!     ["get", "drpc", "busybox-drpc", "-n", "busybox", "-o", "jsonpath={.status.phase}"],
//! )
//! .with_target(ClusterTarget::new().with_context("hub"));
//!
//! let mut sampler = Sampler::new(Duration::from_secs(720), Duration::from_secs(5), probe)?;
//! assert!(sampler.wait_for_func_status("FailedOver".to_string())?);
//! ```

mod config;
pub mod constants;
mod errors;
mod probe;
mod sampler;

pub use config::*;
pub use errors::*;
pub use probe::*;
pub use sampler::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
