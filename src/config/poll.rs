use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_POLICY;
use crate::constants::DRPC_PHASE_POLICY;
use crate::constants::HUB_RECOVERY_POLICY;
use crate::constants::MIRRORING_POLICY;
use crate::constants::REPLICA_COUNT_POLICY;
use crate::Error;
use crate::Result;

/// Timing of one sampler session
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum wall-clock time to keep sampling (unit: milliseconds)
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,

    /// Pause between two probe invocations (unit: milliseconds, must be > 0)
    #[serde(default = "default_sleep_in_ms")]
    pub sleep_in_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout_in_ms: default_timeout_in_ms(),
            sleep_in_ms: default_sleep_in_ms(),
        }
    }
}

impl PollPolicy {
    /// Durations beyond `u64::MAX` milliseconds saturate.
    pub fn new(
        timeout: Duration,
        sleep: Duration,
    ) -> Self {
        Self {
            timeout_in_ms: saturating_millis(timeout),
            sleep_in_ms: saturating_millis(sleep),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_ms)
    }

    pub fn sleep(&self) -> Duration {
        Duration::from_millis(self.sleep_in_ms)
    }

    /// Probe invocations of a never-matching, zero-cost probe.
    pub fn max_samples(&self) -> u64 {
        if self.sleep_in_ms == 0 {
            return 1;
        }
        self.timeout_in_ms.div_ceil(self.sleep_in_ms).saturating_add(1)
    }

    pub fn validate(
        &self,
        name: &str,
    ) -> Result<()> {
        if self.sleep_in_ms == 0 {
            return Err(Error::Config(ConfigError::Message(format!(
                "polling.{name}.sleep_in_ms must be greater than 0"
            ))));
        }
        Ok(())
    }
}

/// Poll policies by the kind of cluster transition being awaited
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WaitPolicies {
    /// Fallback for waits without a dedicated policy
    #[serde(default)]
    pub default: PollPolicy,

    /// DRPlacementControl phase transitions (FailedOver, Relocated, Deployed)
    #[serde(default = "default_drpc_phase")]
    pub drpc_phase: PollPolicy,

    /// Pod/replica counts reaching a target after failover or relocate
    #[serde(default = "default_replica_count")]
    pub replica_count: PollPolicy,

    /// Mirroring health and image counts on the managed clusters
    #[serde(default = "default_mirroring")]
    pub mirroring: PollPolicy,

    /// Hub recovery restoring DR resources on a new hub
    #[serde(default = "default_hub_recovery")]
    pub hub_recovery: PollPolicy,
}

impl Default for WaitPolicies {
    fn default() -> Self {
        Self {
            default: PollPolicy::default(),
            drpc_phase: default_drpc_phase(),
            replica_count: default_replica_count(),
            mirroring: default_mirroring(),
            hub_recovery: default_hub_recovery(),
        }
    }
}

impl WaitPolicies {
    /// Looks a policy up by its configuration key.
    pub fn get(
        &self,
        name: &str,
    ) -> Option<PollPolicy> {
        match name {
            DEFAULT_POLICY => Some(self.default),
            DRPC_PHASE_POLICY => Some(self.drpc_phase),
            REPLICA_COUNT_POLICY => Some(self.replica_count),
            MIRRORING_POLICY => Some(self.mirroring),
            HUB_RECOVERY_POLICY => Some(self.hub_recovery),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.default.validate(DEFAULT_POLICY)?;
        self.drpc_phase.validate(DRPC_PHASE_POLICY)?;
        self.replica_count.validate(REPLICA_COUNT_POLICY)?;
        self.mirroring.validate(MIRRORING_POLICY)?;
        self.hub_recovery.validate(HUB_RECOVERY_POLICY)?;
        Ok(())
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_timeout_in_ms() -> u64 {
    300_000
}
fn default_sleep_in_ms() -> u64 {
    5_000
}
fn default_drpc_phase() -> PollPolicy {
    PollPolicy {
        timeout_in_ms: 720_000,
        sleep_in_ms: 5_000,
    }
}
fn default_replica_count() -> PollPolicy {
    PollPolicy {
        timeout_in_ms: 600_000,
        sleep_in_ms: 5_000,
    }
}
fn default_mirroring() -> PollPolicy {
    PollPolicy {
        timeout_in_ms: 900_000,
        sleep_in_ms: 10_000,
    }
}
fn default_hub_recovery() -> PollPolicy {
    PollPolicy {
        timeout_in_ms: 1_800_000,
        sleep_in_ms: 30_000,
    }
}
