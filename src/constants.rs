// -
// Configuration sources

/// Prefix of environment variables overriding configuration values
pub(crate) const ENV_PREFIX: &str = "DRWAIT";
/// Separator between nested keys in environment variable names
pub(crate) const ENV_SEPARATOR: &str = "__";
/// Environment variable naming an extra configuration file
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

// -
// Poll policy names

pub const DEFAULT_POLICY: &str = "default";
pub const DRPC_PHASE_POLICY: &str = "drpc_phase";
pub const REPLICA_COUNT_POLICY: &str = "replica_count";
pub const MIRRORING_POLICY: &str = "mirroring";
pub const HUB_RECOVERY_POLICY: &str = "hub_recovery";
