use std::path::Path;
use std::process::Child;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Output;
use std::time::Duration;
use std::time::Instant;

use dr_sampler::CommandProbe;
use tracing_subscriber::EnvFilter;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for integration test.");
}

/// Shell snippet that bumps the integer stored in `$0` and prints it.
const COUNTER_SCRIPT: &str =
    r#"n=$(cat "$0" 2>/dev/null || echo 0); n=$((n + 1)); echo "$n" > "$0"; echo "$n""#;

/// Probe printing 1, 2, 3, ... on successive runs, standing in for a replica
/// count that grows while a workload comes back after failover.
pub fn counter_probe(state_file: &Path) -> CommandProbe {
    CommandProbe::new("sh", ["-c".to_string(), COUNTER_SCRIPT.to_string(), path_arg(state_file)])
}

pub fn counter_command(state_file: &Path) -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        COUNTER_SCRIPT.to_string(),
        path_arg(state_file),
    ]
}

pub fn read_counter(state_file: &Path) -> u32 {
    std::fs::read_to_string(state_file)
        .expect("counter file")
        .trim()
        .parse()
        .expect("counter value")
}

/// `dr-wait` invocation with a clean configuration environment.
pub fn dr_wait_command(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dr-wait"));
    for (key, _) in std::env::vars() {
        if key.starts_with("DRWAIT__") {
            cmd.env_remove(&key);
        }
    }
    cmd.env_remove("CONFIG_PATH").env("RUST_LOG", "warn").args(args);
    cmd
}

pub fn dr_wait(args: &[&str]) -> Output {
    dr_wait_command(args).output().expect("spawn dr-wait")
}

/// Polls until `path` exists, e.g. a marker a probe command touches on start.
pub fn wait_for_file(
    path: &Path,
    limit: Duration,
) -> bool {
    let started = Instant::now();
    while started.elapsed() < limit {
        if path.exists() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

/// Sends `signal` (e.g. "TERM", "INT") to the child through `kill(1)`.
pub fn send_signal(
    child: &Child,
    signal: &str,
) {
    let status = Command::new("kill")
        .arg(format!("-{signal}"))
        .arg(child.id().to_string())
        .status()
        .expect("run kill");
    assert!(status.success(), "kill -{signal} failed");
}

/// Waits for the child to exit; kills it and returns `None` past `limit`.
pub fn wait_with_limit(
    child: &mut Child,
    limit: Duration,
) -> Option<ExitStatus> {
    let started = Instant::now();
    while started.elapsed() < limit {
        if let Some(status) = child.try_wait().expect("poll dr-wait") {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    let _ = child.wait();
    None
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
