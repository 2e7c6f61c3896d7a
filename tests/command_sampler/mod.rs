use std::time::Duration;

use dr_sampler::AsyncSampler;
use dr_sampler::CommandProbe;
use dr_sampler::Error;
use dr_sampler::ProbeError;
use dr_sampler::Sampler;

use crate::common::counter_probe;
use crate::common::enable_logger;
use crate::common::read_counter;

#[test]
fn sampler_waits_for_command_output() {
    enable_logger();
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("replicas");

    let mut sampler = Sampler::new(
        Duration::from_secs(5),
        Duration::from_millis(20),
        counter_probe(&state),
    )
    .unwrap();

    sampler.wait_for_func_value("3".to_string()).unwrap();
    assert_eq!(sampler.iterations(), 3);
    assert_eq!(read_counter(&state), 3);
}

#[test]
fn parsed_samples_match_numeric_targets() {
    let dir = tempfile::tempdir().unwrap();
    let probe = counter_probe(&dir.path().join("replicas"));

    let mut sampler = Sampler::new(
        Duration::from_secs(5),
        Duration::from_millis(10),
        || probe.sample_as::<u32>(),
    )
    .unwrap();

    assert!(sampler.wait_for_func_status(4).unwrap());
    assert_eq!(sampler.iterations(), 4);
}

#[test]
fn status_wait_gives_up_without_error() {
    let mut sampler = Sampler::new(
        Duration::from_millis(100),
        Duration::from_millis(30),
        CommandProbe::new("echo", ["Relocating"]),
    )
    .unwrap();

    assert!(!sampler.wait_for_func_status("Relocated".to_string()).unwrap());
    assert!(sampler.iterations() >= 2);
    assert!(sampler.iterations() <= 5);
    assert!(sampler.elapsed() >= Duration::from_millis(100));
}

#[test]
fn value_wait_times_out_with_last_observation() {
    let mut sampler = Sampler::new(
        Duration::from_millis(60),
        Duration::from_millis(20),
        CommandProbe::new("echo", ["1"]),
    )
    .unwrap();

    match sampler.wait_for_func_value("2".to_string()) {
        Err(Error::Timeout(t)) => {
            assert_eq!(t.expected, "\"2\"");
            assert_eq!(t.last_observed, "\"1\"");
            assert_eq!(t.iterations, sampler.iterations());
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[test]
fn failing_command_stops_the_wait_immediately() {
    let mut sampler = Sampler::new(
        Duration::from_secs(30),
        Duration::from_secs(1),
        CommandProbe::new("sh", ["-c", "echo 'context not found' >&2; exit 2"]),
    )
    .unwrap();

    let err = sampler.wait_for_func_status("Deployed".to_string()).unwrap_err();
    assert!(matches!(
        err,
        Error::Probe(ProbeError::CommandFailed { code: Some(2), .. })
    ));
    assert_eq!(sampler.iterations(), 1);
    assert!(sampler.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn async_sampler_waits_for_command_output() {
    let dir = tempfile::tempdir().unwrap();
    let probe = counter_probe(&dir.path().join("replicas"));

    let mut sampler = AsyncSampler::new(Duration::from_secs(5), Duration::from_millis(20), || {
        let probe = probe.clone();
        async move { probe.run_async().await }
    })
    .unwrap();

    sampler.wait_for_func_value("2".to_string()).await.unwrap();
    assert_eq!(sampler.iterations(), 2);
}
