use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::CommandFactory;
use clap::Parser;
use clap::ValueEnum;
use dr_sampler::constants::DEFAULT_POLICY;
use dr_sampler::retry_until;
use dr_sampler::AsyncSampler;
use dr_sampler::BackoffPolicy;
use dr_sampler::ClusterTarget;
use dr_sampler::CommandProbe;
use dr_sampler::Error;
use dr_sampler::LoggingConfig;
use dr_sampler::PollPolicy;
use dr_sampler::Result;
use dr_sampler::SamplerConfig;
use tokio::signal::unix::signal;
use tokio::signal::unix::Signal;
use tokio::signal::unix::SignalKind;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Wait until a command prints the expected value.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Options {
    /// Named poll policy from the configuration
    #[arg(long, short = 'p', default_value = DEFAULT_POLICY)]
    policy: String,

    /// Override the policy timeout
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Override the pause between samples
    #[arg(long, value_name = "SECS")]
    sleep: Option<f64>,

    /// `status`: exit 1 when the value never shows up; `value`: fail with a timeout error
    #[arg(long, value_enum, default_value_t = WaitMode::Status)]
    mode: WaitMode,

    /// Value the command output must equal
    #[arg(long, short = 'e')]
    expect: String,

    /// Attempts per sample before a command failure is reported
    #[arg(long, value_name = "N")]
    retries: Option<usize>,

    #[arg(long, value_name = "FILE")]
    kubeconfig: Option<PathBuf>,

    #[arg(long, value_name = "NAME")]
    context: Option<String>,

    /// Extra configuration file layered over CONFIG_PATH and defaults
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<String>,

    /// Probe command and its arguments
    #[arg(last = true, required = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum WaitMode {
    Status,
    Value,
}

/// Exit status when the wait itself failed, as opposed to a status-mode
/// "not matched" (1).
const EXIT_ERROR: u8 = 2;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let options = Options::parse();
    match run(options).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(options: Options) -> Result<ExitCode> {
    let mut settings = SamplerConfig::new()?;
    if let Some(path) = &options.config {
        settings = settings.with_override_config(path)?;
    }
    let settings = settings.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.logging)?;

    let policy = resolve_policy(&settings, &options)?;
    let backoff = BackoffPolicy {
        max_retries: options.retries.unwrap_or(settings.retry.max_retries),
        ..settings.retry
    };

    let Some((program, args)) = options.command.split_first() else {
        Options::command()
            .error(ErrorKind::MissingRequiredArgument, "no probe command given")
            .exit()
    };
    let target = ClusterTarget {
        kubeconfig: options.kubeconfig.clone(),
        context: options.context.clone(),
    };
    let probe = CommandProbe::new(program, args.iter().cloned()).with_target(target);

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();
    let sigint = signal(SignalKind::interrupt())?;
    let sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(graceful_shutdown(sigint, sigterm, shutdown.clone()));

    info!(
        policy = %options.policy,
        timeout_ms = policy.timeout_in_ms,
        sleep_ms = policy.sleep_in_ms,
        expect = %options.expect,
        "waiting on `{}`",
        options.command.join(" ")
    );

    // retries of one sample stop at the wait's own timeout
    let deadline = Instant::now().checked_add(policy.timeout());
    let mut sampler = AsyncSampler::from_policy(&policy, || {
        let probe = probe.clone();
        async move { retry_until(|| probe.run_async(), backoff, deadline).await }
    })?
    .with_cancellation(shutdown);

    match options.mode {
        WaitMode::Status => {
            let matched = sampler.wait_for_func_status(options.expect.clone()).await?;
            println!("{}", if matched { "matched" } else { "not matched" });
            Ok(if matched {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        WaitMode::Value => {
            sampler.wait_for_func_value(options.expect.clone()).await?;
            println!("matched");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn resolve_policy(
    settings: &SamplerConfig,
    options: &Options,
) -> Result<PollPolicy> {
    let mut policy = settings
        .polling
        .get(&options.policy)
        .ok_or_else(|| {
            Error::InvalidPolicy(format!("unknown poll policy `{}`", options.policy))
        })?;

    if let Some(secs) = options.timeout {
        policy.timeout_in_ms = millis(secs, "timeout")?;
    }
    if let Some(secs) = options.sleep {
        policy.sleep_in_ms = millis(secs, "sleep")?;
    }
    policy.validate(&options.policy)?;
    Ok(policy)
}

/// Converts a `--timeout`/`--sleep` value in seconds to whole milliseconds.
fn millis(
    value: f64,
    flag: &str,
) -> Result<u64> {
    let duration = Duration::try_from_secs_f64(value)
        .map_err(|e| Error::InvalidPolicy(format!("--{flag} {value}: {e}")))?;
    u64::try_from(duration.as_millis())
        .map_err(|_| Error::InvalidPolicy(format!("--{flag} {value}: too large")))
}

/// Cancels the wait on the first SIGINT (Ctrl+C) or SIGTERM.
///
/// Both handlers are registered by the caller before sampling starts, so an
/// early signal cancels the wait instead of killing the process.
async fn graceful_shutdown(
    mut sigint: Signal,
    mut sigterm: Signal,
    token: CancellationToken,
) {
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    token.cancel();
}

pub fn init_observability(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &logging.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let log_file = tracing_appender::rolling::never(log_dir, "dr-wait.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr_layer).init();
            Ok(None)
        }
    }
}
