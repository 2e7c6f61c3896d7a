use std::ffi::OsString;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::Output;
use std::str::FromStr;

use tracing::debug;

use super::Probe;
use crate::Error;
use crate::ProbeError;
use crate::Result;

/// Cluster a command probe talks to.
///
/// Passed explicitly to every probe instead of switching a process-wide
/// current context, so waits against different managed clusters and the hub
/// never depend on the order they run in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTarget {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl ClusterTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kubeconfig(
        mut self,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn with_context(
        mut self,
        context: impl Into<String>,
    ) -> Self {
        self.context = Some(context.into());
        self
    }

    /// `--kubeconfig`/`--context` arguments for CLI tools such as `oc`.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(path) = &self.kubeconfig {
            args.push(OsString::from("--kubeconfig"));
            args.push(path.clone().into_os_string());
        }
        if let Some(context) = &self.context {
            args.push(OsString::from("--context"));
            args.push(OsString::from(context));
        }
        args
    }
}

/// Samples the trimmed stdout of an external program.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
    target: ClusterTarget,
}

impl CommandProbe {
    pub fn new<I, S>(
        program: impl Into<String>,
        args: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            target: ClusterTarget::default(),
        }
    }

    pub fn with_target(
        mut self,
        target: ClusterTarget,
    ) -> Self {
        self.target = target;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program, target arguments last.
    pub fn command_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.extend(self.target.args());
        args
    }

    /// Runs the program once, blocking the calling thread.
    pub fn run(&self) -> Result<String> {
        debug!(program = %self.program, args = ?self.command_args(), "running probe command");
        let output = std::process::Command::new(&self.program)
            .args(self.command_args())
            .output()
            .map_err(|source| self.spawn_error(source))?;
        self.interpret(output)
    }

    /// Runs the program once on the tokio runtime.
    pub async fn run_async(&self) -> Result<String> {
        debug!(program = %self.program, args = ?self.command_args(), "running probe command");
        let output = tokio::process::Command::new(&self.program)
            .args(self.command_args())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| self.spawn_error(source))?;
        self.interpret(output)
    }

    /// Runs the program and parses its output, e.g. a replica count.
    pub fn sample_as<T>(&self) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.run()?;
        raw.parse::<T>()
            .map_err(|e| ProbeError::InvalidOutput(format!("`{raw}`: {e}")).into())
    }

    fn spawn_error(
        &self,
        source: std::io::Error,
    ) -> Error {
        ProbeError::Spawn {
            program: self.program.clone(),
            source,
        }
        .into()
    }

    fn interpret(
        &self,
        output: Output,
    ) -> Result<String> {
        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Probe for CommandProbe {
    type Output = String;
    type Error = Error;

    fn sample(&mut self) -> Result<String> {
        self.run()
    }
}
