//! Run-to-completion subprocess handling.
//!
//! The installer, the package manager and the launched application are all
//! started the same way: spawn, wait, look at the exit code. `ProcessRunner`
//! is the seam; [`run_checked`] turns a non-zero exit into an error for the
//! callers that treat it as failure.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} was terminated without an exit code")]
    Terminated {
        program: String,
        /// Terminating signal, where the platform reports one.
        signal: Option<i32>,
    },

    #[error("{program} exited with code {code}")]
    ExitCode { program: String, code: i32 },
}

/// A fully described subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program name for messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Spawns a process, waits for it, and returns its exit code.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<i32, ProcessError>;
}

/// Runs commands on the host with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<i32, ProcessError> {
        tracing::debug!("Running {spec}");
        let status = spec
            .to_command()
            .status()
            .map_err(|source| ProcessError::Spawn {
                program: spec.program_name(),
                source,
            })?;

        status.code().ok_or_else(|| ProcessError::Terminated {
            program: spec.program_name(),
            signal: exit_signal(status),
        })
    }
}

#[cfg(unix)]
fn exit_signal(status: std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_: std::process::ExitStatus) -> Option<i32> {
    None
}

/// Run to completion and treat any non-zero exit as an error.
pub fn run_checked(runner: &dyn ProcessRunner, spec: &CommandSpec) -> Result<(), ProcessError> {
    match runner.run(spec)? {
        0 => Ok(()),
        code => Err(ProcessError::ExitCode {
            program: spec.program_name(),
            code,
        }),
    }
}
