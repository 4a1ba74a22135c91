//! Stage-tagged errors for the provisioning pipeline

use std::path::PathBuf;

use pyboot_schema::{MirrorConfigError, RuntimeVersion};
use thiserror::Error;

use crate::io::DownloadError;
use crate::process::ProcessError;

/// Pipeline stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Elevation,
    Resolution,
    Install,
    Config,
    Dependency,
    Launch,
}

impl Stage {
    /// Process exit code reported when the pipeline fails at this stage.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Elevation => 10,
            Self::Resolution => 11,
            Self::Install => 12,
            Self::Config => 13,
            Self::Dependency => 14,
            Self::Launch => 15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elevation => "elevation",
            Self::Resolution => "resolution",
            Self::Install => "install",
            Self::Config => "config",
            Self::Dependency => "dependency",
            Self::Launch => "launch",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Could not fetch mirror listing {url}: {source}")]
    Listing {
        url: String,
        #[source]
        source: DownloadError,
    },

    #[error("Could not prepare download directory {path}: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No usable installer found under {mirror} ({tried} candidates tried)")]
    NoUsableInstaller { mirror: String, tried: usize },
}

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Installer exited with code {0}")]
    ExitCode(i32),

    #[error(transparent)]
    Process(ProcessError),

    #[error("Runtime {version} not found post-install")]
    RuntimeNotFound { version: RuntimeVersion },
}

impl From<ProcessError> for InstallError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::ExitCode { code, .. } => Self::ExitCode(code),
            other => Self::Process(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Mirror(#[from] MirrorConfigError),

    #[error("Could not determine home directory. Set PYBOOT_HOME to override.")]
    NoHome,

    #[error("Could not determine the per-user configuration directory")]
    NoConfigDir,
}

/// Which package-manager invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStep {
    UpgradePackageManager,
    InstallManifest,
}

impl std::fmt::Display for DependencyStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpgradePackageManager => f.write_str("package manager upgrade"),
            Self::InstallManifest => f.write_str("manifest install"),
        }
    }
}

#[derive(Error, Debug)]
#[error("{step} failed: {source}")]
pub struct DependencyError {
    pub step: DependencyStep,
    #[source]
    pub source: ProcessError,
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Target not found: {0}")]
    TargetNotFound(PathBuf),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// A fatal pipeline failure.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Elevation denied: {0}")]
    ElevationDenied(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl BootstrapError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::ElevationDenied(_) => Stage::Elevation,
            Self::Resolution(_) => Stage::Resolution,
            Self::Install(_) => Stage::Install,
            Self::Config(_) => Stage::Config,
            Self::Dependency(_) => Stage::Dependency,
            Self::Launch(_) => Stage::Launch,
        }
    }
}
