//! Silent runtime installation.

use std::path::PathBuf;

use pyboot_schema::{DownloadedArtifact, RuntimeHandle, RuntimeSource};

use crate::Reporter;
use crate::config::{BootstrapConfig, HostEnv};
use crate::error::InstallError;
use crate::locator;
use crate::process::{CommandSpec, ProcessRunner, run_checked};

/// Fixed unattended option set: all users, on the system PATH, with the
/// package manager and launcher, without the test suite.
pub const SILENT_INSTALL_ARGS: [&str; 6] = [
    "/quiet",
    "InstallAllUsers=1",
    "PrependPath=1",
    "Include_pip=1",
    "Include_test=0",
    "Include_launcher=1",
];

/// Run the installer and return a handle to the runtime it put on disk.
///
/// # Errors
///
/// Returns [`InstallError::ExitCode`] if the installer exits non-zero, or
/// [`InstallError::RuntimeNotFound`] if neither PATH nor the conventional
/// install directories contain the runtime afterwards.
pub fn install(
    artifact: &DownloadedArtifact,
    config: &BootstrapConfig,
    host: &HostEnv,
    runner: &dyn ProcessRunner,
    reporter: &dyn Reporter,
) -> Result<RuntimeHandle, InstallError> {
    reporter.info(&format!(
        "Installing runtime {} (this can take a few minutes)",
        artifact.version()
    ));

    let spec = CommandSpec::new(artifact.local_path()).args(SILENT_INSTALL_ARGS);
    run_checked(runner, &spec)?;

    if let Some(handle) = locator::locate(&config.runtime_names, host) {
        return Ok(handle.with_source(RuntimeSource::FreshlyInstalled));
    }

    // PATH changes made by the installer are not visible to this process.
    for guess in conventional_install_paths(artifact, host) {
        tracing::debug!("Checking {}", guess.display());
        if guess.is_file() {
            return Ok(RuntimeHandle::new(guess, RuntimeSource::FreshlyInstalled));
        }
    }

    Err(InstallError::RuntimeNotFound {
        version: artifact.version().clone(),
    })
}

/// Default install locations for `artifact`, all-users layout first.
///
/// The `amd64` build installs to `Program Files\PythonXY`. The untagged
/// 32-bit build installs to `PythonXY-32` under `Program Files (x86)` on a
/// 64-bit host and under `Program Files` on a 32-bit one.
pub fn conventional_install_paths(artifact: &DownloadedArtifact, host: &HostEnv) -> Vec<PathBuf> {
    let dir_name = artifact.install_dir_name();
    let all_users_roots = if artifact.arch_tag().is_some() {
        vec![host.program_files.as_ref()]
    } else {
        vec![host.program_files_x86.as_ref(), host.program_files.as_ref()]
    };

    let mut paths: Vec<PathBuf> = all_users_roots
        .into_iter()
        .flatten()
        .map(|root| root.join(&dir_name).join("python.exe"))
        .collect();
    if let Some(local) = &host.local_app_data {
        paths.push(
            local
                .join("Programs")
                .join("Python")
                .join(&dir_name)
                .join("python.exe"),
        );
    }
    paths
}
