//! Dependency installation through the runtime's package manager.

use std::ffi::OsStr;
use std::path::Path;

use pyboot_schema::{MirrorConfig, RuntimeHandle};

use crate::Reporter;
use crate::error::{DependencyError, DependencyStep};
use crate::process::{CommandSpec, ProcessRunner, run_checked};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyOutcome {
    /// Both package-manager invocations succeeded.
    Installed,
    /// No manifest; nothing to do.
    NoManifest,
}

/// Upgrade the package manager, then install every manifest entry, both
/// through `mirror`.
///
/// An upgrade failure does not stop the manifest install; the first failure
/// is returned once both have run and is left to the caller to report.
///
/// # Errors
///
/// Returns a [`DependencyError`] if either invocation exits non-zero or
/// cannot be started.
pub fn install_dependencies(
    runtime: &RuntimeHandle,
    manifest: &Path,
    mirror: &MirrorConfig,
    work_dir: &Path,
    runner: &dyn ProcessRunner,
    reporter: &dyn Reporter,
) -> Result<DependencyOutcome, DependencyError> {
    if !manifest.is_file() {
        reporter.warning(&format!(
            "Dependency manifest {} not found, skipping dependency install",
            manifest.display()
        ));
        return Ok(DependencyOutcome::NoManifest);
    }

    let pip = |args: &[&OsStr]| {
        CommandSpec::new(runtime.invocation_path())
            .args(["-m", "pip", "install"])
            .args(args)
            .args(mirror.install_args())
            .current_dir(work_dir)
    };

    let upgrade = pip(&[OsStr::new("--upgrade"), OsStr::new("pip")]);
    let upgrade_result = run_checked(runner, &upgrade).map_err(|source| DependencyError {
        step: DependencyStep::UpgradePackageManager,
        source,
    });
    if let Err(e) = &upgrade_result {
        tracing::debug!("{e}; installing the manifest anyway");
    }

    let install = pip(&[OsStr::new("-r"), manifest.as_os_str()]);
    run_checked(runner, &install).map_err(|source| DependencyError {
        step: DependencyStep::InstallManifest,
        source,
    })?;

    upgrade_result.map(|()| DependencyOutcome::Installed)
}
