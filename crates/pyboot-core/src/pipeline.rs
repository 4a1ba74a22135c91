//! Provisioning pipeline
//!
//! ```text
//! [gate?] -> locate --found----------------------------> mirror config -> deps -> launch
//!                   \--absent--> gate -> resolve -> install --/
//! ```
//!
//! Each stage takes the explicit state produced by the one before it. Any
//! fatal error stops the run and is reported with its stage; dependency
//! failures are fatal only under [`DependencyPolicy::Fatal`].

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use pyboot_schema::{DependencyPolicy, MirrorConfig, RuntimeHandle, VersionCandidate};

use crate::Reporter;
use crate::config::{BootstrapConfig, HostEnv};
use crate::error::BootstrapError;
use crate::io::MirrorClient;
use crate::privilege::{Elevation, ElevationResult, ensure_elevated};
use crate::process::ProcessRunner;
use crate::{deps, index_mirror, installer, launcher, locator, resolver};

/// Groups the configuration, host facts and collaborators of one run.
#[derive(Clone)]
pub struct Context {
    pub config: BootstrapConfig,
    pub host: HostEnv,
    pub mirror: Arc<dyn MirrorClient>,
    pub runner: Arc<dyn ProcessRunner>,
    pub elevation: Arc<dyn Elevation>,
    pub reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum ProvisioningOutcome {
    /// The application ran and exited with `exit_code`.
    Launched {
        runtime: RuntimeHandle,
        exit_code: i32,
    },
    /// An elevated copy took over; this process stops here.
    HandedOff { exit_code: i32 },
    /// A stage failed.
    Failed(BootstrapError),
}

impl ProvisioningOutcome {
    /// Exit code for the invoking shell.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Launched { exit_code, .. } | Self::HandedOff { exit_code } => *exit_code,
            Self::Failed(err) => err.stage().exit_code(),
        }
    }
}

/// Drive the whole pipeline to a terminal state.
pub async fn run(ctx: &Context, app_args: &[OsString]) -> ProvisioningOutcome {
    match provision(ctx, app_args).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::debug!("{} stage failed: {err:?}", err.stage());
            ProvisioningOutcome::Failed(err)
        }
    }
}

async fn provision(
    ctx: &Context,
    app_args: &[OsString],
) -> Result<ProvisioningOutcome, BootstrapError> {
    let reporter = ctx.reporter.as_ref();

    if ctx.config.elevate_upfront {
        if let Some(handoff) = privilege_gate(ctx)? {
            return Ok(handoff);
        }
    }

    reporter.section("Locating runtime");
    let runtime = if let Some(found) = locator::locate(&ctx.config.runtime_names, &ctx.host) {
        reporter.success(&format!(
            "Using runtime at {}",
            found.invocation_path().display()
        ));
        found
    } else {
        reporter.info("No runtime found on PATH, installing one");
        if !ctx.config.elevate_upfront {
            if let Some(handoff) = privilege_gate(ctx)? {
                return Ok(handoff);
            }
        }

        reporter.section("Resolving installer");
        let artifact = resolver::resolve_latest_installer(
            ctx.mirror.as_ref(),
            &ctx.config.installer_mirror,
            ctx.host.arch,
            &ctx.host.cache_dir,
            reporter,
        )
        .await?;

        reporter.section("Installing runtime");
        let installed = installer::install(
            &artifact,
            &ctx.config,
            &ctx.host,
            ctx.runner.as_ref(),
            reporter,
        )?;
        if let Err(e) = std::fs::remove_file(artifact.local_path()) {
            tracing::debug!("Leaving {}: {e}", artifact.local_path().display());
        }
        reporter.success(&format!(
            "Installed runtime {} at {}",
            artifact.version(),
            installed.invocation_path().display()
        ));
        installed
    };

    reporter.section("Configuring package index");
    let (mirror, config_path) =
        index_mirror::configure_index_mirror(&runtime, &ctx.config, &ctx.host)?;
    reporter.success(&format!(
        "Index {} written to {}",
        mirror.index_url,
        config_path.display()
    ));

    reporter.section("Installing dependencies");
    let manifest = ctx.host.manifest_path(&ctx.config);
    match deps::install_dependencies(
        &runtime,
        &manifest,
        &mirror,
        &ctx.host.root,
        ctx.runner.as_ref(),
        reporter,
    ) {
        Ok(deps::DependencyOutcome::Installed) => reporter.success("Dependencies installed"),
        Ok(deps::DependencyOutcome::NoManifest) => {}
        Err(err) => match ctx.config.dependency_policy {
            DependencyPolicy::Warn => {
                reporter.warning(&format!("{err}; continuing to launch"));
            }
            DependencyPolicy::Fatal => return Err(err.into()),
        },
    }

    reporter.section("Launching application");
    let target = ctx.host.target_path(&ctx.config);
    if !launcher::has_credentials(&target) {
        reporter.info(&format!(
            "No {} next to {}; the application may ask for credentials",
            launcher::CREDENTIALS_FILE,
            target.display()
        ));
    }
    let exit_code = launcher::launch(
        &runtime,
        &target,
        app_args,
        &ctx.host.root,
        ctx.runner.as_ref(),
    )?;

    Ok(ProvisioningOutcome::Launched { runtime, exit_code })
}

/// `Ok(Some(_))` means this process must stop and report the hand-off.
fn privilege_gate(ctx: &Context) -> Result<Option<ProvisioningOutcome>, BootstrapError> {
    ctx.reporter.section("Checking privileges");
    match ensure_elevated(ctx.elevation.as_ref(), &ctx.host) {
        ElevationResult::AlreadyElevated => Ok(None),
        ElevationResult::RelaunchRequested { exit_code } => {
            ctx.reporter.info("Continuing in an elevated process");
            Ok(Some(ProvisioningOutcome::HandedOff { exit_code }))
        }
        ElevationResult::Denied(reason) => Err(BootstrapError::ElevationDenied(reason)),
    }
}

/// What a run would do, without downloading, installing or writing.
#[derive(Debug)]
pub struct Plan {
    pub runtime: Option<RuntimeHandle>,
    /// Installer candidates in attempt order; empty when a runtime exists.
    pub candidates: Vec<VersionCandidate>,
    pub mirror: MirrorConfig,
    pub mirror_config_path: Option<PathBuf>,
    pub manifest: PathBuf,
    pub manifest_present: bool,
    pub target: PathBuf,
    pub target_present: bool,
}

/// Compute a [`Plan`]. Only the mirror listing is fetched, and only when no
/// runtime is installed.
///
/// # Errors
///
/// Returns an error if the index URL is invalid or the listing cannot be
/// fetched.
pub async fn plan(ctx: &Context) -> Result<Plan, BootstrapError> {
    let mirror = MirrorConfig::from_index_url(&ctx.config.index_url)
        .map_err(|e| BootstrapError::Config(e.into()))?;
    let runtime = locator::locate(&ctx.config.runtime_names, &ctx.host);

    let candidates = if runtime.is_some() {
        Vec::new()
    } else {
        let versions =
            resolver::fetch_versions(ctx.mirror.as_ref(), &ctx.config.installer_mirror).await?;
        resolver::candidates(&ctx.config.installer_mirror, &versions, ctx.host.arch).collect()
    };

    let manifest = ctx.host.manifest_path(&ctx.config);
    let target = ctx.host.target_path(&ctx.config);
    Ok(Plan {
        runtime,
        candidates,
        mirror,
        mirror_config_path: ctx.host.pip_config_file.clone(),
        manifest_present: manifest.is_file(),
        manifest,
        target_present: target.is_file(),
        target,
    })
}
