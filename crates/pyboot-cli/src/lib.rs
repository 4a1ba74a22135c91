//! pyboot - provision a Python runtime and launch an application
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Finds a usable interpreter on PATH, or downloads and silently installs
//! the newest one the installer mirror carries for this host. Then it
//! points the package manager at a nearby index, installs the manifest
//! and runs the target script with any passthrough arguments.
//!
//! # Exit codes
//!
//! The launched application's exit code is passed through unchanged.
//! Provisioning failures use a distinct code per stage:
//!
//! ```text
//! 10  elevation     12  install   14  dependencies
//! 11  resolution    13  config    15  launch
//! ```

pub mod ui;

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use crossterm::style::Stylize;
use pyboot_core::error::ConfigError;
use pyboot_core::io::HttpMirror;
use pyboot_core::pipeline::{self, Plan};
use pyboot_core::privilege::SystemElevation;
use pyboot_core::process::SystemRunner;
use pyboot_core::{
    BootstrapConfig, BootstrapError, Context, HostEnv, ProvisioningOutcome, Reporter,
};
use pyboot_schema::{DependencyPolicy, RuntimeSource};

use crate::ui::ConsoleReporter;

#[derive(Debug, Parser)]
#[command(name = "pyboot")]
#[command(
    author,
    version,
    about = "pyboot - provision a Python runtime and launch an application"
)]
pub struct Cli {
    /// Directory holding the application and its manifest
    /// [default: directory of this executable]
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Mirror root serving runtime installers
    #[arg(long, env = "PYBOOT_INSTALLER_MIRROR", value_name = "URL")]
    pub installer_mirror: Option<String>,

    /// Package index the runtime's package manager should use
    #[arg(long, env = "PYBOOT_INDEX_URL", value_name = "URL")]
    pub index_url: Option<String>,

    /// Application script, relative to the root
    #[arg(long, value_name = "FILE")]
    pub target: Option<PathBuf>,

    /// Dependency manifest, relative to the root
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// What a failed dependency install does: warn or fatal
    #[arg(long, value_name = "POLICY")]
    pub dependency_policy: Option<DependencyPolicy>,

    /// Request administrative rights before looking for a runtime
    #[arg(long)]
    pub elevate: bool,

    /// Show what would happen without downloading, installing or launching
    #[arg(long)]
    pub dry_run: bool,

    /// Debug logging for pyboot
    #[arg(short, long)]
    pub verbose: bool,

    /// Arguments forwarded to the application. Put them after `--`: flags
    /// pyboot also understands (such as -v or --help) are otherwise taken
    /// by pyboot itself
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<OsString>,
}

impl Cli {
    /// Layer flags and environment variables over `config`.
    pub fn apply(&self, mut config: BootstrapConfig) -> BootstrapConfig {
        if let Some(mirror) = &self.installer_mirror {
            config.installer_mirror.clone_from(mirror);
        }
        if let Some(url) = &self.index_url {
            config.index_url.clone_from(url);
        }
        if let Some(target) = &self.target {
            config.target.clone_from(target);
        }
        if let Some(manifest) = &self.manifest {
            config.manifest.clone_from(manifest);
        }
        if let Some(policy) = self.dependency_policy {
            config.dependency_policy = policy;
        }
        config.elevate_upfront |= self.elevate;
        config
    }
}

/// Run pyboot and return the process exit code.
///
/// `raw_args` are the original arguments, replayed on elevated relaunch.
pub async fn run(cli: &Cli, raw_args: Vec<OsString>) -> Result<i32> {
    let reporter = Arc::new(ConsoleReporter::new());

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => default_root()?,
    };

    let (config, host) = match load(cli, root, raw_args) {
        Ok(loaded) => loaded,
        Err(err) => {
            let err = BootstrapError::from(err);
            reporter.error(&format!("{} failed: {err}", err.stage()));
            return Ok(err.stage().exit_code());
        }
    };
    tracing::debug!("Effective configuration: {config:?}");

    let ctx = Context {
        config,
        host,
        mirror: Arc::new(HttpMirror::new()?),
        runner: Arc::new(SystemRunner),
        elevation: Arc::new(SystemElevation),
        reporter: reporter.clone(),
    };

    if cli.dry_run {
        return Ok(match pipeline::plan(&ctx).await {
            Ok(plan) => {
                print_plan(&plan);
                0
            }
            Err(err) => {
                reporter.error(&format!("{} failed: {err}", err.stage()));
                err.stage().exit_code()
            }
        });
    }

    let outcome = pipeline::run(&ctx, &cli.args).await;
    match &outcome {
        ProvisioningOutcome::Failed(err) => {
            reporter.error(&format!("{} failed: {err}", err.stage()));
        }
        ProvisioningOutcome::HandedOff { exit_code } => {
            tracing::debug!("Elevated process finished with {exit_code}");
        }
        ProvisioningOutcome::Launched { .. } => {}
    }
    Ok(outcome.exit_code())
}

/// Defaults, then `pyboot.toml`, then flags and environment.
fn load(
    cli: &Cli,
    root: PathBuf,
    raw_args: Vec<OsString>,
) -> Result<(BootstrapConfig, HostEnv), ConfigError> {
    let config = cli.apply(BootstrapConfig::load(&root)?);
    let host = HostEnv::capture(root, raw_args)?;
    Ok((config, host))
}

fn default_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the pyboot executable")?;
    exe.parent()
        .map(PathBuf::from)
        .context("pyboot executable has no parent directory")
}

fn present(exists: bool) -> String {
    if exists {
        "present".green().to_string()
    } else {
        "missing".red().to_string()
    }
}

fn print_plan(plan: &Plan) {
    let label = |s: &str| format!("  {s:<12}").dark_grey();

    println!("{}", "Plan (dry run)".cyan().bold());
    match &plan.runtime {
        Some(runtime) => {
            let source = match runtime.source() {
                RuntimeSource::PreExisting => "already installed",
                RuntimeSource::FreshlyInstalled => "installed",
            };
            println!(
                "{}{} ({source})",
                label("runtime"),
                runtime.invocation_path().display()
            );
        }
        None => {
            println!("{}none found, would install from the mirror", label("runtime"));
            match plan.candidates.first() {
                Some(first) => {
                    println!("{}{}", label("installer"), first.url);
                    println!(
                        "{}{} candidates, tried newest first",
                        label(""),
                        plan.candidates.len()
                    );
                }
                None => println!("{}{}", label("installer"), "no versions listed".red()),
            }
        }
    }

    println!(
        "{}{} (trusted-host {})",
        label("index"),
        plan.mirror.index_url,
        plan.mirror.trusted_host
    );
    match &plan.mirror_config_path {
        Some(path) => println!("{}{} (overwritten)", label("pip config"), path.display()),
        None => println!("{}{}", label("pip config"), "no config directory".red()),
    }
    println!(
        "{}{} [{}]",
        label("manifest"),
        plan.manifest.display(),
        present(plan.manifest_present)
    );
    println!(
        "{}{} [{}]",
        label("target"),
        plan.target.display(),
        present(plan.target_present)
    );
}
