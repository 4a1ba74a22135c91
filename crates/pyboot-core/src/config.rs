//! Bootstrap configuration and captured host facts.
//!
//! `BootstrapConfig` is what the operator controls (mirrors, target script,
//! policies); `HostEnv` is what the machine looks like at startup. Both are
//! built once and passed down explicitly so no stage reads ambient process
//! state on its own.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use pyboot_schema::{DependencyPolicy, HostArch};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::privilege::ELEVATED_MARKER_ENV;

/// Optional configuration file looked up in the bootstrap root.
pub const CONFIG_FILE_NAME: &str = "pyboot.toml";

pub const DEFAULT_INSTALLER_MIRROR: &str = "https://mirrors.huaweicloud.com/python/";
pub const DEFAULT_INDEX_URL: &str = "https://pypi.tuna.tsinghua.edu.cn/simple";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Mirror root serving the runtime release directories.
    pub installer_mirror: String,
    /// Package index the runtime's package manager is pointed at.
    pub index_url: String,
    /// Application script, relative to the bootstrap root.
    pub target: PathBuf,
    /// Dependency manifest, relative to the bootstrap root.
    pub manifest: PathBuf,
    pub dependency_policy: DependencyPolicy,
    /// Run the privilege gate before looking for an existing runtime.
    pub elevate_upfront: bool,
    /// Executable names probed on PATH, in order.
    pub runtime_names: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            installer_mirror: DEFAULT_INSTALLER_MIRROR.to_string(),
            index_url: DEFAULT_INDEX_URL.to_string(),
            target: PathBuf::from("main.py"),
            manifest: PathBuf::from("requirements.txt"),
            dependency_policy: DependencyPolicy::default(),
            elevate_upfront: false,
            runtime_names: default_runtime_names(),
        }
    }
}

fn default_runtime_names() -> Vec<String> {
    if cfg!(windows) {
        vec!["python".to_string()]
    } else {
        vec!["python3".to_string(), "python".to_string()]
    }
}

impl BootstrapConfig {
    /// Load `pyboot.toml` from `root`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, root.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Host facts captured once at startup.
#[derive(Debug, Clone)]
pub struct HostEnv {
    /// Directory the target and manifest are resolved against; also the
    /// launched application's working directory.
    pub root: PathBuf,
    /// PATH used for runtime lookup.
    pub search_path: Option<OsString>,
    pub cwd: PathBuf,
    pub arch: HostArch,
    /// Where installers are downloaded.
    pub cache_dir: PathBuf,
    /// Per-user package-manager configuration file.
    pub pip_config_file: Option<PathBuf>,
    /// `%ProgramFiles%` (all-users install location).
    pub program_files: Option<PathBuf>,
    /// `%ProgramFiles(x86)%`, set only on 64-bit Windows.
    pub program_files_x86: Option<PathBuf>,
    /// `%LOCALAPPDATA%` (per-user install location).
    pub local_app_data: Option<PathBuf>,
    /// This executable, for elevated relaunch.
    pub self_exe: PathBuf,
    /// Original command-line arguments, for elevated relaunch.
    pub self_args: Vec<OsString>,
    /// Set when this process is itself an elevated relaunch.
    pub relaunched: bool,
}

impl HostEnv {
    /// Capture the current process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be resolved or the
    /// current directory / executable path are unavailable.
    pub fn capture(root: PathBuf, self_args: Vec<OsString>) -> Result<Self, ConfigError> {
        let cache_dir = crate::paths::cache_path().ok_or(ConfigError::NoHome)?;
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        let self_exe = std::env::current_exe().map_err(|source| ConfigError::Read {
            path: PathBuf::from("<current executable>"),
            source,
        })?;

        Ok(Self {
            root,
            search_path: std::env::var_os("PATH"),
            cwd,
            arch: HostArch::current(),
            cache_dir,
            pip_config_file: crate::paths::pip_config_file(),
            program_files: std::env::var_os("ProgramFiles").map(PathBuf::from),
            program_files_x86: std::env::var_os("ProgramFiles(x86)").map(PathBuf::from),
            local_app_data: std::env::var_os("LOCALAPPDATA").map(PathBuf::from),
            self_exe,
            self_args,
            relaunched: std::env::var_os(ELEVATED_MARKER_ENV).is_some(),
        })
    }

    /// A host rooted entirely under `base`, with nothing on PATH.
    ///
    /// Used by tests and dry runs that must not see the real machine.
    pub fn isolated(base: &Path) -> Self {
        Self {
            root: base.join("app"),
            search_path: Some(OsString::new()),
            cwd: base.to_path_buf(),
            arch: HostArch::X64,
            cache_dir: base.join("cache"),
            pip_config_file: Some(base.join("config").join("pip").join("pip.ini")),
            program_files: Some(base.join("Program Files")),
            program_files_x86: Some(base.join("Program Files (x86)")),
            local_app_data: Some(base.join("AppData").join("Local")),
            self_exe: base.join("pyboot"),
            self_args: Vec::new(),
            relaunched: false,
        }
    }

    pub fn target_path(&self, config: &BootstrapConfig) -> PathBuf {
        self.root.join(&config.target)
    }

    pub fn manifest_path(&self, config: &BootstrapConfig) -> PathBuf {
        self.root.join(&config.manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = BootstrapConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg, BootstrapConfig::default());
        assert_eq!(cfg.dependency_policy, DependencyPolicy::Warn);
    }

    #[test]
    fn test_partial_file_overrides() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "target = \"course_selector.py\"\ndependency_policy = \"fatal\"\n",
        )
        .unwrap();

        let cfg = BootstrapConfig::load(tmp.path()).unwrap();
        assert_eq!(cfg.target, PathBuf::from("course_selector.py"));
        assert_eq!(cfg.dependency_policy, DependencyPolicy::Fatal);
        assert_eq!(cfg.index_url, DEFAULT_INDEX_URL);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "mirorr = \"x\"\n").unwrap();

        let err = BootstrapConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
