//! Point the runtime's package manager at the configured index mirror.

use std::path::{Path, PathBuf};

use pyboot_schema::{MirrorConfig, RuntimeHandle};

use crate::config::{BootstrapConfig, HostEnv};
use crate::error::ConfigError;

/// Write (overwriting) the per-user package-manager configuration.
///
/// The file is rendered solely from the index URL, so re-running produces
/// byte-identical output.
///
/// # Errors
///
/// Returns an error if the index URL is invalid, no per-user configuration
/// directory is known, or the file cannot be written.
pub fn configure_index_mirror(
    runtime: &RuntimeHandle,
    config: &BootstrapConfig,
    host: &HostEnv,
) -> Result<(MirrorConfig, PathBuf), ConfigError> {
    let mirror = MirrorConfig::from_index_url(&config.index_url)?;
    let path = host.pip_config_file.clone().ok_or(ConfigError::NoConfigDir)?;

    tracing::debug!(
        "Writing index mirror for {} to {}",
        runtime.invocation_path().display(),
        path.display()
    );
    write_config(&path, &mirror.render())?;
    Ok((mirror, path))
}

fn write_config(path: &Path, content: &str) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, content).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyboot_schema::RuntimeSource;
    use tempfile::TempDir;

    fn runtime() -> RuntimeHandle {
        RuntimeHandle::new("python", RuntimeSource::PreExisting)
    }

    #[test]
    fn test_repeated_runs_are_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let host = HostEnv::isolated(tmp.path());
        let config = BootstrapConfig::default();

        let (_, path) = configure_index_mirror(&runtime(), &config, &host).unwrap();
        let first = std::fs::read(&path).unwrap();
        let (_, again) = configure_index_mirror(&runtime(), &config, &host).unwrap();
        let second = std::fs::read(&again).unwrap();

        assert_eq!(path, again);
        assert_eq!(first, second);
        assert_eq!(
            String::from_utf8(first).unwrap(),
            "[global]\nindex-url = https://pypi.tuna.tsinghua.edu.cn/simple\ntrusted-host = pypi.tuna.tsinghua.edu.cn\n"
        );
    }

    #[test]
    fn test_overwrites_instead_of_merging() {
        let tmp = TempDir::new().unwrap();
        let host = HostEnv::isolated(tmp.path());
        let path = host.pip_config_file.clone().unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[global]\ntimeout = 60\n").unwrap();

        configure_index_mirror(&runtime(), &BootstrapConfig::default(), &host).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("timeout"));
    }

    #[test]
    fn test_invalid_index_url() {
        let tmp = TempDir::new().unwrap();
        let host = HostEnv::isolated(tmp.path());
        let config = BootstrapConfig {
            index_url: "pypi.tuna.tsinghua.edu.cn/simple".into(),
            ..BootstrapConfig::default()
        };
        let err = configure_index_mirror(&runtime(), &config, &host).unwrap_err();
        assert!(matches!(err, ConfigError::Mirror(_)));
    }

    #[test]
    fn test_unwritable_location() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let mut host = HostEnv::isolated(tmp.path());
        host.pip_config_file = Some(blocker.join("pip").join("pip.ini"));

        let err = configure_index_mirror(&runtime(), &BootstrapConfig::default(), &host).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
    }
}
