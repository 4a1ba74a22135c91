//! Runtime handles, installer candidates and downloaded artifacts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::version::RuntimeVersion;

/// Where a [`RuntimeHandle`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeSource {
    /// Found on the host before this run.
    PreExisting,
    /// Installed by this run.
    FreshlyInstalled,
}

/// A usable runtime and how to invoke it.
///
/// Immutable once created; lives for one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeHandle {
    invocation_path: PathBuf,
    source: RuntimeSource,
}

impl RuntimeHandle {
    /// Create a handle for the runtime at `invocation_path`.
    pub fn new(invocation_path: impl Into<PathBuf>, source: RuntimeSource) -> Self {
        Self {
            invocation_path: invocation_path.into(),
            source,
        }
    }

    /// Path used to invoke the runtime.
    pub fn invocation_path(&self) -> &Path {
        &self.invocation_path
    }

    /// Whether the runtime was found or installed.
    pub fn source(&self) -> RuntimeSource {
        self.source
    }

    /// Copy of this handle re-tagged with a different source.
    pub fn with_source(&self, source: RuntimeSource) -> Self {
        Self {
            invocation_path: self.invocation_path.clone(),
            source,
        }
    }
}

/// One `(version, architecture)` point of the resolver's search space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCandidate {
    /// Release version.
    pub version: RuntimeVersion,
    /// Architecture tag, `None` for the untagged file name.
    pub arch_tag: Option<&'static str>,
    /// Installer file name, e.g. `python-3.12.1-amd64.exe`.
    pub file_name: String,
    /// Full download URL.
    pub url: String,
}

impl VersionCandidate {
    /// Derive file name and URL for `version` under `mirror_root`.
    ///
    /// # Example
    ///
    /// ```
    /// use pyboot_schema::{RuntimeVersion, VersionCandidate};
    ///
    /// let c = VersionCandidate::new("https://m.example/python/", RuntimeVersion::new(3, 12, 1), Some("amd64"));
    /// assert_eq!(c.file_name, "python-3.12.1-amd64.exe");
    /// assert_eq!(c.url, "https://m.example/python/3.12.1/python-3.12.1-amd64.exe");
    /// ```
    pub fn new(mirror_root: &str, version: RuntimeVersion, arch_tag: Option<&'static str>) -> Self {
        let file_name = match arch_tag {
            Some(tag) => format!("python-{version}-{tag}.exe"),
            None => format!("python-{version}.exe"),
        };
        let url = format!(
            "{}/{version}/{file_name}",
            mirror_root.trim_end_matches('/')
        );
        Self {
            version,
            arch_tag,
            file_name,
            url,
        }
    }
}

/// An installer that downloaded with a non-zero size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    version: RuntimeVersion,
    arch_tag: Option<&'static str>,
    local_path: PathBuf,
    size_bytes: u64,
}

impl DownloadedArtifact {
    /// Wrap a finished download. Returns `None` for an empty file, which is
    /// never a usable artifact.
    pub fn new(
        version: RuntimeVersion,
        arch_tag: Option<&'static str>,
        local_path: PathBuf,
        size_bytes: u64,
    ) -> Option<Self> {
        (size_bytes > 0).then_some(Self {
            version,
            arch_tag,
            local_path,
            size_bytes,
        })
    }

    /// Version this installer provides.
    pub fn version(&self) -> &RuntimeVersion {
        &self.version
    }

    /// Architecture tag of the installer, `None` for the untagged 32-bit build.
    pub fn arch_tag(&self) -> Option<&'static str> {
        self.arch_tag
    }

    /// Directory name the installer uses by default: `Python312` for the
    /// `amd64` build, `Python312-32` for the untagged one.
    ///
    /// # Example
    ///
    /// ```
    /// use pyboot_schema::{DownloadedArtifact, RuntimeVersion};
    /// use std::path::PathBuf;
    ///
    /// let v = RuntimeVersion::new(3, 12, 1);
    /// let x64 = DownloadedArtifact::new(v.clone(), Some("amd64"), PathBuf::from("a.exe"), 1).unwrap();
    /// let x86 = DownloadedArtifact::new(v, None, PathBuf::from("b.exe"), 1).unwrap();
    /// assert_eq!(x64.install_dir_name(), "Python312");
    /// assert_eq!(x86.install_dir_name(), "Python312-32");
    /// ```
    pub fn install_dir_name(&self) -> String {
        let suffix = self.version.install_dir_suffix();
        match self.arch_tag {
            Some(_) => format!("Python{suffix}"),
            None => format!("Python{suffix}-32"),
        }
    }

    /// Where the installer was saved.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Size of the downloaded file, always greater than zero.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// What to do when the package manager exits non-zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyPolicy {
    /// Report the failure and continue to launch (default).
    #[default]
    Warn,
    /// Abort the pipeline.
    Fatal,
}

impl std::str::FromStr for DependencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "fatal" => Ok(Self::Fatal),
            _ => Err(format!("Unknown dependency policy: {s} (expected warn|fatal)")),
        }
    }
}
