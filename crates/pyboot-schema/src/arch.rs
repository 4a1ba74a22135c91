//! Host architecture detection.

/// Host CPU width as far as installer selection is concerned.
///
/// The mirror publishes two installer flavours per release: an `amd64`
/// tagged build and an untagged build that targets 32-bit hosts. The host
/// width decides which of the two is tried first.
///
/// # Example
///
/// ```
/// use pyboot_schema::HostArch;
///
/// let tags = HostArch::X64.candidate_tags();
/// assert_eq!(tags, [Some("amd64"), None]);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum HostArch {
    /// 64-bit host (`AMD64` / `ARM64` processors, or a 64-bit build of pyboot)
    #[default]
    X64,
    /// 32-bit host
    X86,
}

/// Architecture tag used in 64-bit installer file names.
pub const AMD64_TAG: &str = "amd64";

impl HostArch {
    /// Detect the host width from the Windows processor variables.
    ///
    /// `PROCESSOR_ARCHITEW6432` is only set for a 32-bit process on a 64-bit
    /// OS and wins over `PROCESSOR_ARCHITECTURE`. With neither present the
    /// pointer width of this build decides.
    pub fn detect(processor_arch: Option<&str>, wow64_arch: Option<&str>) -> Self {
        match wow64_arch.or(processor_arch) {
            Some(value) if value.to_ascii_uppercase().ends_with("64") => Self::X64,
            Some(_) => Self::X86,
            None => Self::from_pointer_width(),
        }
    }

    /// Detect the current host from the process environment.
    pub fn current() -> Self {
        let processor = std::env::var("PROCESSOR_ARCHITECTURE").ok();
        let wow64 = std::env::var("PROCESSOR_ARCHITEW6432").ok();
        Self::detect(processor.as_deref(), wow64.as_deref())
    }

    fn from_pointer_width() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::X64
        } else {
            Self::X86
        }
    }

    /// Returns `true` for a 64-bit host.
    pub fn is_64bit(self) -> bool {
        self == Self::X64
    }

    /// Installer architecture tags in the order they should be attempted.
    ///
    /// `None` is the untagged (generic / 32-bit) file name.
    pub fn candidate_tags(self) -> [Option<&'static str>; 2] {
        match self {
            Self::X64 => [Some(AMD64_TAG), None],
            Self::X86 => [None, Some(AMD64_TAG)],
        }
    }

    /// Convert to string representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "x86",
        }
    }
}

impl std::fmt::Display for HostArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HostArch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x64" | "amd64" | "x86_64" | "arm64" | "aarch64" => Ok(Self::X64),
            "x86" | "i686" | "i386" | "win32" => Ok(Self::X86),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}
