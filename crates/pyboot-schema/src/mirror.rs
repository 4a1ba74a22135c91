//! Package-index mirror settings and their on-disk rendering.

use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

/// Errors produced when deriving a [`MirrorConfig`] from a URL.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorConfigError {
    /// The URL is not `http://` or `https://`.
    #[error("Invalid index URL {0:?}: must start with http:// or https://")]
    Scheme(String),

    /// The URL has no host component.
    #[error("Invalid index URL {0:?}: missing host")]
    MissingHost(String),

    /// The URL could not be parsed at all.
    #[error("Invalid index URL {url:?}: {reason}")]
    Malformed {
        /// The URL as given.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// The `[global]` package-index settings written for the runtime's
/// package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Value of `index-url`.
    pub index_url: String,
    /// Value of `trusted-host`.
    pub trusted_host: String,
}

impl MirrorConfig {
    /// Build the settings for `index_url`, trusting its host.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or has no host.
    pub fn from_index_url(index_url: &str) -> Result<Self, MirrorConfigError> {
        let parsed = Url::parse(index_url).map_err(|e| match e {
            ParseError::RelativeUrlWithoutBase => MirrorConfigError::Scheme(index_url.to_string()),
            ParseError::EmptyHost => MirrorConfigError::MissingHost(index_url.to_string()),
            other => MirrorConfigError::Malformed {
                url: index_url.to_string(),
                reason: other.to_string(),
            },
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MirrorConfigError::Scheme(index_url.to_string()));
        }
        // IPv6 literals keep their brackets, as the package manager expects.
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MirrorConfigError::MissingHost(index_url.to_string()))?;

        Ok(Self {
            index_url: index_url.to_string(),
            trusted_host: host.to_string(),
        })
    }

    /// Render the configuration file. Output depends only on the two
    /// fields, so repeated runs produce identical bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use pyboot_schema::MirrorConfig;
    ///
    /// let cfg = MirrorConfig::from_index_url("https://pypi.example.cn/simple").unwrap();
    /// assert_eq!(
    ///     cfg.render(),
    ///     "[global]\nindex-url = https://pypi.example.cn/simple\ntrusted-host = pypi.example.cn\n"
    /// );
    /// ```
    pub fn render(&self) -> String {
        format!(
            "[global]\nindex-url = {}\ntrusted-host = {}\n",
            self.index_url, self.trusted_host
        )
    }

    /// Arguments that point a single package-manager invocation at this
    /// mirror, independent of any config file.
    pub fn install_args(&self) -> [&str; 4] {
        ["-i", &self.index_url, "--trusted-host", &self.trusted_host]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_derivation() {
        let cfg = MirrorConfig::from_index_url("http://user@mirror.local:8080/pypi/simple").unwrap();
        assert_eq!(cfg.trusted_host, "mirror.local");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            MirrorConfig::from_index_url("ftp://mirror/simple"),
            Err(MirrorConfigError::Scheme(_))
        ));
        assert!(matches!(
            MirrorConfig::from_index_url("http://"),
            Err(MirrorConfigError::MissingHost(_))
        ));
        assert!(matches!(
            MirrorConfig::from_index_url("pypi.example.org/simple"),
            Err(MirrorConfigError::Scheme(_))
        ));
        assert!(matches!(
            MirrorConfig::from_index_url("http://mirror:notaport/simple"),
            Err(MirrorConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_ipv6_host_keeps_brackets() {
        let cfg = MirrorConfig::from_index_url("http://[::1]:3141/root/pypi/simple").unwrap();
        assert_eq!(cfg.trusted_host, "[::1]");
        assert_eq!(cfg.index_url, "http://[::1]:3141/root/pypi/simple");
        assert!(cfg.render().ends_with("trusted-host = [::1]\n"));
    }

    #[test]
    fn test_render_is_stable() {
        let a = MirrorConfig::from_index_url("https://pypi.tuna.tsinghua.edu.cn/simple").unwrap();
        let b = MirrorConfig::from_index_url("https://pypi.tuna.tsinghua.edu.cn/simple").unwrap();
        assert_eq!(a.render().as_bytes(), b.render().as_bytes());
    }
}
