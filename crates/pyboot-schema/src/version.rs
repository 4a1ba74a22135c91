//! Runtime release versions as published by the mirror.
//!
//! Only plain `major.minor.patch` triples are accepted. Pre-release
//! directories (`3.13.0a1/`) and anything else in the listing are not
//! versions as far as the resolver is concerned.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing a [`RuntimeVersion`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The input is not three dot-separated non-negative integers.
    #[error("Not a release version: {0:?}")]
    NotATriple(String),
}

/// An ordered `major.minor.patch` runtime version.
///
/// Ordering is numeric per component, so `3.10.0` sorts above `3.9.18`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuntimeVersion(semver::Version);

impl RuntimeVersion {
    /// Build a version from its three components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Major component.
    pub fn major(&self) -> u64 {
        self.0.major
    }

    /// Minor component.
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    /// Patch component.
    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Compact `major` + `minor` form used by conventional install
    /// directories, e.g. `312` for `3.12.1`.
    pub fn install_dir_suffix(&self) -> String {
        format!("{}{}", self.0.major, self.0.minor)
    }
}

impl Ord for RuntimeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for RuntimeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for RuntimeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3
            || parts
                .iter()
                .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(VersionError::NotATriple(s.to_string()));
        }

        let mut nums = [0u64; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| VersionError::NotATriple(s.to_string()))?;
        }
        Ok(Self::new(nums[0], nums[1], nums[2]))
    }
}

impl TryFrom<String> for RuntimeVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RuntimeVersion> for String {
    fn from(value: RuntimeVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0.major, self.0.minor, self.0.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexicographic() {
        let a: RuntimeVersion = "3.10.0".parse().unwrap();
        let b: RuntimeVersion = "3.9.18".parse().unwrap();
        assert!(a > b);

        let c: RuntimeVersion = "3.12.10".parse().unwrap();
        let d: RuntimeVersion = "3.12.9".parse().unwrap();
        assert!(c > d);
    }

    #[test]
    fn test_rejects_non_triples() {
        for bad in ["3.12", "3.12.1.4", "3.13.0a1", "", "3..1", "v3.12.1", "3.12.-1"] {
            assert!(bad.parse::<RuntimeVersion>().is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_install_dir_suffix() {
        let v = RuntimeVersion::new(3, 12, 1);
        assert_eq!(v.install_dir_suffix(), "312");
        assert_eq!(v.to_string(), "3.12.1");
    }
}
