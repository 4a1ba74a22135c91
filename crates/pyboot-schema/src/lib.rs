//! Shared types for the pyboot provisioning pipeline.
//!
//! Everything here is plain data: versions, installer candidates,
//! runtime handles and the package-index mirror settings. The logic that
//! produces and consumes them lives in `pyboot-core`.

pub mod arch;
pub mod mirror;
pub mod types;
pub mod version;

// Re-exports
pub use arch::*;
pub use mirror::{MirrorConfig, MirrorConfigError};
pub use types::*;
pub use version::{RuntimeVersion, VersionError};
