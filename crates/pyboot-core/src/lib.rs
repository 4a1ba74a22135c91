pub mod config;
pub mod deps;
pub mod error;
pub mod index_mirror;
pub mod installer;
pub mod io;
pub mod launcher;
pub mod locator;
pub mod paths;
pub mod pipeline;
pub mod privilege;
pub mod process;
pub mod resolver;

pub mod reporter;

pub use config::{BootstrapConfig, HostEnv};
pub use error::{BootstrapError, Stage};
pub use paths::*;
pub use pipeline::{Context, ProvisioningOutcome};
pub use reporter::{NullReporter, Reporter};

/// User Agent string for mirror requests
pub const USER_AGENT: &str = concat!("pyboot/", env!("CARGO_PKG_VERSION"));
