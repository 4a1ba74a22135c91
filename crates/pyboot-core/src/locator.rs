//! PATH-based runtime discovery.
//!
//! Absence is an expected answer, not an error: `None` sends the pipeline
//! down the install branch.

use std::path::Path;

use pyboot_schema::{RuntimeHandle, RuntimeSource};

use crate::config::HostEnv;

/// Find the first usable runtime among `names` on the host's search path.
pub fn locate(names: &[String], host: &HostEnv) -> Option<RuntimeHandle> {
    for name in names {
        let Ok(found) = which::which_in_all(name, host.search_path.as_ref(), &host.cwd) else {
            continue;
        };

        for path in found {
            if is_store_alias(&path) {
                tracing::debug!("Skipping store alias {}", path.display());
                continue;
            }
            tracing::debug!("Found runtime {} at {}", name, path.display());
            return Some(RuntimeHandle::new(path, RuntimeSource::PreExisting));
        }
    }
    None
}

/// The OS store redirect stub lives under a `WindowsApps` directory and
/// opens the store instead of running anything.
fn is_store_alias(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|s| s.eq_ignore_ascii_case("WindowsApps"))
    })
}
