use dirs::home_dir;
use std::path::PathBuf;

/// Returns the pyboot state directory, or None if the user's home cannot be resolved.
pub fn try_pyboot_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("PYBOOT_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".pyboot"))
}

/// Downloaded installers: ~/.pyboot/cache
pub fn cache_path() -> Option<PathBuf> {
    try_pyboot_home().map(|h| h.join("cache"))
}

/// Per-user package-manager configuration file.
///
/// `%APPDATA%\pip\pip.ini` on Windows, `~/.config/pip/pip.conf` elsewhere.
pub fn pip_config_file() -> Option<PathBuf> {
    let file_name = if cfg!(windows) { "pip.ini" } else { "pip.conf" };
    dirs::config_dir().map(|d| d.join("pip").join(file_name))
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}
