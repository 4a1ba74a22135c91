//! Privilege gate: make sure system-wide installs run with administrative
//! rights, relaunching ourselves elevated when they are missing.
//!
//! The gate never exits the process. It returns an [`ElevationResult`] and
//! the caller decides to stop on `RelaunchRequested`.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::HostEnv;

/// Set in the environment of an elevated relaunch so it does not try again.
pub const ELEVATED_MARKER_ENV: &str = "PYBOOT_ELEVATED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElevationResult {
    /// Already running with administrative rights; carry on.
    AlreadyElevated,
    /// An elevated copy was started; this process must stop with `exit_code`.
    RelaunchRequested { exit_code: i32 },
    /// Elevation was refused or could not be requested.
    Denied(String),
}

/// Host elevation mechanism.
pub trait Elevation: Send + Sync {
    fn is_elevated(&self) -> bool;

    /// Start `exe args...` with elevated rights. Returns the status this
    /// process should exit with after handing off.
    ///
    /// # Errors
    ///
    /// Returns an error if the request was declined or could not be made.
    fn relaunch_elevated(&self, exe: &Path, args: &[OsString]) -> io::Result<i32>;
}

/// Decide whether the pipeline may continue in this process.
pub fn ensure_elevated(elevation: &dyn Elevation, host: &HostEnv) -> ElevationResult {
    if elevation.is_elevated() {
        return ElevationResult::AlreadyElevated;
    }

    if host.relaunched {
        return ElevationResult::Denied(
            "relaunched process still lacks administrative rights".to_string(),
        );
    }

    tracing::info!("Requesting elevation for {}", host.self_exe.display());
    match elevation.relaunch_elevated(&host.self_exe, &host.self_args) {
        Ok(exit_code) => ElevationResult::RelaunchRequested { exit_code },
        Err(e) => ElevationResult::Denied(e.to_string()),
    }
}

/// Elevation through the host's standard mechanism: UAC (`Start-Process
/// -Verb RunAs`) on Windows, `sudo` elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemElevation;

impl Elevation for SystemElevation {
    fn is_elevated(&self) -> bool {
        if cfg!(windows) {
            // `net session` needs an administrator token and fails otherwise.
            Command::new("net")
                .arg("session")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|s| s.success())
        } else {
            Command::new("id")
                .arg("-u")
                .output()
                .is_ok_and(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "0")
        }
    }

    fn relaunch_elevated(&self, exe: &Path, args: &[OsString]) -> io::Result<i32> {
        if cfg!(windows) {
            let script = runas_script(exe, args);
            let status = Command::new("powershell")
                .args(["-NoProfile", "-NonInteractive", "-Command", &script])
                .env(ELEVATED_MARKER_ENV, "1")
                .status()?;
            if !status.success() {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "the elevation request was declined",
                ));
            }
            // The elevated copy runs on in its own console.
            Ok(0)
        } else {
            let status = Command::new("sudo")
                .arg("-E")
                .arg("--")
                .arg(exe)
                .args(args)
                .env(ELEVATED_MARKER_ENV, "1")
                .status()?;
            Ok(status.code().unwrap_or(1))
        }
    }
}

/// PowerShell single-quoted literal.
fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Build the `Start-Process ... -Verb RunAs` command for `exe args...`.
///
/// Start-Process joins `-ArgumentList` with spaces, so each argument is
/// wrapped in double quotes to survive the round trip.
fn runas_script(exe: &Path, args: &[OsString]) -> String {
    let mut script = format!(
        "Start-Process -FilePath {} -Verb RunAs",
        ps_quote(&exe.to_string_lossy())
    );
    if !args.is_empty() {
        let list: Vec<String> = args
            .iter()
            .map(|a| {
                let escaped = a.to_string_lossy().replace('"', "\\\"");
                ps_quote(&format!("\"{escaped}\""))
            })
            .collect();
        script.push_str(" -ArgumentList ");
        script.push_str(&list.join(","));
    }
    script
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted elevation: records relaunch requests.
    #[derive(Debug)]
    pub(crate) struct FakeElevation {
        pub elevated: bool,
        pub outcome: Result<i32, String>,
        pub probes: Mutex<usize>,
        pub relaunches: Mutex<Vec<(std::path::PathBuf, Vec<OsString>)>>,
    }

    impl FakeElevation {
        pub(crate) fn new(elevated: bool, outcome: Result<i32, String>) -> Self {
            Self {
                elevated,
                outcome,
                probes: Mutex::new(0),
                relaunches: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn touched(&self) -> bool {
            *self.probes.lock().unwrap() > 0 || !self.relaunches.lock().unwrap().is_empty()
        }
    }

    impl Elevation for FakeElevation {
        fn is_elevated(&self) -> bool {
            *self.probes.lock().unwrap() += 1;
            self.elevated
        }

        fn relaunch_elevated(&self, exe: &Path, args: &[OsString]) -> io::Result<i32> {
            self.relaunches
                .lock()
                .unwrap()
                .push((exe.to_path_buf(), args.to_vec()));
            self.outcome
                .clone()
                .map_err(|e| io::Error::new(io::ErrorKind::PermissionDenied, e))
        }
    }

    #[test]
    fn test_elevated_process_continues() {
        let tmp = TempDir::new().unwrap();
        let host = HostEnv::isolated(tmp.path());
        let fake = FakeElevation::new(true, Ok(0));

        assert_eq!(ensure_elevated(&fake, &host), ElevationResult::AlreadyElevated);
        assert!(fake.relaunches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_relaunch_uses_identical_arguments() {
        let tmp = TempDir::new().unwrap();
        let mut host = HostEnv::isolated(tmp.path());
        host.self_args = vec!["--dry-run".into(), "--".into(), "-x".into()];
        let fake = FakeElevation::new(false, Ok(0));

        let result = ensure_elevated(&fake, &host);
        assert_eq!(result, ElevationResult::RelaunchRequested { exit_code: 0 });

        let calls = fake.relaunches.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, host.self_exe);
        assert_eq!(calls[0].1, host.self_args);
    }

    #[test]
    fn test_declined_request_is_denied() {
        let tmp = TempDir::new().unwrap();
        let host = HostEnv::isolated(tmp.path());
        let fake = FakeElevation::new(false, Err("cancelled by user".into()));

        match ensure_elevated(&fake, &host) {
            ElevationResult::Denied(reason) => assert!(reason.contains("cancelled")),
            other => panic!("expected Denied, got {other:?}"),
        }
    }

    #[test]
    fn test_relaunched_process_does_not_loop() {
        let tmp = TempDir::new().unwrap();
        let mut host = HostEnv::isolated(tmp.path());
        host.relaunched = true;
        let fake = FakeElevation::new(false, Ok(0));

        assert!(matches!(ensure_elevated(&fake, &host), ElevationResult::Denied(_)));
        assert!(fake.relaunches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_runas_script_quoting() {
        let script = runas_script(
            Path::new(r"C:\Tools\py boot.exe"),
            &["it's".into(), "a b".into()],
        );
        assert_eq!(
            script,
            r#"Start-Process -FilePath 'C:\Tools\py boot.exe' -Verb RunAs -ArgumentList '"it''s"','"a b"'"#
        );
        assert!(!runas_script(Path::new("x.exe"), &[]).contains("ArgumentList"));
    }
}
