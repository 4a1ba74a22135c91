//! Run the target application with the resolved runtime.

use std::ffi::OsString;
use std::path::Path;

use pyboot_schema::RuntimeHandle;

use crate::error::LaunchError;
use crate::process::{CommandSpec, ProcessError, ProcessRunner};

/// Credentials file the launched application reads; produced elsewhere.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Shell convention: a child killed by signal N reports 128 + N.
const SIGNAL_EXIT_BASE: i32 = 128;

/// Invoke `runtime target args...` from `work_dir` and return the child's
/// exit code unchanged.
///
/// An application killed by a signal is still a finished run; it maps to
/// `128 + signal`, or to 1 when the platform reports no signal.
///
/// # Errors
///
/// Returns [`LaunchError::TargetNotFound`] before spawning anything if the
/// target is missing, or a process error if the runtime cannot be started.
pub fn launch(
    runtime: &RuntimeHandle,
    target: &Path,
    args: &[OsString],
    work_dir: &Path,
    runner: &dyn ProcessRunner,
) -> Result<i32, LaunchError> {
    if !target.is_file() {
        return Err(LaunchError::TargetNotFound(target.to_path_buf()));
    }

    let spec = CommandSpec::new(runtime.invocation_path())
        .arg(target)
        .args(args)
        .current_dir(work_dir);

    tracing::info!("Launching {spec}");
    match runner.run(&spec) {
        Ok(code) => Ok(code),
        Err(ProcessError::Terminated { program, signal }) => {
            tracing::debug!("{program} was terminated by signal {signal:?}");
            Ok(signal.map_or(1, |sig| SIGNAL_EXIT_BASE + sig))
        }
        Err(e) => Err(e.into()),
    }
}

/// Whether the credentials file is present next to `target`.
pub fn has_credentials(target: &Path) -> bool {
    target
        .parent()
        .is_some_and(|dir| dir.join(CREDENTIALS_FILE).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::tests::FakeRunner;
    use pyboot_schema::RuntimeSource;
    use tempfile::TempDir;

    #[test]
    fn test_missing_target_spawns_nothing() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new(vec![0]);
        let runtime = RuntimeHandle::new("python", RuntimeSource::PreExisting);

        let err = launch(
            &runtime,
            &tmp.path().join("main.py"),
            &[],
            tmp.path(),
            &runner,
        )
        .unwrap_err();
        assert!(matches!(err, LaunchError::TargetNotFound(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_exit_code_and_args_pass_through() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("main.py");
        std::fs::write(&target, "print('hi')\n").unwrap();
        let runner = FakeRunner::new(vec![42]);
        let runtime = RuntimeHandle::new("/usr/bin/python3", RuntimeSource::FreshlyInstalled);

        let code = launch(
            &runtime,
            &target,
            &["--course".into(), "A B".into()],
            tmp.path(),
            &runner,
        )
        .unwrap();
        assert_eq!(code, 42);

        let call = &runner.calls()[0];
        assert_eq!(call.program, Path::new("/usr/bin/python3"));
        assert_eq!(
            call.args,
            vec![
                target.clone().into_os_string(),
                OsString::from("--course"),
                OsString::from("A B")
            ]
        );
        assert_eq!(call.current_dir.as_deref(), Some(tmp.path()));
    }

    struct KilledRunner(Option<i32>);

    impl ProcessRunner for KilledRunner {
        fn run(&self, spec: &CommandSpec) -> Result<i32, ProcessError> {
            Err(ProcessError::Terminated {
                program: spec.program_name(),
                signal: self.0,
            })
        }
    }

    #[test]
    fn test_killed_application_maps_to_conventional_status() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("main.py");
        std::fs::write(&target, "print('hi')\n").unwrap();
        let runtime = RuntimeHandle::new("python", RuntimeSource::PreExisting);

        let interrupted =
            launch(&runtime, &target, &[], tmp.path(), &KilledRunner(Some(2))).unwrap();
        assert_eq!(interrupted, 130);

        let unknown = launch(&runtime, &target, &[], tmp.path(), &KilledRunner(None)).unwrap();
        assert_eq!(unknown, 1);
    }

    #[test]
    fn test_credentials_presence() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("main.py");
        assert!(!has_credentials(&target));
        std::fs::write(tmp.path().join(CREDENTIALS_FILE), "{}").unwrap();
        assert!(has_credentials(&target));
    }
}
