//! End-to-end tests against the built `pyboot` binary.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated pyboot home, config directory and application root.
struct TestContext {
    temp_dir: TempDir,
    app: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let app = temp_dir.path().join("app");
        std::fs::create_dir_all(&app).expect("failed to create app dir");
        Self { temp_dir, app }
    }

    fn bin_dir(&self) -> PathBuf {
        self.temp_dir.path().join("bin")
    }

    fn config_home(&self) -> PathBuf {
        self.temp_dir.path().join("config")
    }

    fn write_app(&self, name: &str, content: &str) {
        std::fs::write(self.app.join(name), content).expect("failed to write app file");
    }

    fn pyboot_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_pyboot");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("PYBOOT_HOME", self.temp_dir.path().join(".pyboot"));
        cmd.env("XDG_CONFIG_HOME", self.config_home());
        cmd.env("PATH", self.bin_dir());
        cmd.env_remove("PYBOOT_INSTALLER_MIRROR");
        cmd.env_remove("PYBOOT_INDEX_URL");
        cmd.env_remove("PYBOOT_ELEVATED");
        cmd.arg("--root").arg(&self.app);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.pyboot_cmd()
            .args(args)
            .output()
            .expect("failed to run pyboot")
    }
}

/// A stand-in runtime: package-manager calls succeed, anything else logs
/// its arguments next to the script and exits with 7.
#[cfg(unix)]
fn fake_runtime(dir: &std::path::Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("python3");
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"-m\" ]; then exit 0; fi\necho \"$@\" > \"{}\"\nexit 7\n",
        dir.join("launched.log").display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn exit_code(output: &Output) -> Option<i32> {
    output.status.code()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_malformed_config_file_is_config_failure() {
    let ctx = TestContext::new();
    ctx.write_app("pyboot.toml", "index_url = [not toml\n");

    let output = ctx.run(&["--dry-run"]);
    assert_eq!(exit_code(&output), Some(13));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pyboot.toml"));
}

#[test]
fn test_invalid_index_url_is_config_failure() {
    let ctx = TestContext::new();
    let output = ctx
        .pyboot_cmd()
        .env("PYBOOT_INDEX_URL", "pypi.example.org/simple")
        .arg("--dry-run")
        .output()
        .expect("failed to run pyboot");
    assert_eq!(exit_code(&output), Some(13));
}

#[cfg(unix)]
#[test]
fn test_dry_run_with_existing_runtime() {
    let ctx = TestContext::new();
    let runtime = fake_runtime(&ctx.bin_dir());
    ctx.write_app("main.py", "print('hello')\n");

    let output = ctx.run(&["--dry-run"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&runtime.display().to_string()));
    assert!(stdout.contains("pypi.tuna.tsinghua.edu.cn"));
    assert!(stdout.contains("missing"));

    // Nothing is written or launched.
    assert!(!ctx.config_home().exists());
    assert!(!ctx.bin_dir().join("launched.log").exists());
}

#[cfg(unix)]
#[test]
fn test_run_passes_exit_code_and_args_through() {
    let ctx = TestContext::new();
    fake_runtime(&ctx.bin_dir());
    ctx.write_app("main.py", "print('hello')\n");
    ctx.write_app("requirements.txt", "requests\n");

    let output = ctx.run(&["--", "--course", "CS101"]);
    assert_eq!(exit_code(&output), Some(7), "{output:?}");

    let launched = std::fs::read_to_string(ctx.bin_dir().join("launched.log")).unwrap();
    assert!(launched.trim_end().ends_with("main.py --course CS101"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_run_writes_index_mirror_config() {
    let ctx = TestContext::new();
    fake_runtime(&ctx.bin_dir());
    ctx.write_app("main.py", "print('hello')\n");

    let output = ctx
        .pyboot_cmd()
        .env("PYBOOT_INDEX_URL", "https://pypi.example.org/simple")
        .output()
        .expect("failed to run pyboot");
    assert_eq!(exit_code(&output), Some(7), "{output:?}");

    let written = std::fs::read_to_string(ctx.config_home().join("pip").join("pip.conf")).unwrap();
    assert_eq!(
        written,
        "[global]\nindex-url = https://pypi.example.org/simple\ntrusted-host = pypi.example.org\n"
    );
}

#[cfg(unix)]
#[test]
fn test_missing_target_is_launch_failure() {
    let ctx = TestContext::new();
    fake_runtime(&ctx.bin_dir());

    let output = ctx.run(&[]);
    assert_eq!(exit_code(&output), Some(15), "{output:?}");
    assert!(!ctx.bin_dir().join("launched.log").exists());
}

#[cfg(unix)]
#[test]
fn test_killed_application_exits_with_signal_status() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    std::fs::create_dir_all(ctx.bin_dir()).unwrap();
    let python = ctx.bin_dir().join("python3");
    std::fs::write(
        &python,
        "#!/bin/sh\nif [ \"$1\" = \"-m\" ]; then exit 0; fi\nkill -TERM $$\n",
    )
    .unwrap();
    std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
    ctx.write_app("main.py", "print('hello')\n");

    let output = ctx.run(&[]);
    assert_eq!(exit_code(&output), Some(143), "{output:?}");
}
