//! Common test helpers shared across integration tests

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)] // Not all helpers are used by every test file

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Helper to get the compiled binary path
pub fn get_binary_path() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_edusat-build") {
        return PathBuf::from(path);
    }

    let mut path = env::current_exe().unwrap();
    path.pop(); // Remove test executable name

    // Check if we're in a 'deps' directory (integration tests)
    if path.ends_with("deps") {
        path.pop(); // Go up to debug or release
    }

    path.push("edusat-build");
    path
}

/// Helper to create a temporary directory for tests
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Lay out a project with two apps, two solvers and an empty bin directory.
pub fn create_project(root: &Path) {
    for app in ["genipamax", "genipaessentials"] {
        fs::create_dir_all(root.join("ipasir/app").join(app)).unwrap();
    }
    for solver in ["minisat", "edusat"] {
        fs::create_dir_all(root.join("ipasir/sat").join(solver)).unwrap();
    }
    fs::create_dir_all(root.join("ipasir/bin")).unwrap();
    fs::write(root.join("ipasir/bin/.gitignore"), "*\n").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/solver.cpp"), "int main() {}\n").unwrap();
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn create_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Package version for testing --version flag
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Helper to create a Command with test environment
/// Clears toolchain and log overrides so the user's shell does not leak in
pub fn test_command(binary: &PathBuf) -> Command {
    let mut cmd = Command::new(binary);
    cmd.env_remove("EDUSAT_CXX");
    cmd.env_remove("EDUSAT_AR");
    cmd.env_remove("EDUSAT_LOG");
    cmd
}

/// Run the given batch commands against the project at `root`.
pub fn run_batch(root: &Path, commands: &[&str]) -> Output {
    test_command(&get_binary_path())
        .arg("--root")
        .arg(root)
        .args(commands)
        .output()
        .expect("Failed to execute command")
}

/// Start the interactive shell on `root` and feed it `stdin`.
pub fn run_interactive(root: &Path, stdin: &str) -> Output {
    let mut child = test_command(&get_binary_path())
        .arg("--root")
        .arg(root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().expect("Failed to wait for command")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
