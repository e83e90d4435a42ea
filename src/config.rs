//! Project layout and toolchain configuration.
//!
//! Everything here is computed once at start-up in the CLI layer and then passed
//! by reference to the commands that need it.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the C++ compiler executable.
pub const CXX_ENV: &str = "EDUSAT_CXX";

/// Environment variable overriding the archiver executable.
pub const AR_ENV: &str = "EDUSAT_AR";

const DEFAULT_CXX: &str = "g++";
const DEFAULT_AR: &str = "ar";

/// File name of the static library produced by `pack`.
///
/// The `edusat` part has to match the solver name reported by the library itself.
pub const TARGET_NAME: &str = "libipasiredusat.a";

/// Paths of the edusat source tree and the IPASIR harness next to it.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ipasir(&self) -> PathBuf {
        self.root.join("ipasir")
    }

    pub fn apps(&self) -> PathBuf {
        self.ipasir().join("app")
    }

    pub fn solvers(&self) -> PathBuf {
        self.ipasir().join("sat")
    }

    pub fn binaries(&self) -> PathBuf {
        self.ipasir().join("bin")
    }

    /// Script that builds a single `<app>-<solver>` binary.
    pub fn mkone(&self) -> PathBuf {
        self.ipasir().join("scripts").join("mkone.sh")
    }

    pub fn sources(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn test_cpp(&self) -> PathBuf {
        self.root.join("test.cpp")
    }

    pub fn test_out(&self) -> PathBuf {
        self.root.join("test.out")
    }

    pub fn target(&self) -> PathBuf {
        self.root.join(TARGET_NAME)
    }

    /// Directory inside the harness that receives the packed library.
    pub fn pack_destination(&self) -> PathBuf {
        self.solvers().join("edusat")
    }

    /// Location of the binary built from `app` and `solver`.
    pub fn binary_path(&self, app: &str, solver: &str) -> PathBuf {
        self.binaries().join(format!("{app}-{solver}"))
    }
}

/// Executables used for the compile and archive stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compiler: String,
    pub archiver: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_CXX.to_string(),
            archiver: DEFAULT_AR.to_string(),
        }
    }
}

impl Toolchain {
    /// Read overrides from `EDUSAT_CXX` and `EDUSAT_AR`, falling back to `g++` and `ar`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            compiler: non_empty_var(CXX_ENV).unwrap_or(defaults.compiler),
            archiver: non_empty_var(AR_ENV).unwrap_or(defaults.archiver),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Everything a command needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct Config {
    pub layout: Layout,
    pub toolchain: Toolchain,
    /// Display name of the running executable, used in the banner.
    pub script_name: String,
}

impl Config {
    pub fn new(layout: Layout, toolchain: Toolchain, script_name: impl Into<String>) -> Self {
        Self {
            layout,
            toolchain,
            script_name: script_name.into(),
        }
    }
}

/// Base name of the executable as it was invoked.
pub fn script_name_from(argv0: Option<&str>) -> String {
    argv0
        .and_then(|a| Path::new(a).file_name())
        .map_or_else(
            || env!("CARGO_PKG_NAME").to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths_are_rooted() {
        let layout = Layout::new("/work");
        assert_eq!(layout.apps(), PathBuf::from("/work/ipasir/app"));
        assert_eq!(layout.solvers(), PathBuf::from("/work/ipasir/sat"));
        assert_eq!(layout.mkone(), PathBuf::from("/work/ipasir/scripts/mkone.sh"));
        assert_eq!(layout.target(), PathBuf::from("/work/libipasiredusat.a"));
        assert_eq!(
            layout.pack_destination(),
            PathBuf::from("/work/ipasir/sat/edusat")
        );
    }

    #[test]
    fn test_binary_path_joins_app_and_solver() {
        let layout = Layout::new("/work");
        assert_eq!(
            layout.binary_path("genipamax", "minisat"),
            PathBuf::from("/work/ipasir/bin/genipamax-minisat")
        );
    }

    #[test]
    fn test_default_toolchain() {
        let tc = Toolchain::default();
        assert_eq!(tc.compiler, "g++");
        assert_eq!(tc.archiver, "ar");
    }

    #[test]
    fn test_script_name_strips_directories() {
        assert_eq!(
            script_name_from(Some("/usr/local/bin/edusat-build")),
            "edusat-build"
        );
        assert_eq!(script_name_from(Some("build")), "build");
        assert_eq!(script_name_from(None), env!("CARGO_PKG_NAME"));
    }
}
