//! The build pipeline: compile, archive, package, plus building and running
//! harness binaries.
//!
//! Every stage reports its own failure and returns `false`; callers stop at
//! the first `false` and skip all later stages, including cleanup that only
//! makes sense after success.

use crate::catalog::CatalogItem;
use crate::config::Config;
use crate::error::CommandError;
use crate::pack;
use crate::toolchain::{self, CompileRequest, Optimization, Output, Std};
use std::io::Write;
use std::path::{self, Path, PathBuf};
use std::process::Command;

/// How chatty the compiled library is at runtime (`EDUSAT_VERBOSE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Verbose,
    VeryVerbose,
}

impl Verbosity {
    pub fn level(self) -> u8 {
        match self {
            Self::Quiet => 0,
            Self::Verbose => 1,
            Self::VeryVerbose => 2,
        }
    }
}

/// Flavour of a library build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProfile {
    pub optimized: bool,
    pub debug: bool,
    pub verbosity: Verbosity,
}

impl BuildProfile {
    pub const RELEASE: Self = Self {
        optimized: true,
        debug: false,
        verbosity: Verbosity::Quiet,
    };

    pub const DEBUG: Self = Self {
        optimized: false,
        debug: true,
        verbosity: Verbosity::Verbose,
    };

    pub const DEBUG_VERBOSE: Self = Self {
        optimized: false,
        debug: true,
        verbosity: Verbosity::VeryVerbose,
    };

    pub fn defines(&self) -> Vec<String> {
        let mut defines = Vec::new();
        if self.optimized {
            defines.push("NDEBUG".to_string());
        }
        defines.push(format!("EDUSAT_VERBOSE={}", self.verbosity.level()));
        if self.debug {
            defines.push("EDUSAT_DEBUG".to_string());
        }
        defines
    }

    /// Object-only compile of the library sources.
    pub fn request(&self, sources: Vec<PathBuf>) -> CompileRequest {
        let optimization = if self.optimized {
            Optimization::O3
        } else {
            Optimization::O0
        };
        let mut request = CompileRequest::new(Output::Object, optimization)
            .sources(sources)
            .std(Std::Cxx17)
            .sanitized(!self.optimized);
        for define in self.defines() {
            request = request.define(define);
        }
        request
    }
}

/// Compile every library source to an object file in the project root.
///
/// # Errors
///
/// Fails only if the source tree cannot be listed or output cannot be written;
/// a failed compile is `Ok(false)`.
pub fn compile_library(
    config: &Config,
    profile: &BuildProfile,
    out: &mut dyn Write,
) -> Result<bool, CommandError> {
    let note = if profile.optimized { "" } else { " (Unoptimized)" };
    writeln!(out, "Compiling edusat... 🛠️{note}")?;
    out.flush()?;

    let layout = &config.layout;
    let sources = toolchain::find(&layout.sources(), "**/*.cpp")?;
    let compiled = toolchain::compile(
        &config.toolchain,
        layout.root(),
        &profile.request(sources),
        out,
    )?;
    if !compiled {
        writeln!(out, "Failed to compile edusat. 💥")?;
    }
    Ok(compiled)
}

/// Build the library, link `test.cpp` against it and run the result.
///
/// # Errors
///
/// Fails if the test binary cannot be started or exits non-zero.
pub fn unit_test(config: &Config, out: &mut dyn Write) -> Result<(), CommandError> {
    if !compile_library(config, &BuildProfile::RELEASE, out)? {
        return Ok(());
    }

    let layout = &config.layout;
    writeln!(out, "Compiling unit tests... 🧪")?;
    out.flush()?;
    let request = CompileRequest::new(Output::Executable(layout.test_out()), Optimization::O0)
        .sources([layout.test_cpp()])
        .debug_info(true)
        .std(Std::Cxx17)
        .sanitized(true)
        .include_objects(true);
    if !toolchain::compile(&config.toolchain, layout.root(), &request, out)? {
        writeln!(out, "Failed to compile unit tests. 💥")?;
        return Ok(());
    }
    toolchain::remove_object_files(layout.root())?;

    writeln!(out, "Running")?;
    out.flush()?;
    let test_out = layout.test_out();
    run_checked(Command::new(&test_out).current_dir(layout.root()), &test_out)
}

/// Build the library with `profile` and install it into the harness.
///
/// # Errors
///
/// Archiving and packaging errors are returned; a failed compile is not an error.
pub fn pack(
    config: &Config,
    profile: &BuildProfile,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    if !compile_library(config, profile, out)? {
        return Ok(());
    }

    let layout = &config.layout;
    let target = layout.target();
    toolchain::static_library(&config.toolchain, layout.root(), &target)?;
    toolchain::remove_object_files(layout.root())?;

    writeln!(out, "Packing edusat... 📦")?;
    let packed = pack::pack(&target, &layout.pack_destination())?;
    tracing::info!(
        tar = %packed.tar.display(),
        makefile = %packed.makefile.display(),
        "installed edusat into the harness"
    );
    writeln!(out, "Done!")?;
    Ok(())
}

/// Build the `<app>-<solver>` binary with the harness script.
///
/// # Errors
///
/// Fails if the script cannot be started. A non-zero exit is `Ok(false)`.
pub fn make_binary(
    config: &Config,
    app: &CatalogItem,
    solver: &CatalogItem,
    out: &mut dyn Write,
) -> Result<bool, CommandError> {
    let layout = &config.layout;
    let script = path::absolute(layout.mkone()).map_err(|e| CommandError::io(layout.mkone(), e))?;
    tracing::debug!(script = %script.display(), app = %app.name, solver = %solver.name, "building binary");
    out.flush()?;

    let status = Command::new(&script)
        .arg(&app.name)
        .arg(&solver.name)
        .current_dir(layout.ipasir())
        .status()
        .map_err(|e| CommandError::spawn(script.display().to_string(), e))?;
    if !status.success() {
        writeln!(out, "Failed to build {}-{}. 💥", app.name, solver.name)?;
    }
    Ok(status.success())
}

/// Run an existing binary. Its exit status is only logged, since IPASIR apps
/// use it to report the answer.
///
/// # Errors
///
/// Fails if the binary cannot be started.
pub fn run_binary(
    config: &Config,
    app: &CatalogItem,
    solver: &CatalogItem,
    args: &[String],
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    let binary = config.layout.binary_path(&app.name, &solver.name);
    out.flush()?;
    let status = Command::new(&binary)
        .args(args)
        .status()
        .map_err(|e| CommandError::spawn(binary.display().to_string(), e))?;
    tracing::debug!(binary = %binary.display(), %status, "binary finished");
    Ok(())
}

/// Run an existing binary on one input file, passed by absolute path.
///
/// # Errors
///
/// Fails if the input path cannot be made absolute or the binary cannot be started.
pub fn run_file(
    config: &Config,
    app: &CatalogItem,
    solver: &CatalogItem,
    input: &CatalogItem,
    out: &mut dyn Write,
) -> Result<(), CommandError> {
    let input = path::absolute(&input.path).map_err(|e| CommandError::io(&input.path, e))?;
    run_binary(
        config,
        app,
        solver,
        &[input.to_string_lossy().into_owned()],
        out,
    )
}

fn run_checked(command: &mut Command, program: &Path) -> Result<(), CommandError> {
    let status = command
        .status()
        .map_err(|e| CommandError::spawn(program.display().to_string(), e))?;
    if status.success() {
        Ok(())
    } else {
        Err(CommandError::Status {
            program: program.display().to_string(),
            status,
        })
    }
}
