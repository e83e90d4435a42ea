//! Calling the C++ compiler and the archiver.
//!
//! All artifacts land in the working directory handed to these functions:
//! `-c` compiles leave one `.o` per source there, and the archive stage
//! collects whatever `.o` files it finds.

use crate::config::Toolchain;
use crate::error::CommandError;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimization {
    O0,
    O1,
    O2,
    O3,
}

impl Optimization {
    pub fn flag(self) -> &'static str {
        match self {
            Self::O0 => "-O0",
            Self::O1 => "-O1",
            Self::O2 => "-O2",
            Self::O3 => "-O3",
        }
    }
}

/// Language standard passed with `-std=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Std {
    Cxx17,
}

impl Std {
    pub fn flag(self) -> &'static str {
        match self {
            Self::Cxx17 => "-std=c++17",
        }
    }
}

/// What a compiler invocation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Link everything into an executable at this path.
    Executable(PathBuf),
    /// Stop after compilation, one object per source.
    Object,
}

/// A single compiler invocation.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    sources: Vec<PathBuf>,
    output: Output,
    optimization: Optimization,
    debug_info: bool,
    defines: Vec<String>,
    std: Option<Std>,
    sanitize_address: bool,
    sanitize_undefined: bool,
    no_omit_frame_pointer: bool,
    include_objects: bool,
}

impl CompileRequest {
    pub fn new(output: Output, optimization: Optimization) -> Self {
        Self {
            sources: Vec::new(),
            output,
            optimization,
            debug_info: false,
            defines: Vec::new(),
            std: None,
            sanitize_address: false,
            sanitize_undefined: false,
            no_omit_frame_pointer: false,
            include_objects: false,
        }
    }

    #[must_use]
    pub fn sources(mut self, sources: impl IntoIterator<Item = PathBuf>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Add `-D<define>`.
    #[must_use]
    pub fn define(mut self, define: impl Into<String>) -> Self {
        self.defines.push(define.into());
        self
    }

    #[must_use]
    pub fn std(mut self, std: Std) -> Self {
        self.std = Some(std);
        self
    }

    #[must_use]
    pub fn debug_info(mut self, on: bool) -> Self {
        self.debug_info = on;
        self
    }

    /// Address and undefined-behaviour sanitizers plus frame pointers, all at once.
    #[must_use]
    pub fn sanitized(mut self, on: bool) -> Self {
        self.sanitize_address = on;
        self.sanitize_undefined = on;
        self.no_omit_frame_pointer = on;
        self
    }

    /// Link the `.o` files already present in the working directory.
    #[must_use]
    pub fn include_objects(mut self, on: bool) -> Self {
        self.include_objects = on;
        self
    }

    pub fn includes_objects(&self) -> bool {
        self.include_objects
    }

    /// Compiler arguments, given the objects currently in the working directory.
    pub fn arguments(&self, objects: &[PathBuf]) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![self.optimization.flag().into()];
        if self.debug_info {
            args.push("-g".into());
        }
        args.extend(self.sources.iter().map(|s| s.as_os_str().to_owned()));
        args.extend(self.defines.iter().map(|d| format!("-D{d}").into()));
        if let Some(std) = self.std {
            args.push(std.flag().into());
        }
        if self.sanitize_address {
            args.push("-fsanitize=address".into());
        }
        if self.sanitize_undefined {
            args.push("-fsanitize=undefined".into());
        }
        if self.no_omit_frame_pointer {
            args.push("-fno-omit-frame-pointer".into());
        }
        if self.include_objects {
            args.extend(objects.iter().map(|o| o.as_os_str().to_owned()));
        }
        match &self.output {
            Output::Object => args.push("-c".into()),
            Output::Executable(path) => {
                args.push("-o".into());
                args.push(path.as_os_str().to_owned());
            }
        }
        args
    }
}

/// Run the compiler in `workdir`. Success means exit status 0.
///
/// A compiler that cannot be found or started is reported to `out` and counts
/// as failure.
///
/// # Errors
///
/// Returns `Err` only if writing to `out` fails.
pub fn compile(
    toolchain: &Toolchain,
    workdir: &Path,
    request: &CompileRequest,
    out: &mut dyn Write,
) -> io::Result<bool> {
    if let Err(e) = which::which(&toolchain.compiler) {
        tracing::error!("compiler '{}' not found: {e}", toolchain.compiler);
        writeln!(out, "Compiler '{}' not found: {e}", toolchain.compiler)?;
        return Ok(false);
    }

    let objects = if request.includes_objects() {
        match object_files(workdir) {
            Ok(objects) => objects,
            Err(e) => {
                tracing::error!("{e}");
                writeln!(out, "{e}")?;
                return Ok(false);
            }
        }
    } else {
        Vec::new()
    };

    let args = request.arguments(&objects);
    tracing::debug!(compiler = %toolchain.compiler, ?args, "compiling");

    match Command::new(&toolchain.compiler)
        .args(&args)
        .current_dir(workdir)
        .status()
    {
        Ok(status) => Ok(status.success()),
        Err(e) => {
            tracing::error!("failed to run '{}': {e}", toolchain.compiler);
            writeln!(out, "Failed to run '{}': {e}", toolchain.compiler)?;
            Ok(false)
        }
    }
}

/// Files under `dir` matching `pattern`, sorted.
///
/// # Errors
///
/// Fails if a matched path cannot be read.
pub fn find(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CommandError> {
    let full = format!(
        "{}/{pattern}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let paths = glob::glob(&full)
        .map_err(|e| CommandError::io(dir, io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    let mut found = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => found.push(path),
            Err(e) => return Err(CommandError::io(e.path().to_path_buf(), e.into_error())),
        }
    }
    found.sort();
    Ok(found)
}

/// Object files directly inside `dir`.
///
/// # Errors
///
/// Fails if the directory cannot be listed.
pub fn object_files(dir: &Path) -> Result<Vec<PathBuf>, CommandError> {
    find(dir, "*.o")
}

/// Archive every object file in `workdir` into the static library `out`.
///
/// # Errors
///
/// Fails if the archiver cannot be started or exits non-zero.
pub fn static_library(toolchain: &Toolchain, workdir: &Path, out: &Path) -> Result<(), CommandError> {
    let objects = object_files(workdir)?;
    tracing::debug!(archiver = %toolchain.archiver, out = %out.display(), objects = objects.len(), "archiving");

    let status = Command::new(&toolchain.archiver)
        .arg("r")
        .arg(out)
        .args(&objects)
        .current_dir(workdir)
        .status()
        .map_err(|e| CommandError::spawn(&toolchain.archiver, e))?;

    if !status.success() {
        return Err(CommandError::Status {
            program: toolchain.archiver.clone(),
            status,
        });
    }
    Ok(())
}

/// Delete every object file in `dir`.
///
/// # Errors
///
/// Fails if one of them cannot be removed.
pub fn remove_object_files(dir: &Path) -> Result<(), CommandError> {
    for object in object_files(dir)? {
        fs::remove_file(&object).map_err(|e| CommandError::io(&object, e))?;
    }
    Ok(())
}
