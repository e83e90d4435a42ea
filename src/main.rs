//! # edusat-build
//!
//! Build, test and pack shell for the edusat SAT solver library.
//!
//! ## Usage
//!
//! - Interactive shell: `edusat-build`
//! - One-shot commands: `edusat-build "pack" "bin a1 s2" "run-file a1 s2 i1"`
//! - Another project root: `edusat-build --root ../edusat apps`
//! - Command table as JSON: `edusat-build --inspect`

/// Entry point for the CLI tool.
fn main() {
    edusat_build::cli::run_cli();
}
