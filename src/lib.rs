//! # edusat-build
//!
//! Build, test and pack shell for the edusat SAT solver library and the IPASIR
//! harness it plugs into.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inspect;
pub mod pack;
pub mod pipeline;
pub mod toolchain;

/// Print an error message and exit with code 1.
pub fn fatal_error(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
