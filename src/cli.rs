//! CLI module containing the main entry point logic.

use crate::config::{self, Config, Layout, Toolchain};
use crate::{commands, dispatch, inspect};
use clap::Parser as ClapParser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding a `tracing` filter, e.g. `EDUSAT_LOG=debug`.
pub const LOG_ENV: &str = "EDUSAT_LOG";

/// CLI arguments for the edusat build shell.
#[derive(ClapParser, Debug)]
#[command(name = "edusat-build")]
#[command(version = PKG_VERSION)]
#[command(about = "Build, test and pack edusat for the IPASIR harness", long_about = None)]
struct Cli {
    /// Commands to run instead of the interactive shell, one per argument (e.g. "bin a1 s2")
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    commands: Vec<String>,

    /// Project root containing `src/`, `test.cpp` and `ipasir/` (alias: --working-dir)
    #[arg(long = "root", alias = "working-dir", value_name = "PATH")]
    root: Option<PathBuf>,

    /// Print the command table as JSON
    #[arg(long)]
    inspect: bool,

    /// Log compiler, archiver and script invocations to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("edusat_build=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Leave the interactive shell cleanly on Ctrl+C.
fn install_interrupt_handler() {
    let installed = ctrlc::set_handler(|| {
        println!();
        println!("Interrupted.");
        std::process::exit(0);
    });
    if let Err(e) = installed {
        tracing::warn!("could not install Ctrl+C handler: {e}");
    }
}

/// Main CLI logic.
pub fn run_cli() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let table = commands::table();

    // Handle --inspect flag
    if cli.inspect {
        inspect::print_inspect(&table);
        return;
    }

    let root = cli.root.unwrap_or_else(|| PathBuf::from("."));
    let root = std::path::absolute(&root).unwrap_or_else(|e| {
        crate::fatal_error(&format!(
            "Error: cannot resolve project root '{}': {e}",
            root.display()
        ))
    });
    let script_name = config::script_name_from(std::env::args().next().as_deref());
    let config = Config::new(Layout::new(root), Toolchain::from_env(), script_name);
    tracing::debug!(?config, "starting");

    if cli.commands.is_empty() {
        install_interrupt_handler();
    }

    let mut input = io::stdin().lock();
    let mut out = io::stdout();
    let banner = commands::banner(&config.script_name);
    if let Err(e) = dispatch::start(&table, &config, &banner, &cli.commands, &mut input, &mut out)
    {
        crate::fatal_error(&format!("Error: {e}"));
    }
}
