//! The commands of the edusat build shell.

use crate::catalog::{Catalog, CatalogItem, CatalogKind};
use crate::config::Config;
use crate::dispatch::{Call, Command, CommandTable, Flow};
use crate::error::CommandError;
use crate::pipeline::{self, BuildProfile};
use std::io::Write;

/// App token that stands for every app in `bin`.
const ALL_APPS: &str = "*";

const HELP_INPUTS: &str = "
Commands can take arguments. Arguments may be plain strings, or names of
applications, binaries, solvers or inputs. Each of these can be listed with its
own command; `apps` lists all available applications, for example.
Such arguments may be abbreviated as `a<n>`, `b<n>`, `s<n>` or `i<n>`. If
`edusat` is the 3rd solver listed by `sats`, you may refer to it as `s3`.
";

type Outcome = Result<Flow, CommandError>;

/// Greeting printed when the shell starts interactively.
pub fn banner(script_name: &str) -> String {
    format!(
        "
Welcome to the edusat build system!
This tool builds and tests edusat's incremental implementation, and runs it
against various SAT solvers via IPASIR.

You are in interactive mode.
Run `help` to list commands.
Run `exit` to exit.
Commands can also be run directly, without this prompt:
`{script_name} \"<command1>\" \"<command2>\" ...`
"
    )
}

/// All commands, in the order `help` shows them.
pub fn table() -> CommandTable<Config> {
    CommandTable::new(vec![
        Command::new("help", "Get help on some command.", help),
        Command::new(
            "help-inputs",
            "Show help on how to input arguments.",
            help_inputs,
        ),
        Command::new("unit-test", "Runs edusat's unit tests. (test.cpp)", unit_test),
        Command::new("pack", "Builds edusat and updates ipasir.", pack),
        Command::new(
            "pack-debug",
            "Like pack, but builds a debug build of edusat.",
            pack_debug,
        ),
        Command::new(
            "pack-debug-verbose",
            "A very verbose debug build of edusat.",
            pack_debug_verbose,
        ),
        Command::new(
            "bin",
            "Builds a binary. Pass '*' as `app` to build every app with the given solver.",
            bin,
        )
        .args(&["app", "solver"]),
        Command::new("apps", "List all available apps.", apps),
        Command::new("sats", "List all available solvers.", sats),
        Command::new("bins", "List all available binaries.", bins),
        Command::new(
            "inps",
            "List all available inputs of an app (taken from its `inputs` directory).",
            inps,
        )
        .args(&["app"]),
        Command::new(
            "run",
            "Run a binary without rebuilding it. `app` and `solver` pick the binary, every `arg` is passed on to it.",
            run,
        )
        .args(&["app", "solver"])
        .variadic("arg"),
        Command::new(
            "run-file",
            "Like `run`, but passes the absolute path of an input file to the binary. Accepts `i<n>` (see `help-inputs`).",
            run_file,
        )
        .args(&["app", "solver", "inp"]),
        Command::new(
            "bin-run-file",
            "Shorthand for `bin`, then `run-file` if the build succeeded.",
            bin_run_file,
        )
        .args(&["app", "solver", "inp"]),
        Command::new("exit", "", exit),
    ])
}

/// Numbered listing as shown by `apps`, `sats`, `bins` and `inps`.
///
/// # Errors
///
/// Returns `Err` if writing to `out` fails.
pub fn write_listing(items: &[CatalogItem], out: &mut dyn Write) -> std::io::Result<()> {
    if items.is_empty() {
        return writeln!(out, "No items!");
    }
    let width = items.len().to_string().len();
    for (i, item) in items.iter().enumerate() {
        writeln!(out, "{:>width$}  {}", i + 1, item.name)?;
    }
    Ok(())
}

fn help(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    call.table.write_help(out)?;
    Ok(Flow::Continue)
}

fn help_inputs(_call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    writeln!(out, "{HELP_INPUTS}")?;
    Ok(Flow::Continue)
}

fn unit_test(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    pipeline::unit_test(call.context, out)?;
    Ok(Flow::Continue)
}

fn pack(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    pipeline::pack(call.context, &BuildProfile::RELEASE, out)?;
    Ok(Flow::Continue)
}

fn pack_debug(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    pipeline::pack(call.context, &BuildProfile::DEBUG, out)?;
    Ok(Flow::Continue)
}

fn pack_debug_verbose(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    pipeline::pack(call.context, &BuildProfile::DEBUG_VERBOSE, out)?;
    Ok(Flow::Continue)
}

/// Build one binary, or one per app for `*`. True if every build succeeded.
fn build_binaries(
    config: &Config,
    app: &str,
    solver: &str,
    out: &mut dyn Write,
) -> Result<bool, CommandError> {
    let catalog = Catalog::new(&config.layout);
    if app == ALL_APPS {
        let solver = catalog.solver(solver)?;
        let mut all_built = true;
        for app in catalog.items(&CatalogKind::App)? {
            all_built &= pipeline::make_binary(config, &app, &solver, out)?;
        }
        return Ok(all_built);
    }

    let app = catalog.app(app)?;
    let solver = catalog.solver(solver)?;
    pipeline::make_binary(config, &app, &solver, out)
}

fn bin(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    build_binaries(call.context, &call.args[0], &call.args[1], out)?;
    Ok(Flow::Continue)
}

fn list(call: &Call<'_, Config>, kind: &CatalogKind, out: &mut dyn Write) -> Outcome {
    let items = Catalog::new(&call.context.layout).items(kind)?;
    write_listing(&items, out)?;
    Ok(Flow::Continue)
}

fn apps(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    list(call, &CatalogKind::App, out)
}

fn sats(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    list(call, &CatalogKind::Solver, out)
}

fn bins(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    list(call, &CatalogKind::Binary, out)
}

fn inps(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    let app = Catalog::new(&call.context.layout).app(&call.args[0])?;
    writeln!(out, "Inputs for {}:", app.name)?;
    list(call, &CatalogKind::Input { app: app.name }, out)
}

fn run(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    let catalog = Catalog::new(&call.context.layout);
    let app = catalog.app(&call.args[0])?;
    let solver = catalog.solver(&call.args[1])?;
    pipeline::run_binary(call.context, &app, &solver, call.rest, out)?;
    Ok(Flow::Continue)
}

fn run_input(config: &Config, args: &[String], out: &mut dyn Write) -> Outcome {
    let catalog = Catalog::new(&config.layout);
    let app = catalog.app(&args[0])?;
    let solver = catalog.solver(&args[1])?;
    let input = catalog.input(&app, &args[2])?;
    pipeline::run_file(config, &app, &solver, &input, out)?;
    Ok(Flow::Continue)
}

fn run_file(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    run_input(call.context, call.args, out)
}

fn bin_run_file(call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    if !build_binaries(call.context, &call.args[0], &call.args[1], out)? {
        return Ok(Flow::Continue);
    }
    run_input(call.context, call.args, out)
}

fn exit(_call: &Call<'_, Config>, out: &mut dyn Write) -> Outcome {
    writeln!(out, "Goodbye! 👋")?;
    Ok(Flow::Exit)
}
