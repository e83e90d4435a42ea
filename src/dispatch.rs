//! Table-driven command dispatch for the interactive shell and batch mode.
//!
//! A line is split on whitespace into a command name and raw arguments. The
//! arguments are checked against the command's arity and bound positionally;
//! turning them into apps, solvers and so on is left to the command itself.

use crate::error::CommandError;
use std::io::{self, BufRead, Write};

/// Prompt shown before each interactive line.
pub const PROMPT: &str = ">>> ";

/// What the shell does after a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Arguments and surroundings handed to an operation.
pub struct Call<'a, C> {
    pub context: &'a C,
    pub table: &'a CommandTable<C>,
    /// One value per declared fixed argument, in order.
    pub args: &'a [String],
    /// Everything after the fixed arguments. Always empty without a variadic argument.
    pub rest: &'a [String],
}

pub type Operation<C> = fn(&Call<'_, C>, &mut dyn Write) -> Result<Flow, CommandError>;

pub struct Command<C> {
    pub name: &'static str,
    pub description: &'static str,
    pub operation: Operation<C>,
    pub fixed_args: &'static [&'static str],
    pub variadic_arg: Option<&'static str>,
}

impl<C> Command<C> {
    /// A command taking no arguments.
    pub fn new(name: &'static str, description: &'static str, operation: Operation<C>) -> Self {
        Self {
            name,
            description,
            operation,
            fixed_args: &[],
            variadic_arg: None,
        }
    }

    #[must_use]
    pub fn args(mut self, fixed_args: &'static [&'static str]) -> Self {
        self.fixed_args = fixed_args;
        self
    }

    #[must_use]
    pub fn variadic(mut self, name: &'static str) -> Self {
        self.variadic_arg = Some(name);
        self
    }

    /// Invocation signature, e.g. `run <app> <solver> <arg>...`.
    pub fn signature(&self) -> String {
        let mut parts = vec![self.name.to_string()];
        parts.extend(self.fixed_args.iter().map(|a| format!("<{a}>")));
        if let Some(v) = self.variadic_arg {
            parts.push(format!("<{v}>..."));
        }
        parts.join(" ")
    }

    fn check_arity(&self, got: usize) -> Result<(), String> {
        let expected = self.fixed_args.len();
        if self.variadic_arg.is_some() {
            if got < expected {
                return Err(format!(
                    "Invalid number of arguments for {}. Expected at least {expected}, got {got}.",
                    self.name
                ));
            }
        } else if got != expected {
            return Err(format!(
                "Invalid number of arguments for {}. Expected {expected}, got {got}.",
                self.name
            ));
        }
        Ok(())
    }
}

/// Commands in display order.
pub struct CommandTable<C> {
    commands: Vec<Command<C>>,
}

impl<C> CommandTable<C> {
    pub fn new(commands: Vec<Command<C>>) -> Self {
        Self { commands }
    }

    /// First command registered under `name`.
    pub fn find(&self, name: &str) -> Option<&Command<C>> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command<C>> {
        self.commands.iter()
    }

    /// One `signature<TAB>description` row per command, signatures padded to a common width.
    pub fn help_rows(&self) -> Vec<String> {
        let signatures: Vec<String> = self.commands.iter().map(Command::signature).collect();
        let width = signatures
            .iter()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);
        signatures
            .iter()
            .zip(&self.commands)
            .map(|(sig, c)| format!("{sig:<width$}\t{}", c.description))
            .collect()
    }

    /// Print the command overview.
    ///
    /// # Errors
    ///
    /// Returns `Err` if writing to `out` fails.
    pub fn write_help(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Commands:")?;
        for row in self.help_rows() {
            writeln!(out, "\t{row}")?;
        }
        Ok(())
    }
}

/// A parsed line, ready to run.
pub enum Action<'t, C> {
    Noop,
    Invoke {
        table: &'t CommandTable<C>,
        command: &'t Command<C>,
        args: Vec<String>,
        rest: Vec<String>,
    },
}

impl<C> Action<'_, C> {
    /// Run the bound operation.
    ///
    /// # Errors
    ///
    /// Propagates whatever the operation returns.
    pub fn run(&self, context: &C, out: &mut dyn Write) -> Result<Flow, CommandError> {
        match self {
            Self::Noop => Ok(Flow::Continue),
            Self::Invoke {
                table,
                command,
                args,
                rest,
            } => {
                tracing::debug!(command = command.name, ?args, ?rest, "running command");
                let call = Call {
                    context,
                    table,
                    args,
                    rest,
                };
                (command.operation)(&call, out)
            }
        }
    }
}

/// Parse one line of input against `table`.
///
/// # Errors
///
/// Returns the message to show the user when the command is unknown or the
/// argument count does not fit.
pub fn parse<'t, C>(table: &'t CommandTable<C>, line: &str) -> Result<Action<'t, C>, String> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(Action::Noop);
    };
    let mut raw: Vec<String> = words.map(str::to_string).collect();

    let command = table
        .find(name)
        .ok_or_else(|| format!("Unknown command: {name}"))?;
    command.check_arity(raw.len())?;

    let rest = raw.split_off(command.fixed_args.len());
    Ok(Action::Invoke {
        table,
        command,
        args: raw,
        rest,
    })
}

/// Parse and run one line, reporting problems to `out` instead of failing.
///
/// # Errors
///
/// Returns `Err` only if writing to `out` fails.
pub fn run_line<C>(
    table: &CommandTable<C>,
    context: &C,
    line: &str,
    out: &mut dyn Write,
) -> io::Result<Flow> {
    match parse(table, line) {
        Ok(action) => match action.run(context, out) {
            Ok(flow) => Ok(flow),
            Err(e) => {
                tracing::debug!(error = ?e, "command failed");
                writeln!(out, "Error: {e}")?;
                Ok(Flow::Continue)
            }
        },
        Err(message) => {
            writeln!(out, "{message}")?;
            Ok(Flow::Continue)
        }
    }
}

/// Run every batch token in order, or an interactive loop when there are none.
///
/// Errors in one command never stop the following ones; only a command
/// returning [`Flow::Exit`] or the end of `input` ends the session.
///
/// # Errors
///
/// Returns `Err` if writing to `out` fails.
pub fn start<C>(
    table: &CommandTable<C>,
    context: &C,
    banner: &str,
    batch: &[String],
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> io::Result<()> {
    if !batch.is_empty() {
        for line in batch {
            if run_line(table, context, line, out)? == Flow::Exit {
                break;
            }
        }
        return Ok(());
    }

    writeln!(out, "{banner}")?;
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl+D)
                writeln!(out)?;
                break;
            }
            Ok(_) => {
                if run_line(table, context, &line, out)? == Flow::Exit {
                    break;
                }
            }
            // The undecodable line is already consumed; keep prompting.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                writeln!(out, "Error: {e}")?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                writeln!(out, "Error reading input: {e}")?;
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Log = RefCell<Vec<String>>;

    fn record(call: &Call<'_, Log>, _out: &mut dyn Write) -> Result<Flow, CommandError> {
        call.context
            .borrow_mut()
            .push(format!("{:?}|{:?}", call.args, call.rest));
        Ok(Flow::Continue)
    }

    fn fail(_call: &Call<'_, Log>, _out: &mut dyn Write) -> Result<Flow, CommandError> {
        Err(crate::catalog::ResolutionError::Solver("s9".to_string()).into())
    }

    fn say(_call: &Call<'_, Log>, out: &mut dyn Write) -> Result<Flow, CommandError> {
        writeln!(out, "said")?;
        Ok(Flow::Continue)
    }

    fn quit(_call: &Call<'_, Log>, _out: &mut dyn Write) -> Result<Flow, CommandError> {
        Ok(Flow::Exit)
    }

    fn table() -> CommandTable<Log> {
        CommandTable::new(vec![
            Command::new("go", "Go somewhere.", record).args(&["x", "y"]),
            Command::new("run", "Run a thing.", record)
                .args(&["app", "solver"])
                .variadic("arg"),
            Command::new("fail", "Always fails.", fail),
            Command::new("say", "Says something.", say),
            Command::new("exit", "", quit),
            Command::new("go", "Shadowed.", fail),
        ])
    }

    fn run_all(lines: &[&str]) -> (String, Vec<String>) {
        let table = table();
        let log = Log::default();
        let mut out = Vec::new();
        let batch: Vec<String> = lines.iter().map(|s| (*s).to_string()).collect();
        start(&table, &log, "banner", &batch, &mut io::empty(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), log.into_inner())
    }

    #[test]
    fn test_empty_line_is_noop() {
        let table = table();
        assert!(matches!(parse(&table, ""), Ok(Action::Noop)));
        assert!(matches!(parse(&table, "   \t "), Ok(Action::Noop)));
        let (out, log) = run_all(&[""]);
        assert!(out.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_unknown_command() {
        let table = table();
        assert_eq!(
            parse(&table, "frobnicate now").err().unwrap(),
            "Unknown command: frobnicate"
        );
    }

    #[test]
    fn test_fixed_arity_must_match_exactly() {
        let table = table();
        assert_eq!(
            parse(&table, "go 1 2 3").err().unwrap(),
            "Invalid number of arguments for go. Expected 2, got 3."
        );
        assert_eq!(
            parse(&table, "go 1").err().unwrap(),
            "Invalid number of arguments for go. Expected 2, got 1."
        );
        assert!(parse(&table, "go 1 2").is_ok());
    }

    #[test]
    fn test_variadic_arity_is_a_minimum() {
        let table = table();
        assert_eq!(
            parse(&table, "run a1").err().unwrap(),
            "Invalid number of arguments for run. Expected at least 2, got 1."
        );
        let (_, log) = run_all(&["run a1 s1", "run a1 s1 -v  --seed 3"]);
        assert_eq!(
            log,
            [
                r#"["a1", "s1"]|[]"#,
                r#"["a1", "s1"]|["-v", "--seed", "3"]"#
            ]
        );
    }

    #[test]
    fn test_first_registered_command_wins() {
        let (out, log) = run_all(&["go left right"]);
        assert!(out.is_empty());
        assert_eq!(log, [r#"["left", "right"]|[]"#]);
    }

    #[test]
    fn test_operation_errors_are_reported_and_batch_continues() {
        let (out, _) = run_all(&["fail", "say"]);
        assert_eq!(out, "Error: Solver 's9' does not exist.\nsaid\n");
    }

    #[test]
    fn test_exit_stops_batch() {
        let (out, _) = run_all(&["say", "exit", "say"]);
        assert_eq!(out, "said\n");
    }

    #[test]
    fn test_help_rows_are_aligned() {
        let rows = table().help_rows();
        assert_eq!(rows[1], "run <app> <solver> <arg>...\tRun a thing.");
        assert_eq!(rows[0], format!("{:<27}\tGo somewhere.", "go <x> <y>"));
        assert_eq!(rows[4], format!("{:<27}\t", "exit"));
        let width = rows[1].find('\t').unwrap();
        assert!(rows.iter().all(|r| r.find('\t') == Some(width)));
    }

    #[test]
    fn test_write_help_has_header_and_indented_rows() {
        let mut out = Vec::new();
        table().write_help(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Commands:"));
        assert!(lines.all(|l| l.starts_with('\t')));
    }

    #[test]
    fn test_interactive_loop_reads_until_eof() {
        let table = table();
        let log = Log::default();
        let mut out = Vec::new();
        let mut input = io::Cursor::new("say\n\nnope\n");
        start(&table, &log, "Hello!", &[], &mut input, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Hello!\n>>> said\n>>> >>> Unknown command: nope\n>>> \n"
        );
    }

    #[test]
    fn test_interactive_exit_stops_reading() {
        let table = table();
        let log = Log::default();
        let mut out = Vec::new();
        let mut input = io::Cursor::new("exit\nsay\n");
        start(&table, &log, "Hi", &[], &mut input, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Hi\n>>> ");
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_session() {
        let table = table();
        let log = Log::default();
        let mut out = Vec::new();
        let mut input = io::Cursor::new(&b"\xff\nsay\n"[..]);
        start(&table, &log, "B", &[], &mut input, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("B\n>>> Error: "));
        assert!(text.ends_with(">>> said\n>>> \n"));
    }
}
