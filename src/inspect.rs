//! JSON description of the command table, for editors and scripts.

use crate::dispatch::CommandTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variadic: Option<String>,
}

/// Root structure for inspect output
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectOutput {
    pub commands: Vec<CommandSchema>,
}

pub fn inspect<C>(table: &CommandTable<C>) -> InspectOutput {
    InspectOutput {
        commands: table
            .iter()
            .map(|c| CommandSchema {
                name: c.name.to_string(),
                description: c.description.to_string(),
                args: c.fixed_args.iter().map(|a| (*a).to_string()).collect(),
                variadic: c.variadic_arg.map(str::to_string),
            })
            .collect(),
    }
}

/// Print the command table as pretty JSON.
pub fn print_inspect<C>(table: &CommandTable<C>) {
    match serde_json::to_string_pretty(&inspect(table)) {
        Ok(json) => println!("{json}"),
        Err(e) => crate::fatal_error(&format!("Error serializing command table: {e}")),
    }
}
