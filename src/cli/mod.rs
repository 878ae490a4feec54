//! CLI module for fieldguard
//!
//! Runs one engine operation per invocation against a JSON-file store:
//! - read, create, update, delete: flags describe the operation
//! - exec: a serialized operation arrives on stdin
//! - layout: print the persisted field layout of an object type

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Identity, RoleArg};
pub use commands::{layout, run, run_command, to_operation};
pub use errors::{CliError, CliResult};
pub use io::{read_request, write_error, write_response};
