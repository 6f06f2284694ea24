#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod action;
mod args;
mod commands;
mod parser;

pub use action::CliAction;
pub use args::{split_config_flag, suggest_commands};
pub use commands::CliCommand;
pub use parser::{parse_cli_args, CliError};

#[cfg(test)]
mod tests;
