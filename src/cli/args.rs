#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::parser::CliError;
use std::path::PathBuf;

pub const VALID_COMMANDS: &[&str] = &[
    "coordinator",
    "agent",
    "status",
    "identity",
    "init-db",
    "help",
];

/// # Errors
/// Returns `CliError::UnknownCommand` if an unknown flag is found.
pub fn ensure_no_unknown_flags(args: &[String], allowed_flags: &[&str]) -> Result<(), CliError> {
    let invalid = args
        .iter()
        .skip(1)
        .find(|arg| {
            arg.starts_with("--")
                && !matches!(arg.as_str(), "--help" | "-h")
                && !allowed_flags.iter().any(|allowed| allowed == &arg.as_str())
        })
        .cloned();

    invalid.map_or(Ok(()), |flag| Err(CliError::UnknownCommand { cmd: flag }))
}

/// Removes a global `--config <PATH>` pair from anywhere in `args`.
///
/// # Errors
/// Returns `CliError::MissingRequiredArg` when `--config` has no value.
pub fn split_config_flag(args: &[String]) -> Result<(Option<PathBuf>, Vec<String>), CliError> {
    let Some(position) = args.iter().position(|arg| arg == "--config") else {
        return Ok((None, args.to_vec()));
    };

    let path = args
        .get(position + 1)
        .filter(|value| !value.starts_with("--"))
        .map(PathBuf::from)
        .ok_or_else(|| CliError::MissingRequiredArg {
            arg: "config".to_string(),
        })?;

    let rest = args
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != position && *index != position + 1)
        .map(|(_, arg)| arg.clone())
        .collect();

    Ok((Some(path), rest))
}

#[must_use]
pub fn suggest_commands(typo: &str) -> Vec<String> {
    VALID_COMMANDS
        .iter()
        .map(|cmd| (cmd, strsim::levenshtein(typo, cmd)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(cmd, _)| vec![(*cmd).to_string()])
        .unwrap_or_default()
}
