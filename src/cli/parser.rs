#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::action::CliAction;
use super::args::ensure_no_unknown_flags;
use super::commands::CliCommand;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("Missing required argument: {}", arg)]
    MissingRequiredArg { arg: String },
    #[error("Unknown command: {}", cmd)]
    UnknownCommand { cmd: String },
    #[error("Invalid type for {}", arg)]
    InvalidArgType { arg: String },
    #[error("Invalid argument value for {}: {}", arg, error)]
    InvalidArgValue { arg: String, error: String },
}

/// Parses the arguments that follow the program name.
///
/// # Errors
/// Any `CliError` for a missing, malformed or unknown argument.
pub fn parse_cli_args(args: &[String]) -> Result<CliAction, CliError> {
    if args
        .get(1)
        .is_some_and(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        return Ok(CliAction::ShowHelp);
    }

    match args.first().map(String::as_str) {
        None | Some("-h" | "--help" | "help") => Ok(CliAction::ShowHelp),
        Some("-v" | "--version") => Ok(CliAction::ShowVersion),
        Some("coordinator") => {
            ensure_no_unknown_flags(args, &["--line-id"])?;
            let line_id = parse_required_arg(args, "line_id")?;
            Ok(CliAction::Command(CliCommand::Coordinator { line_id }))
        }
        Some("agent") => {
            ensure_no_unknown_flags(args, &["--identity", "--robot-addr"])?;
            let identity = parse_optional_arg(args, "identity")?;
            let robot_addr = parse_optional_arg(args, "robot_addr")?;
            Ok(CliAction::Command(CliCommand::Agent {
                identity,
                robot_addr,
            }))
        }
        Some("status") => {
            ensure_no_unknown_flags(args, &["--line-id"])?;
            let line_id = parse_required_arg(args, "line_id")?;
            Ok(CliAction::Command(CliCommand::Status { line_id }))
        }
        Some("identity") => {
            ensure_no_unknown_flags(args, &[])?;
            Ok(CliAction::Command(CliCommand::Identity))
        }
        Some("init-db") => {
            ensure_no_unknown_flags(args, &[])?;
            Ok(CliAction::Command(CliCommand::InitDb))
        }
        Some(cmd) => Err(CliError::UnknownCommand {
            cmd: cmd.to_string(),
        }),
    }
}

fn parse_required_arg<T>(args: &[String], name: &str) -> Result<T, CliError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let flag = format!("--{}", name.replace('_', "-"));
    let Some(position) = args.iter().position(|a| a.as_str() == flag) else {
        return Err(CliError::MissingRequiredArg {
            arg: name.to_string(),
        });
    };

    let Some(raw_value) = args.get(position + 1) else {
        return Err(CliError::MissingRequiredArg {
            arg: name.to_string(),
        });
    };

    if raw_value.starts_with("--") {
        return Err(CliError::MissingRequiredArg {
            arg: name.to_string(),
        });
    }

    raw_value
        .parse::<T>()
        .map_err(|_| CliError::InvalidArgType {
            arg: name.to_string(),
        })
}

fn parse_optional_arg<T>(args: &[String], name: &str) -> Result<Option<T>, CliError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let flag = format!("--{}", name.replace('_', "-"));
    let Some(position) = args.iter().position(|a| a.as_str() == flag) else {
        return Ok(None);
    };

    match args.get(position + 1) {
        Some(value) if !value.starts_with("--") => {
            value
                .parse::<T>()
                .map(Some)
                .map_err(|e| CliError::InvalidArgValue {
                    arg: name.to_string(),
                    error: format!("{e}"),
                })
        }
        _ => Err(CliError::MissingRequiredArg {
            arg: name.to_string(),
        }),
    }
}
