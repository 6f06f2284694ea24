#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

#[cfg(test)]
mod bdd_tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use crate::cli::{
        parse_cli_args, split_config_flag, suggest_commands, CliAction, CliCommand, CliError,
    };
    use std::path::PathBuf;

    fn given_cli_args(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn when_no_args_then_show_help() {
        let action = parse_cli_args(&given_cli_args(&[])).expect("parse");
        assert_eq!(action, CliAction::ShowHelp);
    }

    #[test]
    fn when_version_flag_then_show_version() {
        let action = parse_cli_args(&given_cli_args(&["--version"])).expect("parse");
        assert_eq!(action, CliAction::ShowVersion);
    }

    #[test]
    fn when_command_help_flag_then_show_help() {
        let action = parse_cli_args(&given_cli_args(&["coordinator", "--help"])).expect("parse");
        assert_eq!(action, CliAction::ShowHelp);
    }

    #[test]
    fn when_coordinator_with_line_id_then_coordinator_action() {
        let action =
            parse_cli_args(&given_cli_args(&["coordinator", "--line-id", "3"])).expect("parse");
        assert_eq!(
            action,
            CliAction::Command(CliCommand::Coordinator { line_id: 3 })
        );
    }

    #[test]
    fn when_coordinator_without_line_id_then_missing_arg() {
        let result = parse_cli_args(&given_cli_args(&["coordinator"]));
        assert_eq!(
            result,
            Err(CliError::MissingRequiredArg {
                arg: "line_id".to_string()
            })
        );
    }

    #[test]
    fn when_line_id_is_not_a_number_then_invalid_type() {
        let result = parse_cli_args(&given_cli_args(&["status", "--line-id", "three"]));
        assert!(matches!(result, Err(CliError::InvalidArgType { arg }) if arg == "line_id"));
    }

    #[test]
    fn when_agent_without_flags_then_defaults_are_left_to_config() {
        let action = parse_cli_args(&given_cli_args(&["agent"])).expect("parse");
        assert_eq!(
            action,
            CliAction::Command(CliCommand::Agent {
                identity: None,
                robot_addr: None,
            })
        );
    }

    #[test]
    fn when_agent_with_overrides_then_both_are_captured() {
        let args = given_cli_args(&[
            "agent",
            "--robot-addr",
            "10.0.0.7:6000",
            "--identity",
            "b8:27:eb:01:02:03",
        ]);
        match parse_cli_args(&args).expect("parse") {
            CliAction::Command(CliCommand::Agent {
                identity,
                robot_addr,
            }) => {
                assert_eq!(identity.as_deref(), Some("b8:27:eb:01:02:03"));
                assert_eq!(robot_addr.as_deref(), Some("10.0.0.7:6000"));
            }
            other => panic!("Expected Agent command, got {other:?}"),
        }
    }

    #[test]
    fn when_optional_flag_has_no_value_then_error() {
        let result = parse_cli_args(&given_cli_args(&["agent", "--identity"]));
        assert!(matches!(result, Err(CliError::MissingRequiredArg { .. })));
    }

    #[test]
    fn when_unknown_flag_then_rejected() {
        let result = parse_cli_args(&given_cli_args(&["identity", "--verbose"]));
        assert_eq!(
            result,
            Err(CliError::UnknownCommand {
                cmd: "--verbose".to_string()
            })
        );
    }

    #[test]
    fn when_unknown_command_then_error_with_suggestion() {
        let result = parse_cli_args(&given_cli_args(&["coordinater"]));
        assert!(matches!(result, Err(CliError::UnknownCommand { .. })));
        assert_eq!(suggest_commands("coordinater"), vec!["coordinator"]);
        assert!(suggest_commands("zzzzzzzzzzzz").is_empty());
    }

    #[test]
    fn when_init_db_then_init_db_action() {
        let action = parse_cli_args(&given_cli_args(&["init-db"])).expect("parse");
        assert_eq!(action, CliAction::Command(CliCommand::InitDb));
    }

    #[test]
    fn config_flag_is_removed_wherever_it_appears() {
        let args = given_cli_args(&["status", "--config", "line.toml", "--line-id", "1"]);
        let (path, rest) = split_config_flag(&args).expect("split");

        assert_eq!(path, Some(PathBuf::from("line.toml")));
        assert_eq!(rest, given_cli_args(&["status", "--line-id", "1"]));
    }

    #[test]
    fn config_flag_without_value_is_an_error() {
        let args = given_cli_args(&["--config"]);
        assert!(split_config_flag(&args).is_err());
    }

    #[test]
    fn command_names_match_their_cli_spelling() {
        assert_eq!(CliCommand::Coordinator { line_id: 1 }.name(), "coordinator");
        assert_eq!(CliCommand::InitDb.name(), "init-db");
    }
}
