#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod cli;
mod config;
mod output;

use cli::{parse_cli_args, split_config_flag, suggest_commands, CliAction, CliCommand, CliError};
use config::{load_config, resolve_database_url, Config};
use output::{emit_cli_error, emit_error, emit_output, CLI_EXIT_CODE};
use pickline::db::EMBEDDED_SCHEMA_SQL;
use pickline::line::{
    ConveyorActuator, ConveyorGate, DisabledConveyor, HttpConveyor, LineCoordinator,
};
use pickline::station::{
    FixedIdentity, IdentitySource, RobotCommandAgent, SysfsMacIdentity, TcpRobotLink,
};
use pickline::{shutdown_signal, HardwareIdentity, LineDb, LineId, Result, Supervisor};
use serde_json::json;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "pickline - pick-and-place line coordination over a shared store

USAGE:
    pickline [--config <PATH>] <COMMAND> [OPTIONS]

COMMANDS:
    coordinator --line-id <N>        Run the pick/drop coordinator for one line
    agent [--identity <ID>] [--robot-addr <HOST:PORT>]
                                     Run the station agent for this device's robot
    status --line-id <N>             Print a JSON snapshot of a line and its robots
    identity                         Print this device's hardware identity
    init-db                          Apply the embedded schema to the store

OPTIONS:
    --config <PATH>                  Config file (default .pickline/config.toml)
    -h, --help                       Show this help
    -v, --version                    Show version

ENVIRONMENT:
    DATABASE_URL                     Store connection string
    RUST_LOG                         Log filter (default info)";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, args) = match split_config_flag(&args) {
        Ok(split) => split,
        Err(error) => return cli_failure(&error),
    };

    let command = match parse_cli_args(&args) {
        Ok(CliAction::ShowHelp) => {
            println!("{HELP}");
            return ExitCode::SUCCESS;
        }
        Ok(CliAction::ShowVersion) => {
            println!("pickline {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Ok(CliAction::Command(command)) => command,
        Err(error) => return cli_failure(&error),
    };

    let result = match load_config(config_path).await {
        Ok(config) => run_command(&command, &config).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            emit_error(command.name(), &error);
            ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1))
        }
    }
}

fn cli_failure(error: &CliError) -> ExitCode {
    let suggestions = match error {
        CliError::UnknownCommand { cmd } => suggest_commands(cmd),
        _ => Vec::new(),
    };
    emit_cli_error(error, &suggestions);
    ExitCode::from(u8::try_from(CLI_EXIT_CODE).unwrap_or(1))
}

async fn run_command(command: &CliCommand, config: &Config) -> Result<()> {
    match command {
        CliCommand::Coordinator { line_id } => {
            run_coordinator(LineId::new(*line_id), config).await
        }
        CliCommand::Agent {
            identity,
            robot_addr,
        } => run_agent(identity.as_deref(), robot_addr.as_deref(), config).await,
        CliCommand::Status { line_id } => {
            let mut db = store(config);
            db.open().await?;
            let snapshot = db.line_snapshot(LineId::new(*line_id)).await;
            db.shutdown().await;
            emit_output(command.name(), &serde_json::to_value(snapshot?)?);
            Ok(())
        }
        CliCommand::Identity => {
            let identity = resolve_identity(None, config);
            emit_output(
                command.name(),
                &json!({
                    "hardware_identity": identity.value(),
                    "available": identity.is_available(),
                }),
            );
            Ok(())
        }
        CliCommand::InitDb => {
            let mut db = store(config);
            db.open().await?;
            let applied = db.initialize_schema_from_sql(EMBEDDED_SCHEMA_SQL).await;
            db.shutdown().await;
            applied?;
            info!("Schema applied");
            emit_output(command.name(), &json!({ "message": "schema applied" }));
            Ok(())
        }
    }
}

fn store(config: &Config) -> LineDb {
    LineDb::new(resolve_database_url(config), config.store_timeout)
}

async fn run_coordinator(line_id: LineId, config: &Config) -> Result<()> {
    let actuator: Box<dyn ConveyorActuator> = match &config.conveyor_url {
        Some(url) => Box::new(HttpConveyor::new(url.clone(), config.conveyor_timeout)?),
        None => {
            warn!("No conveyor_url configured; conveyor indexing is disabled");
            Box::new(DisabledConveyor)
        }
    };
    let gate = ConveyorGate::new(actuator, config.conveyor_cooldown);
    let mut coordinator = LineCoordinator::new(store(config), line_id, gate);

    info!("Starting coordinator for line {}", line_id);
    Supervisor::new(config.line_poll)
        .run(&mut coordinator, shutdown_signal())
        .await
}

async fn run_agent(
    identity: Option<&str>,
    robot_addr: Option<&str>,
    config: &Config,
) -> Result<()> {
    let identity = resolve_identity(identity, config);
    if !identity.is_available() {
        warn!(
            "No hardware identity found; station lookup will use {}",
            identity
        );
    }
    let link = TcpRobotLink::new(
        robot_addr.unwrap_or(&config.robot_addr),
        config.robot_connect_timeout,
        config.status_settle,
    );
    let mut agent = RobotCommandAgent::new(store(config), link, identity);

    Supervisor::new(config.station_poll)
        .run(&mut agent, shutdown_signal())
        .await
}

fn resolve_identity(cli_identity: Option<&str>, config: &Config) -> HardwareIdentity {
    cli_identity
        .or(config.hardware_identity.as_deref())
        .map_or_else(
            || {
                SysfsMacIdentity::new("/sys/class/net", config.identity_interfaces.clone())
                    .resolve()
            },
            |fixed| FixedIdentity::new(fixed).resolve(),
        )
}
