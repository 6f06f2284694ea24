#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use pickline::db::DEFAULT_STORE_TIMEOUT;
use pickline::line::{
    DEFAULT_CONVEYOR_COOLDOWN, DEFAULT_CONVEYOR_TIMEOUT, DEFAULT_LINE_POLL_INTERVAL,
};
use pickline::station::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_INTERFACES, DEFAULT_ROBOT_ADDR, DEFAULT_STATION_POLL_INTERVAL,
    DEFAULT_STATUS_SETTLE,
};
use pickline::{LineError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = ".pickline/config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: Option<String>,
    pub store_timeout: Duration,
    pub line_poll: Duration,
    pub station_poll: Duration,
    pub conveyor_url: Option<String>,
    pub conveyor_cooldown: Duration,
    pub conveyor_timeout: Duration,
    pub robot_addr: String,
    pub robot_connect_timeout: Duration,
    pub status_settle: Duration,
    pub hardware_identity: Option<String>,
    pub identity_interfaces: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            line_poll: DEFAULT_LINE_POLL_INTERVAL,
            station_poll: DEFAULT_STATION_POLL_INTERVAL,
            conveyor_url: None,
            conveyor_cooldown: DEFAULT_CONVEYOR_COOLDOWN,
            conveyor_timeout: DEFAULT_CONVEYOR_TIMEOUT,
            robot_addr: DEFAULT_ROBOT_ADDR.to_string(),
            robot_connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            status_settle: DEFAULT_STATUS_SETTLE,
            hardware_identity: None,
            identity_interfaces: DEFAULT_INTERFACES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// # Errors
/// `LineError::ConfigError` when the file exists but cannot be read or holds
/// an invalid value.
pub async fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if !config_path.exists() {
        return if explicit {
            Err(LineError::ConfigError(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Config::default())
        };
    }

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(|e| LineError::ConfigError(format!("Failed to read config: {e}")))?;

    parse_config_content(&content)
}

/// # Errors
/// `LineError::ConfigError` for a malformed duration value.
pub fn parse_config_content(content: &str) -> Result<Config> {
    let mut config = Config::default();

    for line in content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
    {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        let value = expand_env_vars(value);
        match key {
            "database_url" => config.database_url = non_empty(value),
            "store_timeout_ms" => config.store_timeout = parse_millis(key, &value)?,
            "line_poll_ms" => config.line_poll = parse_millis(key, &value)?,
            "station_poll_ms" => config.station_poll = parse_millis(key, &value)?,
            "conveyor_url" => config.conveyor_url = non_empty(value),
            "conveyor_cooldown_ms" => config.conveyor_cooldown = parse_millis(key, &value)?,
            "conveyor_timeout_ms" => config.conveyor_timeout = parse_millis(key, &value)?,
            "robot_addr" => config.robot_addr = value,
            "robot_connect_timeout_ms" => {
                config.robot_connect_timeout = parse_millis(key, &value)?;
            }
            "status_settle_ms" => config.status_settle = parse_millis(key, &value)?,
            "hardware_identity" => config.hardware_identity = non_empty(value),
            "identity_interfaces" => {
                config.identity_interfaces = value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            _ => {}
        }
    }

    Ok(config)
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once('=')
        .map(|(lhs, rhs)| (lhs.trim(), rhs.trim().trim_matches('"')))
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| LineError::ConfigError(format!("{key} must be milliseconds, got {value:?}")))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn expand_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_part = &result[start + 2..start + end];
            let (var_name, default) = var_part.split_once(":-").unwrap_or((var_part, ""));
            let value = std::env::var(var_name).unwrap_or_else(|_| default.to_string());
            result.replace_range(start..=(start + end), &value);
        } else {
            break;
        }
    }
    result
}

pub fn resolve_database_url(config: &Config) -> String {
    database_url_candidates(config)
        .into_iter()
        .next()
        .unwrap_or_else(computed_default_database_url)
}

pub fn database_url_candidates(config: &Config) -> Vec<String> {
    let mut candidates = Vec::new();

    push_unique(&mut candidates, non_empty_env_var("DATABASE_URL"));
    push_unique(&mut candidates, config.database_url.clone());
    push_unique(&mut candidates, Some(computed_default_database_url()));

    candidates
}

fn push_unique(target: &mut Vec<String>, value: Option<String>) {
    if let Some(candidate) = value {
        if !target.iter().any(|existing| existing == &candidate) {
            target.push(candidate);
        }
    }
}

fn non_empty_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn computed_default_database_url() -> String {
    let user = std::env::var("PICKLINE_DB_USER").unwrap_or_else(|_| "pickline".to_string());
    let pass = std::env::var("PICKLINE_DB_PASSWORD").unwrap_or_else(|_| "pickline".to_string());
    let host = std::env::var("PICKLINE_DB_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("PICKLINE_DB_PORT").unwrap_or_else(|_| "5432".to_string());
    let db = std::env::var("PICKLINE_DB_NAME").unwrap_or_else(|_| "pickline".to_string());
    format!("postgres://{user}:{pass}@{host}:{port}/{db}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::{database_url_candidates, load_config, parse_config_content, Config};
    use pickline::LineError;
    use std::time::Duration;

    #[test]
    fn parse_reads_every_known_key() {
        let content = r#"# line 3 controller
database_url = "postgres://line:secret@db/pickline"
store_timeout_ms = "750"
line_poll_ms = 250
station_poll_ms = 2000
conveyor_url = "http://conveyor.local/rr_gcode?gcode=M98P0:/macros/conveyor_index"
conveyor_cooldown_ms = 4000
conveyor_timeout_ms = 9000
robot_addr = "10.0.0.5:6000"
robot_connect_timeout_ms = 1500
status_settle_ms = 50
hardware_identity = "b8:27:eb:aa:bb:cc"
identity_interfaces = "enx0, eth0""#;

        let config = parse_config_content(content).unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://line:secret@db/pickline")
        );
        assert_eq!(config.store_timeout, Duration::from_millis(750));
        assert_eq!(config.line_poll, Duration::from_millis(250));
        assert_eq!(config.station_poll, Duration::from_secs(2));
        assert!(config.conveyor_url.unwrap().ends_with("conveyor_index"));
        assert_eq!(config.conveyor_cooldown, Duration::from_secs(4));
        assert_eq!(config.conveyor_timeout, Duration::from_secs(9));
        assert_eq!(config.robot_addr, "10.0.0.5:6000");
        assert_eq!(config.robot_connect_timeout, Duration::from_millis(1500));
        assert_eq!(config.status_settle, Duration::from_millis(50));
        assert_eq!(config.hardware_identity.as_deref(), Some("b8:27:eb:aa:bb:cc"));
        assert_eq!(config.identity_interfaces, vec!["enx0", "eth0"]);
    }

    #[test]
    fn defaults_match_the_deployed_cadence() {
        let config = Config::default();
        assert_eq!(config.line_poll, Duration::from_millis(500));
        assert_eq!(config.station_poll, Duration::from_millis(1000));
        assert_eq!(config.store_timeout, Duration::from_millis(1000));
        assert_eq!(config.conveyor_cooldown, Duration::from_millis(5000));
        assert_eq!(config.robot_addr, "127.0.0.1:6000");
    }

    #[test]
    fn env_defaults_are_expanded() {
        let config =
            parse_config_content("robot_addr = \"${PICKLINE_UNSET_TEST_VAR:-192.168.1.9:6000}\"")
                .unwrap();
        assert_eq!(config.robot_addr, "192.168.1.9:6000");
    }

    #[test]
    fn bad_duration_is_a_config_error() {
        let result = parse_config_content("line_poll_ms = \"fast\"");
        assert!(matches!(result, Err(LineError::ConfigError(msg)) if msg.contains("line_poll_ms")));
    }

    #[test]
    fn configured_url_is_a_candidate() {
        let config = Config {
            database_url: Some("postgres://from-config/db".to_string()),
            ..Config::default()
        };
        let candidates = database_url_candidates(&config);
        assert!(candidates.contains(&"postgres://from-config/db".to_string()));
        assert!(candidates.last().unwrap().starts_with("postgres://"));
    }

    #[tokio::test]
    async fn explicit_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(dir.path().join("absent.toml"))).await;
        assert!(matches!(result, Err(LineError::ConfigError(_))));
    }

    #[tokio::test]
    async fn config_file_is_loaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "line_poll_ms = 100\n").unwrap();

        let config = load_config(Some(path)).await.unwrap();

        assert_eq!(config.line_poll, Duration::from_millis(100));
    }
}
