#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::types::LineId;
use thiserror::Error;

/// Error code constants for type-safe error handling
pub mod code {
    pub const CLI_ERROR: &str = "CLI_ERROR";
    pub const NOTFOUND: &str = "NOTFOUND";
    pub const INVALID: &str = "INVALID";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    pub const PROTOCOL: &str = "PROTOCOL";
    pub const INTERNAL: &str = "INTERNAL";
}

/// How far up the supervision levels an error has to travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Operator configuration problem. The process exits.
    Fatal,
    /// The session to the store or robot is gone; re-establish it.
    Reconnect,
    /// Affects only the current tick.
    Retry,
}

#[derive(Error, Debug)]
pub enum LineError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Line {0} does not exist")]
    LineNotFound(LineId),

    #[error("Store rejected credentials: {0}")]
    AuthenticationFailed(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Robot link error: {0}")]
    LinkError(String),

    #[error("Conveyor error: {0}")]
    ConveyorError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl LineError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ConfigError(_) | Self::LineNotFound(_) | Self::AuthenticationFailed(_) => {
                ErrorClass::Fatal
            }
            Self::NotConnected(_) | Self::LinkError(_) | Self::IoError(_) => ErrorClass::Reconnect,
            Self::SqlxError(error) => classify_sqlx(error),
            Self::DatabaseError(_)
            | Self::ConveyorError(_)
            | Self::ProtocolError(_)
            | Self::SerializationError(_) => ErrorClass::Retry,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }

    /// Returns the protocol error code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => code::INVALID,
            Self::LineNotFound(_) => code::NOTFOUND,
            Self::AuthenticationFailed(_) => code::UNAUTHORIZED,
            Self::NotConnected(_) | Self::LinkError(_) | Self::ConveyorError(_) => {
                code::UNAVAILABLE
            }
            Self::ProtocolError(_) | Self::SerializationError(_) => code::PROTOCOL,
            Self::DatabaseError(_) | Self::SqlxError(_) | Self::IoError(_) => code::INTERNAL,
        }
    }

    /// Returns the exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigError(_) => 2,
            Self::DatabaseError(_) | Self::SqlxError(_) => 3,
            Self::LineNotFound(_) => 4,
            Self::AuthenticationFailed(_) => 5,
            Self::NotConnected(_) | Self::LinkError(_) | Self::ConveyorError(_) => 6,
            Self::IoError(_) => 7,
            Self::ProtocolError(_) | Self::SerializationError(_) => 8,
        }
    }
}

fn classify_sqlx(error: &sqlx::Error) -> ErrorClass {
    match error {
        sqlx::Error::Configuration(_) => ErrorClass::Fatal,
        // SQLSTATE class 28: invalid authorization specification
        sqlx::Error::Database(db) if db.code().is_some_and(|c| c.starts_with("28")) => {
            ErrorClass::Fatal
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ErrorClass::Reconnect,
        _ => ErrorClass::Retry,
    }
}

pub type Result<T> = std::result::Result<T, LineError>;
