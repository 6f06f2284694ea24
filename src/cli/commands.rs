#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Run the pick/drop state machine for one line.
    Coordinator { line_id: i32 },
    /// Run the station agent for the robot on this device.
    Agent {
        identity: Option<String>,
        robot_addr: Option<String>,
    },
    Status { line_id: i32 },
    Identity,
    InitDb,
}

impl CliCommand {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Coordinator { .. } => "coordinator",
            Self::Agent { .. } => "agent",
            Self::Status { .. } => "status",
            Self::Identity => "identity",
            Self::InitDb => "init-db",
        }
    }
}
