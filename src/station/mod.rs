//! Per-station agent: robot socket link, status reply parsing and device
//! identity.

mod agent;
mod identity;
mod link;
mod status_reply;

pub use agent::{RobotCommandAgent, StationTick, DEFAULT_STATION_POLL_INTERVAL};
pub use identity::{FixedIdentity, IdentitySource, SysfsMacIdentity, DEFAULT_INTERFACES};
pub use link::{
    RobotLink, TcpRobotLink, DEFAULT_CONNECT_TIMEOUT, DEFAULT_ROBOT_ADDR, DEFAULT_STATUS_SETTLE,
    STATUS_BUFFER_LEN, STATUS_REQUEST,
};
pub use status_reply::StatusReply;
