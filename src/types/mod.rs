mod command;
mod identifiers;
mod line;
mod robot_state;

pub use command::{CommandCode, CommandCursor};
pub use identifiers::{HardwareIdentity, LineId, RobotId, StationIndex};
pub use line::{
    LineSnapshot, LineStatus, RobotSnapshot, RobotStatusRead, StationAssignment,
};
pub use robot_state::RobotState;
