//! Line-level coordination: robot state tracking, the conveyor gate and the
//! pick/drop state machine.

mod conveyor;
mod coordinator;
mod tracker;

pub use conveyor::{
    ConveyorActuator, ConveyorGate, DisabledConveyor, HttpConveyor, DEFAULT_CONVEYOR_COOLDOWN,
    DEFAULT_CONVEYOR_TIMEOUT,
};
pub use coordinator::{LineCoordinator, LinePhase, TickOutcome, DEFAULT_LINE_POLL_INTERVAL};
pub use tracker::RobotStateTracker;
