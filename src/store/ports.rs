use crate::types::{
    CommandCode, CommandCursor, HardwareIdentity, LineId, LineStatus, RobotId, RobotStatusRead,
    StationAssignment, StationIndex,
};
use crate::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Session lifecycle of the shared store.
pub trait StoreSession {
    /// Tears down any live session, then opens a new one.
    fn connect(&mut self) -> PortFuture<'_, ()>;

    fn is_alive(&self) -> PortFuture<'_, bool>;

    fn close(&mut self) -> PortFuture<'_, ()>;
}

/// Reads and writes made by the line coordinator.
pub trait LineStore {
    fn load_robot_roster(&self, line_id: LineId) -> PortFuture<'_, Vec<RobotId>>;

    /// # Errors
    /// `LineError::LineNotFound` when the line row does not exist.
    fn read_line_status(&self, line_id: LineId) -> PortFuture<'_, LineStatus>;

    fn write_command(&self, line_id: LineId, command: CommandCode) -> PortFuture<'_, ()>;

    fn write_picked_count(&self, line_id: LineId, items_picked: u32) -> PortFuture<'_, ()>;

    fn read_robot_status(
        &self,
        robot_id: RobotId,
        line_id: LineId,
        last_seen: Option<DateTime<Utc>>,
    ) -> PortFuture<'_, RobotStatusRead>;
}

/// Reads and writes made by a station agent.
pub trait StationStore {
    fn resolve_station_assignment<'a>(
        &'a self,
        identity: &'a HardwareIdentity,
    ) -> PortFuture<'a, Option<StationAssignment>>;

    /// Edge-triggered: `CommandCode::None` unless the line row's update time
    /// advanced past the cursor's last commit.
    fn read_line_command<'a>(
        &'a self,
        line_id: LineId,
        cursor: &'a mut CommandCursor,
    ) -> PortFuture<'a, CommandCode>;

    fn write_station_status<'a>(
        &'a self,
        assignment: StationAssignment,
        status: &'a str,
        items_picked: u32,
    ) -> PortFuture<'a, ()>;

    fn record_pick_event(
        &self,
        station_index: StationIndex,
        completion_time: DateTime<Utc>,
        pick_count: u32,
    ) -> PortFuture<'_, ()>;
}

pub trait CoordinationStore: StoreSession + LineStore + StationStore {}

impl<T> CoordinationStore for T where T: StoreSession + LineStore + StationStore {}
