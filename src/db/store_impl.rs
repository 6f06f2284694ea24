use super::LineDb;
use crate::store::{LineStore, PortFuture, StationStore, StoreSession};
use crate::types::{
    CommandCode, CommandCursor, HardwareIdentity, LineId, LineStatus, RobotId, RobotStatusRead,
    StationAssignment, StationIndex,
};
use chrono::{DateTime, Utc};

impl StoreSession for LineDb {
    fn connect(&mut self) -> PortFuture<'_, ()> {
        Box::pin(self.open())
    }

    fn is_alive(&self) -> PortFuture<'_, bool> {
        Box::pin(async move { Ok(self.ping().await) })
    }

    fn close(&mut self) -> PortFuture<'_, ()> {
        Box::pin(async move {
            self.shutdown().await;
            Ok(())
        })
    }
}

impl LineStore for LineDb {
    fn load_robot_roster(&self, line_id: LineId) -> PortFuture<'_, Vec<RobotId>> {
        Box::pin(LineDb::load_robot_roster(self, line_id))
    }

    fn read_line_status(&self, line_id: LineId) -> PortFuture<'_, LineStatus> {
        Box::pin(LineDb::read_line_status(self, line_id))
    }

    fn write_command(&self, line_id: LineId, command: CommandCode) -> PortFuture<'_, ()> {
        Box::pin(LineDb::write_command(self, line_id, command))
    }

    fn write_picked_count(&self, line_id: LineId, items_picked: u32) -> PortFuture<'_, ()> {
        Box::pin(LineDb::write_picked_count(self, line_id, items_picked))
    }

    fn read_robot_status(
        &self,
        robot_id: RobotId,
        line_id: LineId,
        last_seen: Option<DateTime<Utc>>,
    ) -> PortFuture<'_, RobotStatusRead> {
        Box::pin(LineDb::read_robot_status(self, robot_id, line_id, last_seen))
    }
}

impl StationStore for LineDb {
    fn resolve_station_assignment<'a>(
        &'a self,
        identity: &'a HardwareIdentity,
    ) -> PortFuture<'a, Option<StationAssignment>> {
        Box::pin(LineDb::resolve_station_assignment(self, identity))
    }

    fn read_line_command<'a>(
        &'a self,
        line_id: LineId,
        cursor: &'a mut CommandCursor,
    ) -> PortFuture<'a, CommandCode> {
        Box::pin(LineDb::read_line_command(self, line_id, cursor))
    }

    fn write_station_status<'a>(
        &'a self,
        assignment: StationAssignment,
        status: &'a str,
        items_picked: u32,
    ) -> PortFuture<'a, ()> {
        Box::pin(LineDb::write_station_status(
            self,
            assignment,
            status,
            items_picked,
        ))
    }

    fn record_pick_event(
        &self,
        station_index: StationIndex,
        completion_time: DateTime<Utc>,
        pick_count: u32,
    ) -> PortFuture<'_, ()> {
        Box::pin(LineDb::record_pick_event(
            self,
            station_index,
            completion_time,
            pick_count,
        ))
    }
}
