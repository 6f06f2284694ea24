//! In-process store used as the coordination bus in tests and dry runs.

use super::ports::{LineStore, PortFuture, StationStore, StoreSession};
use crate::error::{LineError, Result};
use crate::types::{
    CommandCode, CommandCursor, HardwareIdentity, LineId, LineStatus, RobotId, RobotStatusRead,
    StationAssignment, StationIndex,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct LineRow {
    current_command: i32,
    items_to_pick: u32,
    items_picked: u32,
    update_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct RobotRow {
    status: Option<String>,
    items_picked: u32,
    update_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StationRow {
    robot_id: RobotId,
    line_id: LineId,
    station_index: StationIndex,
    identity: HardwareIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickEventRecord {
    pub station_index: StationIndex,
    pub completion_time: DateTime<Utc>,
    pub pick_count: u32,
}

#[derive(Debug)]
struct MemoryState {
    connected: bool,
    connect_count: u32,
    connect_failures: VecDeque<LineError>,
    read_failures: VecDeque<LineError>,
    count_write_failures: VecDeque<LineError>,
    lines: BTreeMap<LineId, LineRow>,
    robots: BTreeMap<RobotId, RobotRow>,
    stations: Vec<StationRow>,
    command_log: Vec<(LineId, CommandCode)>,
    pick_events: Vec<PickEventRecord>,
    epoch: DateTime<Utc>,
    clock_ms: i64,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            connected: false,
            connect_count: 0,
            connect_failures: VecDeque::new(),
            read_failures: VecDeque::new(),
            count_write_failures: VecDeque::new(),
            lines: BTreeMap::new(),
            robots: BTreeMap::new(),
            stations: Vec::new(),
            command_log: Vec::new(),
            pick_events: Vec::new(),
            epoch: Utc::now(),
            clock_ms: 0,
        }
    }

    // Strictly increasing so two writes in the same tick never share a stamp.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        self.clock_ms += 1;
        self.epoch + Duration::milliseconds(self.clock_ms)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(LineError::NotConnected("memory store session closed".to_string()))
        }
    }

    fn take_read_failure(&mut self) -> Result<()> {
        self.read_failures.pop_front().map_or(Ok(()), Err)
    }

    fn station_robot(&self, line_id: LineId, station_index: StationIndex) -> Option<RobotId> {
        self.stations
            .iter()
            .find(|row| row.line_id == line_id && row.station_index == station_index)
            .map(|row| row.robot_id)
    }
}

/// Cheaply cloneable handle; clones share the same rows.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::new())),
        }
    }

    pub async fn with_line(self, line_id: LineId, items_to_pick: u32, items_picked: u32) -> Self {
        let mut state = self.state.lock().await;
        let update_time = state.next_stamp();
        state.lines.insert(
            line_id,
            LineRow {
                current_command: CommandCode::None.ordinal(),
                items_to_pick,
                items_picked,
                update_time,
            },
        );
        drop(state);
        self
    }

    pub async fn with_station(
        self,
        robot_id: RobotId,
        line_id: LineId,
        station_index: StationIndex,
        identity: &str,
    ) -> Self {
        let mut state = self.state.lock().await;
        let update_time = state.next_stamp();
        state.robots.entry(robot_id).or_insert(RobotRow {
            status: None,
            items_picked: 0,
            update_time,
        });
        state.stations.push(StationRow {
            robot_id,
            line_id,
            station_index,
            identity: HardwareIdentity::new(identity),
        });
        drop(state);
        self
    }

    /// Simulates a station agent reporting a new status for a robot.
    pub async fn set_robot_status(&self, robot_id: RobotId, status: &str) {
        let mut state = self.state.lock().await;
        let update_time = state.next_stamp();
        if let Some(row) = state.robots.get_mut(&robot_id) {
            row.status = Some(status.to_string());
            row.update_time = update_time;
        }
    }

    /// Writes a raw ordinal, bypassing the `CommandCode` encoding.
    pub async fn set_raw_command(&self, line_id: LineId, ordinal: i32) {
        let mut state = self.state.lock().await;
        let update_time = state.next_stamp();
        if let Some(row) = state.lines.get_mut(&line_id) {
            row.current_command = ordinal;
            row.update_time = update_time;
        }
    }

    pub async fn set_items_to_pick(&self, line_id: LineId, items_to_pick: u32) {
        let mut state = self.state.lock().await;
        if let Some(row) = state.lines.get_mut(&line_id) {
            row.items_to_pick = items_to_pick;
        }
    }

    pub async fn commands_issued(&self, line_id: LineId) -> Vec<CommandCode> {
        self.state
            .lock()
            .await
            .command_log
            .iter()
            .filter(|(line, _)| *line == line_id)
            .map(|(_, command)| *command)
            .collect()
    }

    pub async fn line_status(&self, line_id: LineId) -> Option<LineStatus> {
        self.state
            .lock()
            .await
            .lines
            .get(&line_id)
            .map(|row| LineStatus::new(row.items_to_pick, row.items_picked))
    }

    pub async fn robot_report(&self, robot_id: RobotId) -> Option<(String, u32)> {
        self.state
            .lock()
            .await
            .robots
            .get(&robot_id)
            .and_then(|row| row.status.clone().map(|status| (status, row.items_picked)))
    }

    pub async fn pick_events(&self) -> Vec<PickEventRecord> {
        self.state.lock().await.pick_events.clone()
    }

    pub async fn connect_count(&self) -> u32 {
        self.state.lock().await.connect_count
    }

    /// Drops the session as if the server went away.
    pub async fn sever(&self) {
        self.state.lock().await.connected = false;
    }

    pub async fn fail_next_connect(&self, error: LineError) {
        self.state.lock().await.connect_failures.push_back(error);
    }

    /// Queues a failure for the next line status or line command read.
    pub async fn fail_next_read(&self, error: LineError) {
        self.state.lock().await.read_failures.push_back(error);
    }

    /// Queues a failure for the next picked-count write.
    pub async fn fail_next_count_write(&self, error: LineError) {
        self.state.lock().await.count_write_failures.push_back(error);
    }
}

impl StoreSession for MemoryStore {
    fn connect(&mut self) -> PortFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.connected = false;
            if let Some(error) = state.connect_failures.pop_front() {
                return Err(error);
            }
            state.connected = true;
            state.connect_count = state.connect_count.saturating_add(1);
            Ok(())
        })
    }

    fn is_alive(&self) -> PortFuture<'_, bool> {
        Box::pin(async move { Ok(self.state.lock().await.connected) })
    }

    fn close(&mut self) -> PortFuture<'_, ()> {
        Box::pin(async move {
            self.state.lock().await.connected = false;
            Ok(())
        })
    }
}

impl LineStore for MemoryStore {
    fn load_robot_roster(&self, line_id: LineId) -> PortFuture<'_, Vec<RobotId>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            state.ensure_connected()?;
            let mut roster = state
                .stations
                .iter()
                .filter(|row| row.line_id == line_id)
                .map(|row| row.robot_id)
                .collect::<Vec<_>>();
            roster.sort_unstable();
            roster.dedup();
            Ok(roster)
        })
    }

    fn read_line_status(&self, line_id: LineId) -> PortFuture<'_, LineStatus> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.ensure_connected()?;
            state.take_read_failure()?;
            state
                .lines
                .get(&line_id)
                .map(|row| LineStatus::new(row.items_to_pick, row.items_picked))
                .ok_or(LineError::LineNotFound(line_id))
        })
    }

    fn write_command(&self, line_id: LineId, command: CommandCode) -> PortFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.ensure_connected()?;
            let changed = state
                .lines
                .get(&line_id)
                .is_some_and(|row| row.current_command != command.ordinal());
            if changed {
                let update_time = state.next_stamp();
                if let Some(row) = state.lines.get_mut(&line_id) {
                    row.current_command = command.ordinal();
                    row.update_time = update_time;
                }
            }
            state.command_log.push((line_id, command));
            Ok(())
        })
    }

    fn write_picked_count(&self, line_id: LineId, items_picked: u32) -> PortFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.ensure_connected()?;
            if let Some(error) = state.count_write_failures.pop_front() {
                return Err(error);
            }
            if let Some(row) = state.lines.get_mut(&line_id) {
                row.items_picked = items_picked;
            }
            Ok(())
        })
    }

    fn read_robot_status(
        &self,
        robot_id: RobotId,
        line_id: LineId,
        last_seen: Option<DateTime<Utc>>,
    ) -> PortFuture<'_, RobotStatusRead> {
        Box::pin(async move {
            let state = self.state.lock().await;
            state.ensure_connected()?;
            let bound = state
                .stations
                .iter()
                .any(|row| row.robot_id == robot_id && row.line_id == line_id);
            let Some(row) = state.robots.get(&robot_id).filter(|_| bound) else {
                return Ok(RobotStatusRead::Missing);
            };
            if last_seen == Some(row.update_time) {
                return Ok(RobotStatusRead::Unchanged);
            }
            Ok(RobotStatusRead::Fresh {
                status: row.status.clone().unwrap_or_default(),
                update_time: row.update_time,
            })
        })
    }
}

impl StationStore for MemoryStore {
    fn resolve_station_assignment<'a>(
        &'a self,
        identity: &'a HardwareIdentity,
    ) -> PortFuture<'a, Option<StationAssignment>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            state.ensure_connected()?;
            Ok(state
                .stations
                .iter()
                .find(|row| &row.identity == identity)
                .map(|row| StationAssignment::new(row.line_id, row.station_index)))
        })
    }

    fn read_line_command<'a>(
        &'a self,
        line_id: LineId,
        cursor: &'a mut CommandCursor,
    ) -> PortFuture<'a, CommandCode> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.ensure_connected()?;
            state.take_read_failure()?;
            Ok(state
                .lines
                .get(&line_id)
                .map_or(CommandCode::None, |row| {
                    cursor.observe(row.current_command, row.update_time)
                }))
        })
    }

    fn write_station_status<'a>(
        &'a self,
        assignment: StationAssignment,
        status: &'a str,
        items_picked: u32,
    ) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.ensure_connected()?;
            let update_time = state.next_stamp();
            let robot_id = state.station_robot(assignment.line_id, assignment.station_index);
            if let Some(row) = robot_id.and_then(|id| state.robots.get_mut(&id)) {
                row.status = Some(status.to_string());
                row.items_picked = items_picked;
                row.update_time = update_time;
            }
            Ok(())
        })
    }

    fn record_pick_event(
        &self,
        station_index: StationIndex,
        completion_time: DateTime<Utc>,
        pick_count: u32,
    ) -> PortFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.ensure_connected()?;
            state.pick_events.push(PickEventRecord {
                station_index,
                completion_time,
                pick_count,
            });
            Ok(())
        })
    }
}
