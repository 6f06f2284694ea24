#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::mappers::{line_snapshot, robot_status_read, to_u32_i32};
use super::types::{
    LineCommandRow, LineRow, LineStatusRow, RobotSnapshotRow, RobotStatusRow,
    StationAssignmentRow,
};
use super::LineDb;
use crate::error::{LineError, Result};
use crate::types::{
    CommandCode, CommandCursor, HardwareIdentity, LineId, LineSnapshot, LineStatus, RobotId,
    RobotStatusRead, StationAssignment, StationIndex,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

impl LineDb {
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn load_robot_roster(&self, line_id: LineId) -> Result<Vec<RobotId>> {
        let pool = self.pool()?;
        let ids = self
            .bounded(
                "load robot roster",
                sqlx::query_scalar::<_, i32>(
                    "SELECT DISTINCT robots.id
                     FROM robots
                     JOIN stations ON stations.robot_id = robots.id
                     WHERE stations.line_id = $1
                     ORDER BY robots.id",
                )
                .bind(line_id.value())
                .fetch_all(pool),
            )
            .await?;

        let roster = ids.into_iter().map(RobotId::new).collect::<Vec<_>>();
        roster
            .iter()
            .for_each(|robot_id| info!("Robot {} added to line {}", robot_id, line_id));
        Ok(roster)
    }

    /// # Errors
    /// `LineError::LineNotFound` when no row exists for `line_id`.
    pub async fn read_line_status(&self, line_id: LineId) -> Result<LineStatus> {
        let pool = self.pool()?;
        let row = self
            .bounded(
                "read line status",
                sqlx::query_as::<_, LineStatusRow>(
                    "SELECT items_to_pick, items_picked FROM lines WHERE id = $1",
                )
                .bind(line_id.value())
                .fetch_optional(pool),
            )
            .await?;

        row.map(|row| {
            LineStatus::new(to_u32_i32(row.items_to_pick), to_u32_i32(row.items_picked))
        })
        .ok_or(LineError::LineNotFound(line_id))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn read_robot_status(
        &self,
        robot_id: RobotId,
        line_id: LineId,
        last_seen: Option<DateTime<Utc>>,
    ) -> Result<RobotStatusRead> {
        let pool = self.pool()?;
        let row = self
            .bounded(
                "read robot status",
                sqlx::query_as::<_, RobotStatusRow>(
                    "SELECT robots.status, robots.update_time
                     FROM robots
                     JOIN stations ON stations.robot_id = robots.id
                     WHERE robots.id = $1 AND stations.line_id = $2
                     LIMIT 1",
                )
                .bind(robot_id.value())
                .bind(line_id.value())
                .fetch_optional(pool),
            )
            .await?;

        Ok(robot_status_read(row, last_seen))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn resolve_station_assignment(
        &self,
        identity: &HardwareIdentity,
    ) -> Result<Option<StationAssignment>> {
        let pool = self.pool()?;
        let row = self
            .bounded(
                "resolve station assignment",
                sqlx::query_as::<_, StationAssignmentRow>(
                    "SELECT line_id, station_index
                     FROM stations
                     WHERE hardware_identity = $1
                     LIMIT 1",
                )
                .bind(identity.value())
                .fetch_optional(pool),
            )
            .await?;

        Ok(row.map(|row| {
            StationAssignment::new(
                LineId::new(row.line_id),
                StationIndex::new(row.station_index),
            )
        }))
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn read_line_command(
        &self,
        line_id: LineId,
        cursor: &mut CommandCursor,
    ) -> Result<CommandCode> {
        let pool = self.pool()?;
        let row = self
            .bounded(
                "read line command",
                sqlx::query_as::<_, LineCommandRow>(
                    "SELECT current_command, update_time FROM lines WHERE id = $1",
                )
                .bind(line_id.value())
                .fetch_optional(pool),
            )
            .await?;

        Ok(row.map_or_else(
            || {
                debug!("No line row for line {}", line_id);
                CommandCode::None
            },
            |row| cursor.observe(row.current_command, row.update_time),
        ))
    }

    /// # Errors
    /// `LineError::LineNotFound` when no row exists for `line_id`.
    pub async fn line_snapshot(&self, line_id: LineId) -> Result<LineSnapshot> {
        let pool = self.pool()?;
        let line = self
            .bounded(
                "read line",
                sqlx::query_as::<_, LineRow>(
                    "SELECT current_command, items_to_pick, items_picked, update_time
                     FROM lines WHERE id = $1",
                )
                .bind(line_id.value())
                .fetch_optional(pool),
            )
            .await?
            .ok_or(LineError::LineNotFound(line_id))?;

        let robots = self
            .bounded(
                "read line robots",
                sqlx::query_as::<_, RobotSnapshotRow>(
                    "SELECT robots.id, robots.status, robots.items_picked, robots.update_time
                     FROM robots
                     JOIN stations ON stations.robot_id = robots.id
                     WHERE stations.line_id = $1
                     ORDER BY stations.station_index",
                )
                .bind(line_id.value())
                .fetch_all(pool),
            )
            .await?;

        Ok(line_snapshot(line_id, line, robots))
    }
}
