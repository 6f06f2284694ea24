#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::mappers::to_i32_u32;
use super::LineDb;
use crate::error::{LineError, Result};
use crate::types::{CommandCode, LineId, StationAssignment, StationIndex};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub const EMBEDDED_SCHEMA_SQL: &str = include_str!("../../schema.sql");

impl LineDb {
    /// # Errors
    /// Returns an error if any statement in `schema_sql` fails.
    pub async fn initialize_schema_from_sql(&self, schema_sql: &str) -> Result<()> {
        sqlx::raw_sql(schema_sql)
            .execute(self.pool()?)
            .await
            .map(|_result| ())
            .map_err(|e| LineError::DatabaseError(format!("Failed to initialize schema: {e}")))
    }

    /// Overwrites the command. `update_time` moves only when the command
    /// changes, so stations see one edge per distinct command.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn write_command(&self, line_id: LineId, command: CommandCode) -> Result<()> {
        let pool = self.pool()?;
        self.bounded(
            "write line command",
            sqlx::query(
                "UPDATE lines SET update_time = CASE WHEN current_command IS DISTINCT FROM $1 \
                 THEN NOW() ELSE update_time END, current_command = $1 WHERE id = $2",
            )
            .bind(command.ordinal())
            .bind(line_id.value())
            .execute(pool),
        )
        .await?;

        info!("Line {} command set to {}", line_id, command);
        Ok(())
    }

    /// Leaves `update_time` alone so the count is not re-delivered as a command.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn write_picked_count(&self, line_id: LineId, items_picked: u32) -> Result<()> {
        let pool = self.pool()?;
        self.bounded(
            "write picked count",
            sqlx::query("UPDATE lines SET items_picked = $1 WHERE id = $2")
                .bind(to_i32_u32(items_picked))
                .bind(line_id.value())
                .execute(pool),
        )
        .await?;

        info!("Line {} items picked set to {}", line_id, items_picked);
        Ok(())
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn write_station_status(
        &self,
        assignment: StationAssignment,
        status: &str,
        items_picked: u32,
    ) -> Result<()> {
        let pool = self.pool()?;
        let result = self
            .bounded(
                "write station status",
                sqlx::query(
                    "UPDATE robots
                     SET status = $1, items_picked = $2, update_time = NOW()
                     FROM stations
                     WHERE stations.robot_id = robots.id
                       AND stations.line_id = $3
                       AND stations.station_index = $4",
                )
                .bind(status)
                .bind(to_i32_u32(items_picked))
                .bind(assignment.line_id.value())
                .bind(assignment.station_index.value())
                .execute(pool),
            )
            .await?;

        debug!(
            "Station {}/{} reported {} ({} picked), {} row(s)",
            assignment.line_id,
            assignment.station_index,
            status,
            items_picked,
            result.rows_affected()
        );
        Ok(())
    }

    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn record_pick_event(
        &self,
        station_index: StationIndex,
        completion_time: DateTime<Utc>,
        pick_count: u32,
    ) -> Result<()> {
        let pool = self.pool()?;
        self.bounded(
            "record pick event",
            sqlx::query(
                "INSERT INTO pick_events (station_index, pick_count, pick_completion_time)
                 VALUES ($1, $2, $3)",
            )
            .bind(station_index.value())
            .bind(to_i32_u32(pick_count))
            .bind(completion_time)
            .execute(pool),
        )
        .await
        .map(|_result| ())
    }
}
