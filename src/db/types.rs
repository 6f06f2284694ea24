use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(FromRow)]
pub(crate) struct LineStatusRow {
    pub(crate) items_to_pick: i32,
    pub(crate) items_picked: i32,
}

#[derive(FromRow)]
pub(crate) struct LineCommandRow {
    pub(crate) current_command: i32,
    pub(crate) update_time: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct LineRow {
    pub(crate) current_command: i32,
    pub(crate) items_to_pick: i32,
    pub(crate) items_picked: i32,
    pub(crate) update_time: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct RobotStatusRow {
    pub(crate) status: Option<String>,
    pub(crate) update_time: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct RobotSnapshotRow {
    pub(crate) id: i32,
    pub(crate) status: Option<String>,
    pub(crate) items_picked: i32,
    pub(crate) update_time: DateTime<Utc>,
}

#[derive(FromRow)]
pub(crate) struct StationAssignmentRow {
    pub(crate) line_id: i32,
    pub(crate) station_index: i32,
}
