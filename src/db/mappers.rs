use super::types::{LineRow, RobotSnapshotRow, RobotStatusRow};
use crate::types::{
    CommandCode, LineId, LineSnapshot, LineStatus, RobotId, RobotSnapshot, RobotStatusRead,
};
use chrono::{DateTime, Utc};

pub fn robot_status_read(
    row: Option<RobotStatusRow>,
    last_seen: Option<DateTime<Utc>>,
) -> RobotStatusRead {
    match row {
        None => RobotStatusRead::Missing,
        Some(row) if last_seen == Some(row.update_time) => RobotStatusRead::Unchanged,
        Some(row) => RobotStatusRead::Fresh {
            status: row.status.unwrap_or_default(),
            update_time: row.update_time,
        },
    }
}

pub fn line_snapshot(
    line_id: LineId,
    line: LineRow,
    robots: Vec<RobotSnapshotRow>,
) -> LineSnapshot {
    LineSnapshot {
        line_id,
        current_command: CommandCode::from_ordinal(line.current_command),
        status: LineStatus::new(
            to_u32_i32(line.items_to_pick),
            to_u32_i32(line.items_picked),
        ),
        update_time: Some(line.update_time),
        robots: robots
            .into_iter()
            .map(|robot| RobotSnapshot {
                robot_id: RobotId::new(robot.id),
                status: robot.status,
                items_picked: to_u32_i32(robot.items_picked),
                update_time: Some(robot.update_time),
            })
            .collect(),
    }
}

pub fn to_u32_i32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub fn to_i32_u32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{robot_status_read, to_i32_u32, to_u32_i32};
    use crate::db::types::RobotStatusRow;
    use crate::types::RobotStatusRead;
    use chrono::Utc;

    #[test]
    fn signed_to_unsigned_helpers_clamp_at_zero() {
        assert_eq!(to_u32_i32(3), 3);
        assert_eq!(to_u32_i32(-2), 0);
    }

    #[test]
    fn unsigned_to_signed_helper_saturates() {
        assert_eq!(to_i32_u32(5), 5);
        assert_eq!(to_i32_u32(u32::MAX), i32::MAX);
    }

    #[test]
    fn robot_row_with_seen_timestamp_is_unchanged() {
        let stamp = Utc::now();
        let row = RobotStatusRow {
            status: Some("PC_READY".to_string()),
            update_time: stamp,
        };
        assert_eq!(
            robot_status_read(Some(row), Some(stamp)),
            RobotStatusRead::Unchanged
        );
        assert_eq!(robot_status_read(None, Some(stamp)), RobotStatusRead::Missing);
    }

    #[test]
    fn null_status_reads_as_empty_token() {
        let stamp = Utc::now();
        let row = RobotStatusRow {
            status: None,
            update_time: stamp,
        };
        assert_eq!(
            robot_status_read(Some(row), None),
            RobotStatusRead::Fresh {
                status: String::new(),
                update_time: stamp,
            }
        );
    }
}
