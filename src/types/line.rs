use super::{CommandCode, LineId, RobotId, StationIndex};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quota counters of one line row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineStatus {
    pub items_to_pick: u32,
    pub items_picked: u32,
}

impl LineStatus {
    #[must_use]
    pub const fn new(items_to_pick: u32, items_picked: u32) -> Self {
        Self {
            items_to_pick,
            items_picked,
        }
    }

    #[must_use]
    pub const fn quota_met(&self) -> bool {
        self.items_picked >= self.items_to_pick
    }
}

/// Which line and station a device serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationAssignment {
    pub line_id: LineId,
    pub station_index: StationIndex,
}

impl StationAssignment {
    #[must_use]
    pub const fn new(line_id: LineId, station_index: StationIndex) -> Self {
        Self {
            line_id,
            station_index,
        }
    }
}

/// Result of an edge-triggered robot status read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RobotStatusRead {
    /// `update_time` equals the caller's last-seen timestamp.
    Unchanged,
    Fresh {
        status: String,
        update_time: DateTime<Utc>,
    },
    /// No robot row is bound to this line.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub robot_id: RobotId,
    pub status: Option<String>,
    pub items_picked: u32,
    pub update_time: Option<DateTime<Utc>>,
}

/// Read-only operator view of a line and its robots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub line_id: LineId,
    pub current_command: Option<CommandCode>,
    pub status: LineStatus,
    pub update_time: Option<DateTime<Utc>>,
    pub robots: Vec<RobotSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::LineStatus;

    #[test]
    fn quota_is_met_once_picked_reaches_target() {
        assert!(!LineStatus::new(2, 1).quota_met());
        assert!(LineStatus::new(2, 2).quota_met());
        assert!(LineStatus::new(2, 3).quota_met());
        assert!(LineStatus::new(0, 0).quota_met());
    }
}
