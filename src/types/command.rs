#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Line-level directive stored as an ordinal in `lines.current_command`.
///
/// The discriminants are the wire encoding shared with deployed stations, so
/// variants must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandCode {
    None = 0,
    EmergencyStop = 1,
    VacuumOn = 2,
    VacuumOff = 3,
    ZeroReturn = 4,
    Axis = 5,
    LoadConfig = 6,
    Drop = 7,
    Pick = 8,
    ZeroNeeded = 9,
}

impl CommandCode {
    pub const ALL: [Self; 10] = [
        Self::None,
        Self::EmergencyStop,
        Self::VacuumOn,
        Self::VacuumOff,
        Self::ZeroReturn,
        Self::Axis,
        Self::LoadConfig,
        Self::Drop,
        Self::Pick,
        Self::ZeroNeeded,
    ];

    #[must_use]
    pub const fn ordinal(self) -> i32 {
        self as i32
    }

    /// Positional decode. Out-of-range ordinals have no command.
    #[must_use]
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Text token understood by the robot controller, if the command has one.
    #[must_use]
    pub const fn token(self) -> Option<&'static str> {
        match self {
            Self::EmergencyStop => Some("estop"),
            Self::VacuumOn => Some("vcon"),
            Self::VacuumOff => Some("vcoff"),
            Self::ZeroReturn => Some("zero"),
            Self::Drop => Some("drop"),
            Self::Pick => Some("pick"),
            Self::ZeroNeeded => Some("zneeded"),
            Self::None | Self::Axis | Self::LoadConfig => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::EmergencyStop => "emergency_stop",
            Self::VacuumOn => "vacuum_on",
            Self::VacuumOff => "vacuum_off",
            Self::ZeroReturn => "zero_return",
            Self::Axis => "axis",
            Self::LoadConfig => "load_config",
            Self::Drop => "drop",
            Self::Pick => "pick",
            Self::ZeroNeeded => "zero_needed",
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Edge trigger over the line row's `update_time`.
///
/// Owned by one station agent. A decoded command stays pending, and is read
/// again on every poll, until the agent calls [`CommandCursor::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandCursor {
    last_seen: Option<DateTime<Utc>>,
    pending: Option<DateTime<Utc>>,
}

impl CommandCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_seen: None,
            pending: None,
        }
    }

    #[must_use]
    pub const fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Decode a stored `(ordinal, update_time)` pair, returning `None` when the
    /// timestamp has already been committed. Out-of-range ordinals are
    /// consumed immediately and decode to `None`.
    pub fn observe(&mut self, ordinal: i32, update_time: DateTime<Utc>) -> CommandCode {
        if self.last_seen == Some(update_time) {
            return CommandCode::None;
        }

        let Some(command) = CommandCode::from_ordinal(ordinal) else {
            warn!("Received invalid command ordinal {}", ordinal);
            self.last_seen = Some(update_time);
            self.pending = None;
            return CommandCode::None;
        };

        if self.pending != Some(update_time) {
            info!("Received command {}: {}", ordinal, command);
        }
        self.pending = Some(update_time);
        command
    }

    /// Marks the last observed command as delivered.
    pub fn commit(&mut self) {
        if let Some(update_time) = self.pending.take() {
            self.last_seen = Some(update_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandCode, CommandCursor};
    use chrono::{Duration, Utc};

    #[test]
    fn ordinals_match_deployed_encoding() {
        assert_eq!(CommandCode::None.ordinal(), 0);
        assert_eq!(CommandCode::Drop.ordinal(), 7);
        assert_eq!(CommandCode::Pick.ordinal(), 8);
        assert_eq!(CommandCode::ZeroNeeded.ordinal(), 9);
        assert!(CommandCode::ALL
            .iter()
            .enumerate()
            .all(|(index, command)| CommandCode::from_ordinal(command.ordinal())
                == Some(*command)
                && usize::try_from(command.ordinal()).ok() == Some(index)));
    }

    #[test]
    fn out_of_range_ordinals_decode_to_nothing() {
        assert_eq!(CommandCode::from_ordinal(-1), None);
        assert_eq!(CommandCode::from_ordinal(10), None);
        assert_eq!(CommandCode::from_ordinal(i32::MAX), None);
    }

    #[test]
    fn commands_without_controller_tokens() {
        assert_eq!(CommandCode::Pick.token(), Some("pick"));
        assert_eq!(CommandCode::ZeroNeeded.token(), Some("zneeded"));
        assert_eq!(CommandCode::Axis.token(), None);
        assert_eq!(CommandCode::None.token(), None);
    }

    #[test]
    fn cursor_delivers_each_committed_timestamp_once() {
        let mut cursor = CommandCursor::new();
        let stamp = Utc::now();

        assert_eq!(cursor.observe(8, stamp), CommandCode::Pick);
        cursor.commit();
        assert_eq!(cursor.observe(8, stamp), CommandCode::None);
        assert_eq!(
            cursor.observe(7, stamp + Duration::milliseconds(1)),
            CommandCode::Drop
        );
    }

    #[test]
    fn uncommitted_command_is_observed_again() {
        let mut cursor = CommandCursor::new();
        let stamp = Utc::now();

        assert_eq!(cursor.observe(8, stamp), CommandCode::Pick);
        assert_eq!(cursor.observe(8, stamp), CommandCode::Pick);
        assert_eq!(cursor.last_seen(), None);

        cursor.commit();
        assert_eq!(cursor.last_seen(), Some(stamp));
        assert_eq!(cursor.observe(8, stamp), CommandCode::None);
    }

    #[test]
    fn cursor_consumes_invalid_ordinals() {
        let mut cursor = CommandCursor::new();
        let stamp = Utc::now();

        assert_eq!(cursor.observe(42, stamp), CommandCode::None);
        assert_eq!(cursor.last_seen(), Some(stamp));
        assert_eq!(cursor.observe(8, stamp), CommandCode::None);
    }
}
