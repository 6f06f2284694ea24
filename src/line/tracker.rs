use crate::store::LineStore;
use crate::types::{LineId, RobotId, RobotState, RobotStatusRead};
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Last observed state of one robot on a line.
///
/// Reads are debounced on the robot row's `update_time`: a read that returns
/// the timestamp already seen leaves the state alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotStateTracker {
    robot_id: RobotId,
    state: RobotState,
    last_update: Option<DateTime<Utc>>,
}

impl RobotStateTracker {
    #[must_use]
    pub fn new(robot_id: RobotId) -> Self {
        Self {
            robot_id,
            state: RobotState::default(),
            last_update: None,
        }
    }

    #[must_use]
    pub const fn robot_id(&self) -> RobotId {
        self.robot_id
    }

    #[must_use]
    pub const fn state(&self) -> RobotState {
        self.state
    }

    #[must_use]
    pub const fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Returns the raw status token when the row changed, `None` otherwise.
    ///
    /// # Errors
    /// Propagates store failures; the tracked state is left untouched.
    pub async fn refresh<S>(&mut self, store: &S, line_id: LineId) -> Result<Option<String>>
    where
        S: LineStore + ?Sized,
    {
        match store
            .read_robot_status(self.robot_id, line_id, self.last_update)
            .await?
        {
            RobotStatusRead::Unchanged => Ok(None),
            RobotStatusRead::Fresh {
                status,
                update_time,
            } => {
                self.last_update = Some(update_time);
                self.state = RobotState::from_token(Some(&status));
                if self.state == RobotState::Error && status.trim() != RobotState::Error.as_str() {
                    warn!(
                        "Robot {} reported unrecognized status {:?}",
                        self.robot_id, status
                    );
                }
                debug!("Robot {} is {}", self.robot_id, self.state);
                Ok(Some(status))
            }
            RobotStatusRead::Missing => {
                if self.state != RobotState::Error {
                    warn!("Robot {} is no longer bound to line {}", self.robot_id, line_id);
                }
                self.state = RobotState::Error;
                Ok(None)
            }
        }
    }
}
