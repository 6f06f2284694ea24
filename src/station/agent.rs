#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::link::RobotLink;
use super::status_reply::StatusReply;
use crate::store::{PortFuture, StationStore, StoreSession};
use crate::supervisor::Supervised;
use crate::types::{CommandCode, CommandCursor, HardwareIdentity, StationAssignment};
use crate::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

pub const DEFAULT_STATION_POLL_INTERVAL: std::time::Duration =
    std::time::Duration::from_millis(1_000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationTick {
    /// No station row matches this device; nothing to relay.
    Unassigned,
    Reported {
        forwarded: Option<CommandCode>,
        status: String,
        items_picked: u32,
    },
}

/// Relays line commands to one robot and reports its status back.
pub struct RobotCommandAgent<S, L> {
    store: S,
    link: L,
    identity: HardwareIdentity,
    assignment: Option<StationAssignment>,
    cursor: CommandCursor,
    last_picked: Option<u32>,
}

impl<S, L> RobotCommandAgent<S, L>
where
    S: StoreSession + StationStore + Send + Sync,
    L: RobotLink,
{
    #[must_use]
    pub const fn new(store: S, link: L, identity: HardwareIdentity) -> Self {
        Self {
            store,
            link,
            identity,
            assignment: None,
            cursor: CommandCursor::new(),
            last_picked: None,
        }
    }

    #[must_use]
    pub const fn identity(&self) -> &HardwareIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn assignment(&self) -> Option<StationAssignment> {
        self.assignment
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Connects the store and the robot. The station assignment is looked up
    /// on the first successful connect only.
    ///
    /// # Errors
    /// Store or robot connect failures, or a failed assignment lookup.
    pub async fn establish(&mut self) -> Result<()> {
        info!("Connecting to store...");
        self.store.connect().await?;
        info!("Connecting to robot...");
        self.link.connect().await?;

        if self.assignment.is_none() {
            self.assignment = self
                .store
                .resolve_station_assignment(&self.identity)
                .await?;
            match self.assignment {
                Some(assignment) => info!(
                    "Device {} is station {} on line {}",
                    self.identity, assignment.station_index, assignment.line_id
                ),
                None => warn!(
                    "No station registered for device {}; agent will idle",
                    self.identity
                ),
            }
        }
        Ok(())
    }

    /// # Errors
    /// Robot status read or station status write failures. A failure while
    /// forwarding a command is logged and does not fail the tick.
    pub async fn tick(&mut self) -> Result<StationTick> {
        let Some(assignment) = self.assignment else {
            debug!("Device {} is unassigned", self.identity);
            return Ok(StationTick::Unassigned);
        };

        let forwarded = self.relay_command(assignment).await;
        let (status, items_picked) = self.report_status(assignment).await?;

        Ok(StationTick::Reported {
            forwarded,
            status,
            items_picked,
        })
    }

    /// The cursor is committed once the command is sent or known to have no
    /// token. A failed send leaves it pending for the next tick.
    async fn relay_command(&mut self, assignment: StationAssignment) -> Option<CommandCode> {
        let command = match self
            .store
            .read_line_command(assignment.line_id, &mut self.cursor)
            .await
        {
            Ok(command) => command,
            Err(e) => {
                warn!("Failed to read command for line {}: {}", assignment.line_id, e);
                return None;
            }
        };
        if command.is_none() {
            self.cursor.commit();
            return None;
        }

        let Some(token) = command.token() else {
            info!("Command {} has no robot token; not sent", command);
            self.cursor.commit();
            return None;
        };
        match self.link.send_command(token).await {
            Ok(()) => {
                self.cursor.commit();
                Some(command)
            }
            Err(e) => {
                warn!("Failed to send {} to robot, retrying next tick: {}", command, e);
                None
            }
        }
    }

    async fn report_status(&mut self, assignment: StationAssignment) -> Result<(String, u32)> {
        let raw = self.link.read_status().await?;
        let reply = StatusReply::parse(&raw);
        if reply.is_malformed() {
            warn!("Station {}: {}", assignment.station_index, reply);
        }

        let (status, items_picked) = reply.report_or(self.last_picked.unwrap_or(0));
        let status = status.to_string();
        self.store
            .write_station_status(assignment, &status, items_picked)
            .await?;

        if let StatusReply::Report {
            items_picked: reported,
            ..
        } = reply
        {
            if self.last_picked.is_some_and(|previous| reported > previous) {
                record_pick(&self.store, assignment, reported).await;
            }
            self.last_picked = Some(reported);
        }
        Ok((status, items_picked))
    }
}

async fn record_pick<S>(store: &S, assignment: StationAssignment, items_picked: u32)
where
    S: StationStore + Sync,
{
    if let Err(e) = store
        .record_pick_event(assignment.station_index, Utc::now(), items_picked)
        .await
    {
        warn!(
            "Failed to record pick event for station {}: {}",
            assignment.station_index, e
        );
    }
}

impl<S, L> Supervised for RobotCommandAgent<S, L>
where
    S: StoreSession + StationStore + Send + Sync,
    L: RobotLink,
{
    fn label(&self) -> String {
        self.assignment.map_or_else(
            || format!("station agent {}", self.identity),
            |assignment| {
                format!(
                    "station {} on line {}",
                    assignment.station_index, assignment.line_id
                )
            },
        )
    }

    fn establish(&mut self) -> PortFuture<'_, ()> {
        Box::pin(RobotCommandAgent::establish(self))
    }

    fn tick(&mut self) -> PortFuture<'_, ()> {
        Box::pin(async move { RobotCommandAgent::tick(self).await.map(|_tick| ()) })
    }

    fn is_alive(&self) -> PortFuture<'_, bool> {
        let link_connected = self.link.is_connected();
        let store = &self.store;
        Box::pin(async move { Ok(link_connected && store.is_alive().await?) })
    }

    fn close(&mut self) -> PortFuture<'_, ()> {
        Box::pin(async move {
            if let Err(e) = self.link.close().await {
                warn!("Failed to close robot session: {}", e);
            }
            self.store.close().await
        })
    }
}
