#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use super::conveyor::ConveyorGate;
use super::tracker::RobotStateTracker;
use crate::store::{LineStore, PortFuture, StoreSession};
use crate::supervisor::Supervised;
use crate::types::{CommandCode, LineId, LineStatus};
use crate::Result;
use tracing::{debug, info, warn};

pub const DEFAULT_LINE_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePhase {
    /// No pick cycle in flight.
    Idle,
    /// PICK was issued; waiting for every robot to reach the dropoff.
    Picking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    QuotaMet,
    ZeroRequested,
    PickIssued,
    DropIssued,
    Waiting,
}

/// Pick/drop state machine for one line.
pub struct LineCoordinator<S> {
    store: S,
    line_id: LineId,
    trackers: Vec<RobotStateTracker>,
    gate: ConveyorGate,
    phase: LinePhase,
    uncounted_drops: u32,
}

impl<S> LineCoordinator<S>
where
    S: StoreSession + LineStore + Send + Sync,
{
    #[must_use]
    pub const fn new(store: S, line_id: LineId, gate: ConveyorGate) -> Self {
        Self {
            store,
            line_id,
            trackers: Vec::new(),
            gate,
            phase: LinePhase::Idle,
            uncounted_drops: 0,
        }
    }

    #[must_use]
    pub const fn line_id(&self) -> LineId {
        self.line_id
    }

    #[must_use]
    pub const fn phase(&self) -> LinePhase {
        self.phase
    }

    /// Drops issued whose picked-count write has not landed yet.
    #[must_use]
    pub const fn uncounted_drops(&self) -> u32 {
        self.uncounted_drops
    }

    #[must_use]
    pub fn trackers(&self) -> &[RobotStateTracker] {
        &self.trackers
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Opens a fresh store session and rebuilds the robot roster.
    ///
    /// # Errors
    /// Store connect or roster read failures.
    pub async fn establish(&mut self) -> Result<()> {
        self.store.connect().await?;
        let roster = self.store.load_robot_roster(self.line_id).await?;
        if roster.is_empty() {
            warn!("Line {} has no robots; it will never be ready", self.line_id);
        }
        self.trackers = roster.into_iter().map(RobotStateTracker::new).collect();
        info!(
            "Line {} coordinating {} robot(s)",
            self.line_id,
            self.trackers.len()
        );
        Ok(())
    }

    /// An empty roster is never ready.
    #[must_use]
    pub fn ready_for_pick(&self) -> bool {
        self.all_robots(|tracker| tracker.state().is_ready()) && self.gate.is_ready()
    }

    #[must_use]
    pub fn ready_for_drop(&self) -> bool {
        self.all_robots(|tracker| tracker.state().is_at_dropoff()) && self.gate.is_ready()
    }

    #[must_use]
    pub fn needs_zero(&self) -> bool {
        self.trackers
            .iter()
            .any(|tracker| tracker.state().needs_zero())
    }

    fn all_robots(&self, predicate: impl Fn(&RobotStateTracker) -> bool) -> bool {
        !self.trackers.is_empty() && self.trackers.iter().all(predicate)
    }

    /// One poll of the line.
    ///
    /// # Errors
    /// Any store failure. Nothing is written for the tick once a read fails.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        for tracker in &mut self.trackers {
            tracker.refresh(&self.store, self.line_id).await?;
        }
        let mut status = self.store.read_line_status(self.line_id).await?;
        if self.uncounted_drops > 0 {
            status = self.count_drops(status).await?;
        }

        let outcome = if status.quota_met() {
            TickOutcome::QuotaMet
        } else {
            match self.phase {
                LinePhase::Idle => self.advance_idle().await?,
                LinePhase::Picking => self.advance_picking(status).await?,
            }
        };

        debug!(
            "Line {} tick: {:?} ({}/{} picked, {:?})",
            self.line_id, outcome, status.items_picked, status.items_to_pick, self.phase
        );
        Ok(outcome)
    }

    async fn advance_idle(&mut self) -> Result<TickOutcome> {
        if self.needs_zero() {
            self.issue(CommandCode::ZeroNeeded).await?;
            return Ok(TickOutcome::ZeroRequested);
        }
        if !self.ready_for_pick() {
            return Ok(TickOutcome::Waiting);
        }

        self.issue(CommandCode::Pick).await?;
        if let Err(e) = self.gate.trigger_index().await {
            warn!("Conveyor unavailable on line {}: {}", self.line_id, e);
        }
        self.phase = LinePhase::Picking;
        Ok(TickOutcome::PickIssued)
    }

    async fn advance_picking(&mut self, status: LineStatus) -> Result<TickOutcome> {
        if !self.ready_for_drop() {
            return Ok(TickOutcome::Waiting);
        }

        self.issue(CommandCode::Drop).await?;
        self.phase = LinePhase::Idle;
        self.uncounted_drops += 1;
        self.count_drops(status).await?;
        Ok(TickOutcome::DropIssued)
    }

    /// Adds every uncounted drop to the stored picked count. On failure the
    /// drops stay uncounted and are written again on the next tick.
    async fn count_drops(&mut self, status: LineStatus) -> Result<LineStatus> {
        let items_picked = status.items_picked.saturating_add(self.uncounted_drops);
        self.store
            .write_picked_count(self.line_id, items_picked)
            .await?;
        self.uncounted_drops = 0;
        info!(
            "Line {} picked {}/{}",
            self.line_id, items_picked, status.items_to_pick
        );
        Ok(LineStatus::new(status.items_to_pick, items_picked))
    }

    async fn issue(&self, command: CommandCode) -> Result<()> {
        self.store.write_command(self.line_id, command).await
    }
}

impl<S> Supervised for LineCoordinator<S>
where
    S: StoreSession + LineStore + Send + Sync,
{
    fn label(&self) -> String {
        format!("line {}", self.line_id)
    }

    fn establish(&mut self) -> PortFuture<'_, ()> {
        Box::pin(LineCoordinator::establish(self))
    }

    fn tick(&mut self) -> PortFuture<'_, ()> {
        Box::pin(async move { LineCoordinator::tick(self).await.map(|_outcome| ()) })
    }

    fn is_alive(&self) -> PortFuture<'_, bool> {
        self.store.is_alive()
    }

    fn close(&mut self) -> PortFuture<'_, ()> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::{LineCoordinator, LinePhase, TickOutcome};
    use crate::line::{ConveyorActuator, ConveyorGate, DisabledConveyor};
    use crate::store::{MemoryStore, PortFuture};
    use crate::types::{CommandCode, LineId, RobotId, RobotState, StationIndex};
    use crate::LineError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const LINE: LineId = LineId::new(3);
    const LEFT: RobotId = RobotId::new(1);
    const RIGHT: RobotId = RobotId::new(2);

    struct CountingConveyor {
        calls: Arc<AtomicU32>,
        fail: bool,
    }

    impl ConveyorActuator for CountingConveyor {
        fn index(&self) -> PortFuture<'_, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(LineError::ConveyorError("timed out".to_string()))
                } else {
                    Ok("ok".to_string())
                }
            })
        }
    }

    async fn two_robot_line(items_to_pick: u32) -> MemoryStore {
        MemoryStore::new()
            .with_line(LINE, items_to_pick, 0)
            .await
            .with_station(LEFT, LINE, StationIndex::new(0), "aa:01")
            .await
            .with_station(RIGHT, LINE, StationIndex::new(1), "aa:02")
            .await
    }

    fn open_gate() -> ConveyorGate {
        ConveyorGate::new(Box::new(DisabledConveyor), Duration::ZERO)
    }

    async fn coordinator(store: &MemoryStore) -> LineCoordinator<MemoryStore> {
        let mut coordinator = LineCoordinator::new(store.clone(), LINE, open_gate());
        coordinator.establish().await.unwrap();
        coordinator
    }

    async fn set_both(store: &MemoryStore, state: RobotState) {
        store.set_robot_status(LEFT, state.as_str()).await;
        store.set_robot_status(RIGHT, state.as_str()).await;
    }

    #[tokio::test]
    async fn establish_builds_one_tracker_per_robot() {
        let store = two_robot_line(1).await;
        let coordinator = coordinator(&store).await;

        let ids = coordinator
            .trackers()
            .iter()
            .map(|tracker| tracker.robot_id())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![LEFT, RIGHT]);
        assert!(coordinator
            .trackers()
            .iter()
            .all(|tracker| tracker.state() == RobotState::Error));
    }

    #[tokio::test]
    async fn lockstep_cycle_issues_pick_then_drop() {
        let store = two_robot_line(1).await;
        let mut coordinator = coordinator(&store).await;

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::Waiting);

        set_both(&store, RobotState::Ready).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::PickIssued);
        assert_eq!(coordinator.phase(), LinePhase::Picking);

        set_both(&store, RobotState::HasItem).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::Waiting);

        set_both(&store, RobotState::AtDropoffXyz).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::DropIssued);

        set_both(&store, RobotState::Ready).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::QuotaMet);

        assert_eq!(
            store.commands_issued(LINE).await,
            vec![CommandCode::Pick, CommandCode::Drop]
        );
        assert_eq!(store.line_status(LINE).await.unwrap().items_picked, 1);
        assert_eq!(coordinator.phase(), LinePhase::Idle);
    }

    #[tokio::test]
    async fn one_robot_not_ready_blocks_pick() {
        let store = two_robot_line(2).await;
        let mut coordinator = coordinator(&store).await;

        store.set_robot_status(LEFT, "PC_READY").await;
        store.set_robot_status(RIGHT, "PC_PROBING").await;

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::Waiting);
        assert!(!coordinator.ready_for_pick());
        assert!(store.commands_issued(LINE).await.is_empty());
    }

    #[tokio::test]
    async fn needs_zero_requests_zero_and_holds_pick() {
        let store = two_robot_line(2).await;
        let mut coordinator = coordinator(&store).await;

        store.set_robot_status(LEFT, "PC_READY").await;
        store.set_robot_status(RIGHT, "PC_NEEDS_ZERO").await;

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::ZeroRequested);
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::ZeroRequested);

        assert_eq!(coordinator.phase(), LinePhase::Idle);
        assert_eq!(
            store.commands_issued(LINE).await,
            vec![CommandCode::ZeroNeeded, CommandCode::ZeroNeeded]
        );
    }

    #[tokio::test]
    async fn garbled_status_blocks_drop() {
        let store = two_robot_line(2).await;
        let mut coordinator = coordinator(&store).await;
        set_both(&store, RobotState::Ready).await;
        coordinator.tick().await.unwrap();

        store.set_robot_status(LEFT, "PC_AT_DROPOFF_XYZ").await;
        store.set_robot_status(RIGHT, "").await;

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::Waiting);
        assert_eq!(coordinator.phase(), LinePhase::Picking);
        assert_eq!(store.commands_issued(LINE).await, vec![CommandCode::Pick]);
    }

    #[tokio::test]
    async fn quota_met_takes_no_action() {
        let store = two_robot_line(0).await;
        let mut coordinator = coordinator(&store).await;
        set_both(&store, RobotState::Ready).await;

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::QuotaMet);
        assert!(store.commands_issued(LINE).await.is_empty());
    }

    #[tokio::test]
    async fn empty_roster_is_never_ready() {
        let store = MemoryStore::new().with_line(LINE, 5, 0).await;
        let mut coordinator = LineCoordinator::new(store, LINE, open_gate());
        coordinator.establish().await.unwrap();

        assert!(!coordinator.ready_for_pick());
        assert!(!coordinator.ready_for_drop());
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::Waiting);
    }

    #[tokio::test]
    async fn conveyor_cooldown_holds_the_drop() {
        let store = two_robot_line(1).await;
        let calls = Arc::new(AtomicU32::new(0));
        let gate = ConveyorGate::new(
            Box::new(CountingConveyor {
                calls: Arc::clone(&calls),
                fail: false,
            }),
            Duration::from_secs(3_600),
        );
        let mut coordinator = LineCoordinator::new(store.clone(), LINE, gate);
        coordinator.establish().await.unwrap();

        set_both(&store, RobotState::Ready).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::PickIssued);
        set_both(&store, RobotState::AtDropoffXyz).await;

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::Waiting);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.commands_issued(LINE).await, vec![CommandCode::Pick]);
    }

    #[tokio::test]
    async fn conveyor_failure_does_not_abort_the_pick() {
        let store = two_robot_line(1).await;
        let calls = Arc::new(AtomicU32::new(0));
        let gate = ConveyorGate::new(
            Box::new(CountingConveyor {
                calls: Arc::clone(&calls),
                fail: true,
            }),
            Duration::ZERO,
        );
        let mut coordinator = LineCoordinator::new(store.clone(), LINE, gate);
        coordinator.establish().await.unwrap();
        set_both(&store, RobotState::Ready).await;

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::PickIssued);
        assert_eq!(coordinator.phase(), LinePhase::Picking);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_line_fails_the_tick_loudly() {
        let store = MemoryStore::new()
            .with_station(LEFT, LINE, StationIndex::new(0), "aa:01")
            .await;
        let mut coordinator = LineCoordinator::new(store, LINE, open_gate());
        coordinator.establish().await.unwrap();

        let result = coordinator.tick().await;

        assert!(matches!(&result, Err(LineError::LineNotFound(id)) if *id == LINE));
        assert!(result.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn failed_count_write_is_applied_on_the_next_tick() {
        let store = two_robot_line(2).await;
        let mut coordinator = coordinator(&store).await;
        set_both(&store, RobotState::Ready).await;
        coordinator.tick().await.unwrap();
        set_both(&store, RobotState::AtDropoffXyz).await;
        store
            .fail_next_count_write(LineError::DatabaseError("lock timeout".to_string()))
            .await;

        assert!(coordinator.tick().await.is_err());
        assert_eq!(coordinator.phase(), LinePhase::Idle);
        assert_eq!(coordinator.uncounted_drops(), 1);
        assert_eq!(store.line_status(LINE).await.unwrap().items_picked, 0);

        set_both(&store, RobotState::Ready).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::PickIssued);
        assert_eq!(coordinator.uncounted_drops(), 0);
        assert_eq!(store.line_status(LINE).await.unwrap().items_picked, 1);

        set_both(&store, RobotState::AtDropoffXyz).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::DropIssued);
        set_both(&store, RobotState::Ready).await;
        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::QuotaMet);
        assert_eq!(store.line_status(LINE).await.unwrap().items_picked, 2);
        assert_eq!(
            store.commands_issued(LINE).await,
            vec![
                CommandCode::Pick,
                CommandCode::Drop,
                CommandCode::Pick,
                CommandCode::Drop,
            ]
        );
    }

    #[tokio::test]
    async fn read_failure_writes_nothing() {
        let store = two_robot_line(1).await;
        let mut coordinator = coordinator(&store).await;
        set_both(&store, RobotState::Ready).await;
        store
            .fail_next_read(LineError::DatabaseError("deadlock".to_string()))
            .await;

        assert!(coordinator.tick().await.is_err());
        assert!(store.commands_issued(LINE).await.is_empty());

        assert_eq!(coordinator.tick().await.unwrap(), TickOutcome::PickIssued);
    }
}
