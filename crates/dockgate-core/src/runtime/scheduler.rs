// crates/dockgate-core/src/runtime/scheduler.rs
// ============================================================================
// Module: Dockgate Action Scheduler
// Description: Countdown-delayed stop and restart as owned background tasks.
// Purpose: Run delayed actions without blocking the control surface.
// Dependencies: crate::{core, interfaces, runtime}, tokio, tracing
// ============================================================================

//! ## Overview
//! [`ActionScheduler::schedule`] announces a countdown, hands the rest of the
//! lifecycle to a task spawned on the process runtime, and returns a
//! [`ScheduleHandle`] for observing it. The task outlives the request that
//! created it and reports every milestone to the caller-supplied
//! [`NotificationSink`].
//!
//! At most one countdown is pending per target. Scheduling again while a
//! countdown is still announced replaces it: the old task ends in
//! [`ScheduleState::Cancelled`]. Once a task has claimed its slot and moved to
//! [`ScheduleState::Executing`] it runs to completion; a newer action for the
//! same target waits on the gateway's per-target lock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::info;
use tracing::warn;

use crate::core::ContainerIdentifier;
use crate::core::DelayedAction;
use crate::core::SanitizedMessage;
use crate::core::ScheduleError;
use crate::core::ScheduleId;
use crate::core::ScheduleState;
use crate::core::ScheduledAction;
use crate::interfaces::Notification;
use crate::interfaces::NotificationSink;
use crate::runtime::activity::ActivityLog;
use crate::runtime::gateway::ContainerGateway;

// ============================================================================
// SECTION: Countdown Text
// ============================================================================

/// Describes a delay in whole minutes, or seconds below one minute.
#[must_use]
pub fn describe_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    let (count, unit) = if secs >= 60 { (secs / 60, "minute") } else { (secs, "second") };
    if count == 1 { format!("1 {unit}") } else { format!("{count} {unit}s") }
}

/// Builds the countdown broadcast for `kind`.
#[must_use]
pub fn countdown_message(kind: DelayedAction, delay: Duration) -> String {
    let verb = match kind {
        DelayedAction::Stop => "shut down",
        DelayedAction::Restart => "restart",
    };
    format!("Server will {verb} in {}. Please prepare to log off.", describe_delay(delay))
}

// ============================================================================
// SECTION: Schedule Handle
// ============================================================================

/// Observer for one scheduled action.
#[derive(Debug, Clone)]
pub struct ScheduleHandle {
    /// Scheduled action identifier.
    pub id: ScheduleId,
    /// Delayed action kind.
    pub kind: DelayedAction,
    /// Target container.
    pub target: ContainerIdentifier,
    /// Broadcast countdown text.
    pub announcement: SanitizedMessage,
    /// State updates published by the task.
    state: watch::Receiver<ScheduleState>,
}

impl ScheduleHandle {
    /// Returns the latest published state.
    #[must_use]
    pub fn state(&self) -> ScheduleState {
        *self.state.borrow()
    }

    /// Waits until the state satisfies `predicate` and returns it.
    pub async fn wait_until(
        &mut self,
        predicate: impl FnMut(&ScheduleState) -> bool,
    ) -> ScheduleState {
        let waited = self.state.wait_for(predicate).await.map(|state| *state);
        waited.unwrap_or_else(|_| *self.state.borrow())
    }

    /// Waits for a terminal state.
    pub async fn finished(&mut self) -> ScheduleState {
        self.wait_until(|state| state.is_terminal()).await
    }
}

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// Pending countdown slot for a target.
#[derive(Debug)]
struct PendingEntry {
    /// Owning schedule.
    id: ScheduleId,
    /// Cancels the countdown when fired.
    cancel: oneshot::Sender<()>,
}

/// State shared between the scheduler and its tasks.
struct SchedulerShared {
    /// Gateway used for the delayed call and the in-target broadcast.
    gateway: Arc<ContainerGateway>,
    /// Activity log for operator-visible history.
    activity: Arc<ActivityLog>,
    /// Countdown length.
    delay: Duration,
    /// Pending countdowns by target.
    pending: Mutex<BTreeMap<ContainerIdentifier, PendingEntry>>,
    /// Next schedule identifier.
    next_id: AtomicU64,
    /// Countdown tasks not yet joined.
    tasks: Mutex<JoinSet<()>>,
}

/// Owner of countdown tasks.
#[derive(Clone)]
pub struct ActionScheduler {
    /// Shared state.
    shared: Arc<SchedulerShared>,
}

impl ActionScheduler {
    /// Creates a scheduler with a fixed countdown `delay`.
    #[must_use]
    pub fn new(gateway: Arc<ContainerGateway>, activity: Arc<ActivityLog>, delay: Duration) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                gateway,
                activity,
                delay,
                pending: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                tasks: Mutex::new(JoinSet::new()),
            }),
        }
    }

    /// Returns the countdown length.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Returns the pending countdowns by target.
    #[must_use]
    pub fn pending(&self) -> Vec<(ContainerIdentifier, ScheduleId)> {
        self.shared
            .pending
            .lock()
            .map(|pending| pending.iter().map(|(target, entry)| (target.clone(), entry.id)).collect())
            .unwrap_or_default()
    }

    /// Schedules `kind` on `target` and announces the countdown.
    ///
    /// The returned handle is already in [`ScheduleState::Announced`].
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NotAllowed`] for targets outside the
    /// allow-list and [`ScheduleError::NoRuntime`] outside a tokio runtime.
    pub fn schedule(
        &self,
        kind: DelayedAction,
        target: ContainerIdentifier,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<ScheduleHandle, ScheduleError> {
        if !self.shared.gateway.allow_list().contains(&target) {
            return Err(ScheduleError::NotAllowed);
        }
        let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;
        let id = ScheduleId::new(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let announcement = SanitizedMessage::new(&countdown_message(kind, self.shared.delay));
        let mut action =
            ScheduledAction::new(id, kind, target.clone(), self.shared.delay, announcement.clone());
        let (state_tx, state_rx) = watch::channel(action.state());
        let (cancel_tx, cancel_rx) = oneshot::channel();

        self.replace_pending(&target, PendingEntry {
            id,
            cancel: cancel_tx,
        });
        settle(
            &mut action,
            ScheduleState::Announced,
            announcement.as_str().to_string(),
            &state_tx,
            sink.as_ref(),
        );
        self.shared.activity.record(format!("{kind} {target} scheduled"));
        info!(schedule = %id, action = %kind, target = %target, "countdown announced");

        let shared = Arc::clone(&self.shared);
        let countdown = run_countdown(shared, action, cancel_rx, state_tx, sink);
        match self.shared.tasks.lock() {
            Ok(mut tasks) => {
                while tasks.try_join_next().is_some() {}
                tasks.spawn_on(countdown, &runtime);
            }
            Err(_) => {
                warn!(schedule = %id, "countdown task set poisoned; task is untracked");
                runtime.spawn(countdown);
            }
        }

        Ok(ScheduleHandle {
            id,
            kind,
            target,
            announcement,
            state: state_rx,
        })
    }

    /// Waits until every countdown scheduled so far, and any scheduled while
    /// waiting, has reached a terminal state.
    pub async fn drain(&self) {
        while let Some(mut tasks) = self.take_tasks() {
            while let Some(joined) = tasks.join_next().await {
                if let Err(err) = joined {
                    warn!(error = %err, "countdown task ended abnormally");
                }
            }
        }
    }

    /// Takes the tracked task set, or `None` when nothing is tracked.
    fn take_tasks(&self) -> Option<JoinSet<()>> {
        let mut tracked = self.shared.tasks.lock().ok()?;
        let tasks = std::mem::take(&mut *tracked);
        drop(tracked);
        (!tasks.is_empty()).then_some(tasks)
    }

    /// Installs `entry` for `target`, cancelling any earlier countdown.
    fn replace_pending(&self, target: &ContainerIdentifier, entry: PendingEntry) {
        let Ok(mut pending) = self.shared.pending.lock() else {
            warn!(target = %target, "pending countdown map poisoned");
            return;
        };
        if let Some(previous) = pending.insert(target.clone(), entry) {
            info!(schedule = %previous.id, target = %target, "replacing pending countdown");
            let _ = previous.cancel.send(());
        }
    }
}

// ============================================================================
// SECTION: Countdown Task
// ============================================================================

/// Drives one scheduled action from `Announced` to a terminal state.
async fn run_countdown(
    shared: Arc<SchedulerShared>,
    mut action: ScheduledAction,
    mut cancel: oneshot::Receiver<()>,
    state: watch::Sender<ScheduleState>,
    sink: Arc<dyn NotificationSink>,
) {
    let deadline = Instant::now() + action.delay;
    if let Err(err) = shared.gateway.announce_sanitized(&action.target, &action.announcement).await {
        warn!(schedule = %action.id, target = %action.target, error = %err, "in-target countdown broadcast failed");
    }

    let replaced = tokio::select! {
        () = tokio::time::sleep_until(deadline) => !claim(&shared, &action),
        _ = &mut cancel => true,
    };
    if replaced {
        let text = format!(
            "{} countdown for {} was replaced by a newer request.",
            action.kind.title(),
            action.target
        );
        settle(&mut action, ScheduleState::Cancelled, text, &state, sink.as_ref());
        return;
    }

    advance(&mut action, ScheduleState::Executing, &state);
    let timeout = shared.gateway.stop_timeout();
    let result = match action.kind {
        DelayedAction::Stop => shared.gateway.stop(&action.target, timeout).await,
        DelayedAction::Restart => shared.gateway.restart(&action.target, timeout).await,
    };
    let title = action.kind.title();
    let (next, text) = match result {
        Ok(outcome) => (ScheduleState::Completed, format!("{title} result: {}", outcome.as_str())),
        Err(err) => (ScheduleState::Failed, format!("{title} result: error: {err}")),
    };
    shared.activity.record(format!("{} {}: {}", action.kind, action.target, next));
    settle(&mut action, next, text, &state, sink.as_ref());
}

/// Removes the pending slot if it still belongs to `action`.
fn claim(shared: &SchedulerShared, action: &ScheduledAction) -> bool {
    let Ok(mut pending) = shared.pending.lock() else {
        return false;
    };
    if pending.get(&action.target).is_some_and(|entry| entry.id == action.id) {
        pending.remove(&action.target);
        return true;
    }
    false
}

/// Applies a transition, returning false when it is illegal.
fn apply(action: &mut ScheduledAction, next: ScheduleState) -> bool {
    if let Err(err) = action.transition(next) {
        warn!(schedule = %action.id, error = %err, "rejected schedule transition");
        return false;
    }
    info!(schedule = %action.id, target = %action.target, state = %next, "schedule transition");
    true
}

/// Applies a transition and publishes it.
fn advance(action: &mut ScheduledAction, next: ScheduleState, state: &watch::Sender<ScheduleState>) {
    if apply(action, next) {
        state.send_replace(next);
    }
}

/// Applies a transition, delivers `text` for it, then publishes it.
///
/// Watchers of the state channel never observe a state whose notification
/// has not reached the sink.
fn settle(
    action: &mut ScheduledAction,
    next: ScheduleState,
    text: String,
    state: &watch::Sender<ScheduleState>,
    sink: &dyn NotificationSink,
) {
    if apply(action, next) {
        deliver(sink, action, text);
        state.send_replace(next);
    }
}

/// Sends a notification for the current state, logging delivery failures.
fn deliver(sink: &dyn NotificationSink, action: &ScheduledAction, text: String) {
    let notification = Notification {
        id: action.id,
        target: action.target.clone(),
        kind: action.kind,
        state: action.state(),
        text,
    };
    if let Err(err) = sink.notify(&notification) {
        warn!(schedule = %action.id, error = %err, "notification delivery failed");
    }
}
