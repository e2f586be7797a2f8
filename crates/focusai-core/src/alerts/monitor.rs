//! Periodic due-task monitor.
//!
//! One cycle: fetch pending tasks, classify each dated one, skip anything
//! snoozed or already in the ledger, record the rest and hand them to
//! subscribers. Cycles never overlap; a scheduled tick that lands while a
//! manual check is running waits for it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{
    bucket, classify, minutes_until_due, Alert, AlertLedger, LedgerKey, LedgerRetention,
    SubscriberRegistry, SubscriptionId,
};
use crate::clock::Clock;
use crate::error::AlertError;
use crate::storage::AlertsConfig;
use crate::store::TaskStore;
use crate::task::{Task, TaskQuery};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Monitor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub retention: LedgerRetention,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            retention: LedgerRetention::default(),
        }
    }
}

impl From<&AlertsConfig> for MonitorSettings {
    fn from(config: &AlertsConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs.max(1)),
            retention: config.retention,
        }
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Clock reading the cycle evaluated against.
    pub at: DateTime<Utc>,
    /// Pending tasks returned by the store.
    pub fetched: usize,
    /// Alerts delivered this cycle, in store order.
    pub fired: Vec<Alert>,
    /// Ledger entries dropped by retention.
    pub pruned: usize,
    /// Set when the fetch failed and the cycle was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CycleReport {
    fn failed(at: DateTime<Utc>, error: String) -> Self {
        Self {
            at,
            fetched: 0,
            fired: Vec::new(),
            pruned: 0,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Default)]
struct MonitorState {
    ledger: AlertLedger,
    /// Task id -> instant the snooze lapses.
    snoozes: HashMap<String, DateTime<Utc>>,
}

impl MonitorState {
    /// True while `task_id` is snoozed. A lapsed snooze is removed here and
    /// the task's ledger entries go with it, so the task alerts again.
    fn is_snoozed(&mut self, task_id: &str, now: DateTime<Utc>) -> bool {
        match self.snoozes.get(task_id) {
            Some(until) if *until > now => true,
            Some(_) => {
                self.snoozes.remove(task_id);
                let cleared = self.ledger.remove_task(task_id);
                debug!(task_id, cleared, "snooze lapsed");
                false
            }
            None => false,
        }
    }
}

struct Schedule {
    stop: watch::Sender<bool>,
    // Detached on stop so an in-flight cycle runs to completion.
    _task: JoinHandle<()>,
}

/// The alert engine.
///
/// Shared behind an `Arc`; every method takes `&self` and is safe to call
/// from any task or thread.
pub struct AlertMonitor {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    state: Mutex<MonitorState>,
    subscribers: SubscriberRegistry,
    schedule: Mutex<Option<Schedule>>,
    cycle_gate: tokio::sync::Mutex<()>,
}

impl AlertMonitor {
    pub fn new(
        store: Arc<dyn TaskStore>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            store,
            clock,
            settings,
            state: Mutex::new(MonitorState::default()),
            subscribers: SubscriberRegistry::new(),
            schedule: Mutex::new(None),
            cycle_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    /// Start periodic checking and run the first cycle immediately.
    ///
    /// Returns `false` without doing anything if monitoring is already on.
    /// Must be called from within a Tokio runtime.
    pub async fn start_monitoring(self: &Arc<Self>) -> bool {
        {
            let mut schedule = self.schedule_lock();
            if schedule.is_some() {
                debug!("monitoring already running");
                return false;
            }
            let (stop, stop_rx) = watch::channel(false);
            let task = tokio::spawn(Arc::clone(self).run_schedule(stop_rx));
            *schedule = Some(Schedule { stop, _task: task });
        }
        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            "started due-task monitoring"
        );
        self.run_cycle().await;
        true
    }

    /// Cancel future cycles. A cycle already in progress finishes.
    ///
    /// Returns `false` if monitoring was not running.
    pub fn stop_monitoring(&self) -> bool {
        let Some(schedule) = self.schedule_lock().take() else {
            return false;
        };
        // The loop may already be gone; nothing to signal then.
        let _ = schedule.stop.send(true);
        info!("stopped due-task monitoring");
        true
    }

    pub fn is_running(&self) -> bool {
        self.schedule_lock().is_some()
    }

    /// Run one cycle now, outside the schedule. Deduplication still applies.
    pub async fn trigger_check(&self) -> CycleReport {
        self.run_cycle().await
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Forget every ledger entry for `task_id` so it may alert again.
    /// Returns the number of entries removed.
    pub fn clear_alert(&self, task_id: &str) -> usize {
        let cleared = self.state_lock().ledger.remove_task(task_id);
        debug!(task_id, cleared, "cleared alert history");
        cleared
    }

    /// Suppress alerts for `task_id` for `minutes`. When the snooze lapses the
    /// task's ledger entries are cleared, so the next cycle inside the window
    /// alerts again. Snoozing an already snoozed task restarts the period.
    pub fn snooze(&self, task_id: &str, minutes: u32) -> Result<DateTime<Utc>, AlertError> {
        if minutes == 0 {
            return Err(AlertError::InvalidSnooze { minutes });
        }
        let until = self.clock.now() + chrono::Duration::minutes(i64::from(minutes));
        self.state_lock().snoozes.insert(task_id.to_string(), until);
        info!(task_id, minutes, until = %until, "snoozed task alerts");
        Ok(until)
    }

    /// End of the current snooze for `task_id`, if one is recorded.
    pub fn snoozed_until(&self, task_id: &str) -> Option<DateTime<Utc>> {
        self.state_lock().snoozes.get(task_id).copied()
    }

    pub fn ledger_len(&self) -> usize {
        self.state_lock().ledger.len()
    }

    /// Rendered ledger keys, sorted.
    pub fn ledger_keys(&self) -> Vec<String> {
        self.state_lock().ledger.keys()
    }

    async fn run_schedule(self: Arc<Self>, mut stop: watch::Receiver<bool>) {
        let period = self.settings.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if *stop.borrow() {
                        break;
                    }
                    self.run_cycle().await;
                }
            }
        }
        debug!("monitor schedule exited");
    }

    async fn run_cycle(&self) -> CycleReport {
        let _gate = self.cycle_gate.lock().await;

        let tasks = match self.store.get_tasks(&TaskQuery::pending()).await {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "failed to fetch pending tasks, skipping check");
                return CycleReport::failed(self.clock.now(), err.to_string());
            }
        };

        let now = self.clock.now();
        let (fired, pruned) = self.evaluate(&tasks, now);

        for alert in &fired {
            info!(
                task_id = %alert.task.id,
                title = %alert.task.title,
                minutes = alert.minutes_until_due,
                severity = %alert.severity,
                "task due soon"
            );
            self.subscribers.dispatch(alert);
        }
        debug!(
            fetched = tasks.len(),
            fired = fired.len(),
            pruned,
            "alert check finished"
        );

        CycleReport {
            at: now,
            fetched: tasks.len(),
            fired,
            pruned,
            error: None,
        }
    }

    /// Classify and record under the state lock. Subscribers run after it is
    /// released.
    fn evaluate(&self, tasks: &[Task], now: DateTime<Utc>) -> (Vec<Alert>, usize) {
        let mut state = self.state_lock();
        let mut fired = Vec::new();

        for task in tasks {
            if task.completed {
                continue;
            }
            let Some(due) = task.due_date else {
                continue;
            };
            if state.is_snoozed(&task.id, now) {
                debug!(task_id = %task.id, "task snoozed");
                continue;
            }
            let minutes = minutes_until_due(due, now);
            let Some(severity) = classify(minutes) else {
                continue;
            };
            let key = LedgerKey::new(task.id.clone(), bucket(minutes));
            if state.ledger.has(&key) {
                debug!(key = %key, "already alerted for this bucket");
                continue;
            }
            state.ledger.add(key);
            fired.push(Alert {
                task: task.clone(),
                minutes_until_due: minutes,
                severity,
            });
        }

        let pruned = match self.settings.retention {
            LedgerRetention::PendingOnly => {
                let pending: HashSet<&str> = tasks
                    .iter()
                    .filter(|t| t.is_alertable())
                    .map(|t| t.id.as_str())
                    .collect();
                state.snoozes.retain(|id, _| pending.contains(id.as_str()));
                state.ledger.retain_tasks(|id| pending.contains(id))
            }
            LedgerRetention::Unbounded => 0,
        };

        (fired, pruned)
    }

    fn state_lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule_lock(&self) -> MutexGuard<'_, Option<Schedule>> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
