//! Single-slot alert presenter.
//!
//! Holds at most one alert. A newer alert replaces the current one and
//! restarts the countdown. Time is passed in by the caller, so the same
//! state machine drives a terminal UI or a test.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Alert, AlertMonitor};
use crate::error::AlertError;
use crate::storage::AlertsConfig;
use crate::task::TaskUpdate;

const DEFAULT_COUNTDOWN_SECS: u64 = 10;
const MAX_COUNTDOWN_SECS: u64 = 3_600;
const DEFAULT_SNOOZE_OPTIONS: [u32; 3] = [5, 10, 15];

/// Outcome of a presenter action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PresenterEvent {
    Completed { task_id: String },
    Dismissed { task_id: String },
    AutoDismissed { task_id: String },
    Snoozed { task_id: String, until: DateTime<Utc> },
}

impl PresenterEvent {
    pub fn task_id(&self) -> &str {
        match self {
            PresenterEvent::Completed { task_id }
            | PresenterEvent::Dismissed { task_id }
            | PresenterEvent::AutoDismissed { task_id }
            | PresenterEvent::Snoozed { task_id, .. } => task_id,
        }
    }
}

#[derive(Debug, Clone)]
struct Shown {
    alert: Alert,
    deadline: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AlertPresenter {
    countdown: Duration,
    snooze_options: Vec<u32>,
    current: Option<Shown>,
}

impl Default for AlertPresenter {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS, DEFAULT_SNOOZE_OPTIONS.to_vec())
    }
}

impl AlertPresenter {
    pub fn new(countdown_secs: u64, snooze_options: Vec<u32>) -> Self {
        // Bounded above, so the cast cannot truncate.
        let secs = countdown_secs.min(MAX_COUNTDOWN_SECS) as i64;
        Self {
            countdown: Duration::seconds(secs),
            snooze_options,
            current: None,
        }
    }

    pub fn from_config(config: &AlertsConfig) -> Self {
        Self::new(config.countdown_secs, config.snooze_options.clone())
    }

    pub fn snooze_options(&self) -> &[u32] {
        &self.snooze_options
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref().map(|shown| &shown.alert)
    }

    /// Put `alert` on screen. Returns the alert it displaced, if any.
    pub fn show(&mut self, alert: Alert, now: DateTime<Utc>) -> Option<Alert> {
        debug!(task_id = %alert.task.id, severity = %alert.severity, "showing alert");
        let shown = Shown {
            alert,
            deadline: now + self.countdown,
        };
        self.current.replace(shown).map(|old| old.alert)
    }

    /// Whole seconds left before auto-dismiss, rounded up. Zero when idle.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> u64 {
        let Some(shown) = &self.current else {
            return 0;
        };
        let millis = (shown.deadline - now).num_milliseconds();
        if millis <= 0 {
            return 0;
        }
        u64::try_from((millis + 999) / 1_000).unwrap_or(0)
    }

    /// Advance the countdown. Auto-dismisses once it reaches zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<PresenterEvent> {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|shown| now >= shown.deadline);
        if !expired {
            return None;
        }
        let shown = self.current.take()?;
        debug!(task_id = %shown.alert.task.id, "alert auto-dismissed");
        Some(PresenterEvent::AutoDismissed {
            task_id: shown.alert.task.id,
        })
    }

    /// Mark the shown task complete in the store, then clear its alert
    /// history. On failure the alert stays up so the user can retry.
    pub async fn complete(&mut self, monitor: &AlertMonitor) -> Result<PresenterEvent, AlertError> {
        let task_id = self
            .current()
            .map(|alert| alert.task.id.clone())
            .ok_or(AlertError::NoActiveAlert)?;

        if let Err(err) = monitor
            .store()
            .update_task(&task_id, &TaskUpdate::complete())
            .await
        {
            warn!(task_id = %task_id, error = %err, "failed to complete task");
            return Err(err.into());
        }

        monitor.clear_alert(&task_id);
        self.current = None;
        info!(task_id = %task_id, "task completed from alert");
        Ok(PresenterEvent::Completed { task_id })
    }

    /// Hide the alert. Its ledger entry stays, so the same bucket will not
    /// alert again.
    pub fn dismiss(&mut self) -> Result<PresenterEvent, AlertError> {
        let shown = self.current.take().ok_or(AlertError::NoActiveAlert)?;
        debug!(task_id = %shown.alert.task.id, "alert dismissed");
        Ok(PresenterEvent::Dismissed {
            task_id: shown.alert.task.id,
        })
    }

    /// Hide the alert and snooze its task. `minutes` must be one of the
    /// configured options.
    pub fn snooze(
        &mut self,
        minutes: u32,
        monitor: &AlertMonitor,
    ) -> Result<PresenterEvent, AlertError> {
        if !self.snooze_options.contains(&minutes) {
            return Err(AlertError::InvalidSnooze { minutes });
        }
        let task_id = self
            .current()
            .map(|alert| alert.task.id.clone())
            .ok_or(AlertError::NoActiveAlert)?;
        let until = monitor.snooze(&task_id, minutes)?;
        self.current = None;
        Ok(PresenterEvent::Snoozed { task_id, until })
    }

    /// Plain-text card for the shown alert.
    pub fn render(&self, now: DateTime<Utc>) -> Option<String> {
        let alert = self.current()?;
        let profile = alert.profile();
        let task = &alert.task;
        let minutes = alert.minutes_until_due;

        let mut out = String::new();
        let _ = writeln!(out, "{} {}", profile.icon, profile.headline);
        let _ = writeln!(out, "{}", task.title);
        if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "{description}");
        }
        let _ = writeln!(
            out,
            "{} {} minute{}  [{} priority]",
            profile.urgency_text,
            minutes,
            if minutes == 1 { "" } else { "s" },
            task.priority
        );
        if let Some(due) = task.due_date {
            let _ = writeln!(out, "Due: {}", due.format("%Y-%m-%d %H:%M UTC"));
        }
        if !profile.tips.is_empty() {
            let _ = writeln!(out, "Quick tips:");
            for tip in profile.tips {
                let _ = writeln!(out, "  - {tip}");
            }
        }
        let options: Vec<String> = self.snooze_options.iter().map(|m| format!("{m}m")).collect();
        let _ = writeln!(
            out,
            "[c]omplete  [d]ismiss  [s]nooze ({})  auto-dismiss in {}s",
            options.join("/"),
            self.seconds_remaining(now)
        );
        Some(out)
    }
}
