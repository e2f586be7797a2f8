//! Due-task alert engine.
//!
//! ## Architecture
//!
//! ```text
//!  AlertMonitor ──get_tasks──> TaskStore
//!      │  classify (minutes until due → Severity)
//!      │  AlertLedger (task, 5-minute bucket) dedup
//!      └─dispatch──> SubscriberRegistry ──> AlertPresenter
//!                                              │ complete / dismiss / snooze
//!                                              └──> AlertMonitor / TaskStore
//! ```
//!
//! An alert fires at most once per task per bucket. Buckets are 5 minutes
//! wide, so a task that sits pending through its last quarter hour is
//! announced up to four times, at rising severity.

mod classifier;
mod ledger;
mod monitor;
mod presenter;
mod registry;

pub use classifier::{
    bucket, classify, minutes_until_due, Severity, SeverityProfile, ALERT_WINDOW_MINUTES,
    BUCKET_MINUTES,
};
pub use ledger::{AlertLedger, LedgerKey, LedgerRetention};
pub use monitor::{AlertMonitor, CycleReport, MonitorSettings};
pub use presenter::{AlertPresenter, PresenterEvent};
pub use registry::{AlertCallback, SubscriberRegistry, SubscriptionId};

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// A task nearing its due time. Built fresh on every monitor cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub task: Task,
    /// Whole minutes left, always in `1..=15`.
    pub minutes_until_due: i64,
    pub severity: Severity,
}

impl Alert {
    /// The ledger entry this alert occupies.
    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::new(self.task.id.clone(), bucket(self.minutes_until_due))
    }

    pub fn profile(&self) -> &'static SeverityProfile {
        self.severity.profile()
    }
}
