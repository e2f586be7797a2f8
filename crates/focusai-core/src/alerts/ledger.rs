//! Deduplication ledger: which (task, bucket) alerts have already fired.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How long ledger entries live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerRetention {
    /// After each successful cycle, drop entries for tasks that are no longer
    /// in the pending set (completed, deleted, or undated).
    #[default]
    PendingOnly,
    /// Keep entries until cleared explicitly.
    Unbounded,
}

/// One fired alert: task id plus 5-minute bucket.
///
/// Renders as `"<taskId>-<bucket>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    task_id: String,
    bucket: i64,
}

impl LedgerKey {
    pub fn new(task_id: impl Into<String>, bucket: i64) -> Self {
        Self {
            task_id: task_id.into(),
            bucket,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn bucket(&self) -> i64 {
        self.bucket
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.task_id, self.bucket)
    }
}

/// Set of alerts already delivered. No capacity bound; pruning is the
/// caller's job via [`AlertLedger::remove_task`] and
/// [`AlertLedger::retain_tasks`].
#[derive(Debug, Clone, Default)]
pub struct AlertLedger {
    keys: HashSet<LedgerKey>,
}

impl AlertLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: &LedgerKey) -> bool {
        self.keys.contains(key)
    }

    /// Returns `false` if the key was already present.
    pub fn add(&mut self, key: LedgerKey) -> bool {
        self.keys.insert(key)
    }

    /// Remove every bucket recorded for `task_id`. Returns how many went.
    ///
    /// Matches the task id exactly, so clearing `"ab"` leaves `"abc"` alone.
    pub fn remove_task(&mut self, task_id: &str) -> usize {
        let before = self.keys.len();
        self.keys.retain(|key| key.task_id != task_id);
        before - self.keys.len()
    }

    /// Keep only entries whose task id satisfies `keep`. Returns how many went.
    pub fn retain_tasks<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.keys.len();
        self.keys.retain(|key| keep(&key.task_id));
        before - self.keys.len()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Rendered keys, sorted, for diagnostics.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        keys.sort();
        keys
    }
}
