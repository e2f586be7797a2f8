//! Integration tests for the alert monitor.
//!
//! These drive the monitor against the in-memory task store with a manual
//! clock, stepping time minute by minute.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use focusai_core::alerts::LedgerRetention;
use focusai_core::{
    Alert, AlertMonitor, AlertPresenter, Clock, ManualClock, MemoryTaskStore, MonitorSettings,
    Priority, Severity, Task, TaskStore,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
}

struct Harness {
    clock: Arc<ManualClock>,
    store: Arc<MemoryTaskStore>,
    monitor: Arc<AlertMonitor>,
    seen: Arc<Mutex<Vec<Alert>>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_settings(MonitorSettings::default())
    }

    fn with_settings(settings: MonitorSettings) -> Self {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(MemoryTaskStore::new(clock.clone()));
        let monitor = Arc::new(AlertMonitor::new(store.clone(), clock.clone(), settings));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        monitor.subscribe(move |alert| sink.lock().unwrap().push(alert.clone()));
        Self {
            clock,
            store,
            monitor,
            seen,
        }
    }

    fn add(&self, id: &str, due: Option<DateTime<Utc>>) {
        self.store.insert(Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: None,
            completed: false,
            priority: Priority::High,
            due_date: due,
            category: "work".into(),
            completed_at: None,
            created_at: t0(),
            updated_at: t0(),
            is_overdue: None,
        });
    }

    fn due_in(&self, id: &str, minutes: i64) {
        self.add(id, Some(self.clock.now() + Duration::minutes(minutes)));
    }

    fn seen(&self) -> Vec<Alert> {
        self.seen.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_task_due_in_four_minutes_is_critical() {
    let h = Harness::new();
    h.due_in("T1", 4);

    let report = h.monitor.trigger_check().await;

    assert_eq!(report.fired.len(), 1);
    let alert = &h.seen()[0];
    assert_eq!(alert.task.id, "T1");
    assert_eq!(alert.severity, Severity::Critical);
    assert_eq!(alert.minutes_until_due, 4);
}

#[tokio::test]
async fn test_overdue_and_undated_tasks_never_alert() {
    let h = Harness::new();
    h.due_in("T2", -1);
    h.add("undated", None);
    h.add("due-now", Some(t0() + Duration::seconds(30)));

    for _ in 0..20 {
        h.monitor.trigger_check().await;
        h.clock.advance(Duration::minutes(1));
    }

    assert!(h.seen().is_empty());
}

#[tokio::test]
async fn test_far_task_alerts_once_it_enters_the_window() {
    let h = Harness::new();
    h.due_in("T3", 20);

    h.monitor.trigger_check().await;
    assert!(h.seen().is_empty());

    h.clock.advance(Duration::minutes(5));
    h.monitor.trigger_check().await;
    let seen = h.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].minutes_until_due, 15);
    assert_eq!(seen[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_same_bucket_does_not_refire_but_next_bucket_does() {
    let h = Harness::new();
    h.due_in("T1", 12);

    h.monitor.trigger_check().await;
    h.clock.advance(Duration::minutes(2)); // 10 left, still bucket 2
    h.monitor.trigger_check().await;
    assert_eq!(h.seen().len(), 1);

    h.clock.advance(Duration::minutes(2)); // 8 left, bucket 1
    h.monitor.trigger_check().await;
    let seen = h.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].minutes_until_due, 8);
    assert_eq!(seen[1].severity, Severity::Urgent);
}

#[tokio::test]
async fn test_minute_by_minute_walk_escalates_four_times() {
    let h = Harness::new();
    h.due_in("T1", 16);

    for _ in 0..20 {
        h.monitor.trigger_check().await;
        h.clock.advance(Duration::minutes(1));
    }

    let minutes: Vec<i64> = h.seen().iter().map(|a| a.minutes_until_due).collect();
    assert_eq!(minutes, vec![15, 14, 9, 4]);
    let severities: Vec<Severity> = h.seen().iter().map(|a| a.severity).collect();
    assert_eq!(
        severities,
        vec![
            Severity::Warning,
            Severity::Warning,
            Severity::Urgent,
            Severity::Critical
        ]
    );
}

#[tokio::test]
async fn test_clear_alert_refires_in_same_bucket() {
    let h = Harness::new();
    h.due_in("T1", 12);
    h.due_in("T10", 12);

    h.monitor.trigger_check().await;
    assert_eq!(h.seen().len(), 2);

    assert_eq!(h.monitor.clear_alert("T1"), 1);
    h.monitor.trigger_check().await;

    let seen = h.seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2].task.id, "T1");
    assert_eq!(h.monitor.ledger_keys(), vec!["T1-2", "T10-2"]);
}

#[tokio::test]
async fn test_fetch_failure_skips_cycle_only() {
    let h = Harness::new();
    h.due_in("T1", 4);
    h.store.set_offline(true);

    let report = h.monitor.trigger_check().await;
    assert!(report.error.is_some());
    assert!(h.seen().is_empty());

    h.store.set_offline(false);
    let report = h.monitor.trigger_check().await;
    assert!(report.is_ok());
    assert_eq!(h.seen().len(), 1);
}

#[tokio::test]
async fn test_subscribers_run_in_registration_order() {
    let h = Harness::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b"] {
        let order = Arc::clone(&order);
        h.monitor.subscribe(move |alert| {
            order.lock().unwrap().push(format!("{tag}:{}", alert.task.id));
        });
    }
    h.due_in("T1", 4);
    h.due_in("T2", 8);

    h.monitor.trigger_check().await;

    assert_eq!(
        *order.lock().unwrap(),
        vec!["a:T1", "b:T1", "a:T2", "b:T2"]
    );
}

#[tokio::test]
async fn test_unsubscribed_callback_stops_receiving() {
    let h = Harness::new();
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    let id = h.monitor.subscribe(move |_| *counter.lock().unwrap() += 1);

    h.due_in("T1", 4);
    h.monitor.trigger_check().await;
    assert!(h.monitor.unsubscribe(id));
    assert!(!h.monitor.unsubscribe(id));

    h.due_in("T2", 4);
    h.monitor.trigger_check().await;
    assert_eq!(*count.lock().unwrap(), 1);
    assert_eq!(h.seen().len(), 2);
}

#[tokio::test]
async fn test_complete_from_presenter_never_realerts() {
    let h = Harness::new();
    h.due_in("T1", 12);
    h.monitor.trigger_check().await;

    let mut presenter = AlertPresenter::default();
    presenter.show(h.seen()[0].clone(), h.clock.now());
    presenter.complete(&h.monitor).await.unwrap();

    assert!(h.store.get("T1").unwrap().completed);
    assert_eq!(h.monitor.ledger_len(), 0);

    for _ in 0..15 {
        h.clock.advance(Duration::minutes(1));
        h.monitor.trigger_check().await;
    }
    assert_eq!(h.seen().len(), 1);
}

#[tokio::test]
async fn test_failed_complete_keeps_alert_and_ledger() {
    let h = Harness::new();
    h.due_in("T1", 4);
    h.monitor.trigger_check().await;

    let mut presenter = AlertPresenter::default();
    presenter.show(h.seen()[0].clone(), h.clock.now());
    h.store.set_offline(true);

    assert!(presenter.complete(&h.monitor).await.is_err());
    assert_eq!(presenter.current().map(|a| a.task.id.as_str()), Some("T1"));
    assert_eq!(h.monitor.ledger_keys(), vec!["T1-0"]);
    assert!(!h.store.get("T1").unwrap().completed);
}

#[tokio::test]
async fn test_dismiss_keeps_bucket_suppressed() {
    let h = Harness::new();
    h.due_in("T1", 14);
    h.monitor.trigger_check().await;

    let mut presenter = AlertPresenter::default();
    presenter.show(h.seen()[0].clone(), h.clock.now());
    presenter.dismiss().unwrap();

    h.clock.advance(Duration::minutes(1));
    h.monitor.trigger_check().await;
    assert_eq!(h.seen().len(), 1);
}

#[tokio::test]
async fn test_snooze_from_presenter_defers_next_alert() {
    let h = Harness::new();
    h.due_in("T1", 14);
    h.monitor.trigger_check().await;

    let mut presenter = AlertPresenter::default();
    presenter.show(h.seen()[0].clone(), h.clock.now());
    assert!(presenter.snooze(7, &h.monitor).is_err());
    presenter.snooze(10, &h.monitor).unwrap();
    assert!(presenter.current().is_none());

    // Bucket 1 passes while snoozed.
    for _ in 0..9 {
        h.clock.advance(Duration::minutes(1));
        h.monitor.trigger_check().await;
    }
    assert_eq!(h.seen().len(), 1);

    h.clock.advance(Duration::minutes(1)); // snooze lapses, 4 left
    h.monitor.trigger_check().await;
    let seen = h.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].severity, Severity::Critical);
}

#[tokio::test]
async fn test_retention_prunes_deleted_tasks() {
    let h = Harness::new();
    h.due_in("T1", 4);
    h.due_in("T2", 4);
    h.monitor.trigger_check().await;
    assert_eq!(h.monitor.ledger_len(), 2);

    h.store.delete_task("T1").await.unwrap();
    let report = h.monitor.trigger_check().await;
    assert_eq!(report.pruned, 1);
    assert_eq!(h.monitor.ledger_keys(), vec!["T2-0"]);
}

#[tokio::test]
async fn test_unbounded_retention_keeps_history() {
    let h = Harness::with_settings(MonitorSettings {
        retention: LedgerRetention::Unbounded,
        ..MonitorSettings::default()
    });
    h.due_in("T1", 4);
    h.monitor.trigger_check().await;
    h.store.delete_task("T1").await.unwrap();
    h.monitor.trigger_check().await;
    assert_eq!(h.monitor.ledger_keys(), vec!["T1-0"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_schedule_but_manual_checks_work() {
    let h = Harness::new();
    h.due_in("T1", 30);

    assert!(h.monitor.start_monitoring().await);
    assert_eq!(h.store.fetch_count(), 1);

    tokio::time::sleep(StdDuration::from_secs(61)).await;
    assert_eq!(h.store.fetch_count(), 2);

    assert!(h.monitor.stop_monitoring());
    tokio::time::sleep(StdDuration::from_secs(600)).await;
    assert_eq!(h.store.fetch_count(), 2);

    h.clock.advance(Duration::minutes(20));
    h.monitor.trigger_check().await;
    assert_eq!(h.store.fetch_count(), 3);
    assert_eq!(h.seen().len(), 1);

    assert!(h.monitor.start_monitoring().await);
    assert_eq!(h.store.fetch_count(), 4);
    h.monitor.stop_monitoring();
}

#[tokio::test(start_paused = true)]
async fn test_stop_keeps_ledger() {
    let h = Harness::new();
    h.due_in("T1", 4);
    h.monitor.start_monitoring().await;
    h.monitor.stop_monitoring();

    assert_eq!(h.monitor.ledger_len(), 1);
    h.monitor.trigger_check().await;
    assert_eq!(h.seen().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_schedule_survives_fetch_failures() {
    let h = Harness::new();
    h.store.set_offline(true);
    h.monitor.start_monitoring().await;

    tokio::time::sleep(StdDuration::from_secs(150)).await;
    assert_eq!(h.store.fetch_count(), 3);
    assert!(h.monitor.is_running());

    h.store.set_offline(false);
    h.due_in("T1", 4);
    tokio::time::sleep(StdDuration::from_secs(60)).await;
    assert_eq!(h.seen().len(), 1);
    h.monitor.stop_monitoring();
}
