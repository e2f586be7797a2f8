//! Due-task alert commands for CLI.

use std::error::Error;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Subcommand;
use focusai_core::{
    Alert, AlertMonitor, AlertPresenter, Clock, Config, MemoryTaskStore, MonitorSettings, NewTask,
    PresenterEvent, Priority, SystemClock, TaskStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{effective_config, http_store, print_json, runtime, CommandResult};

#[derive(Subcommand)]
pub enum AlertsAction {
    /// Run one check and print the alerts it fires
    Check {
        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
        /// Use built-in sample tasks instead of the API
        #[arg(long)]
        demo: bool,
    },
    /// Monitor continuously and present alerts until Ctrl-C
    Watch {
        /// Use built-in sample tasks instead of the API
        #[arg(long)]
        demo: bool,
    },
}

pub fn run(action: AlertsAction) -> CommandResult {
    let config = effective_config();
    let rt = runtime()?;
    match action {
        AlertsAction::Check { json, demo } => rt.block_on(check(&config, json, demo)),
        AlertsAction::Watch { demo } => rt.block_on(watch(&config, demo)),
    }
}

fn build_monitor(config: &Config, demo: bool) -> Result<Arc<AlertMonitor>, Box<dyn Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn TaskStore> = if demo {
        Arc::new(demo_store(Arc::clone(&clock)))
    } else {
        http_store(config)?
    };
    Ok(Arc::new(AlertMonitor::new(
        store,
        clock,
        MonitorSettings::from(&config.alerts),
    )))
}

/// Sample tasks spread across every tier, plus one too far out and one overdue.
fn demo_store(clock: Arc<dyn Clock>) -> MemoryTaskStore {
    let now = clock.now();
    let store = MemoryTaskStore::new(clock);
    let samples = [
        ("Send invoice to client", 4, Priority::High),
        ("Review pull request", 8, Priority::Medium),
        ("Prepare stand-up notes", 13, Priority::Low),
        ("Plan next sprint", 40, Priority::Medium),
        ("Renew domain", -30, Priority::High),
    ];
    for (i, (title, minutes, priority)) in samples.into_iter().enumerate() {
        // Half a minute of slack so the first check sees the whole minute.
        let due = now + Duration::minutes(minutes) + Duration::seconds(30);
        let task = NewTask {
            title: title.into(),
            priority: Some(priority),
            due_date: Some(due),
            ..NewTask::default()
        }
        .into_task(format!("demo-{}", i + 1), now);
        store.insert(task);
    }
    store
}

async fn check(config: &Config, json: bool, demo: bool) -> CommandResult {
    let monitor = build_monitor(config, demo)?;
    let report = monitor.trigger_check().await;
    if let Some(ref error) = report.error {
        return Err(error.clone().into());
    }

    if json {
        return print_json(&report);
    }
    if report.fired.is_empty() {
        println!("No tasks due in the next 15 minutes.");
    }
    for alert in &report.fired {
        println!("{}", summary(alert));
    }
    Ok(())
}

async fn watch(config: &Config, demo: bool) -> CommandResult {
    let monitor = build_monitor(config, demo)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Alert>();
    monitor.subscribe(move |alert| {
        // Receiver only goes away on shutdown.
        let _ = tx.send(alert.clone());
    });

    let mut presenter = AlertPresenter::from_config(&config.alerts);
    monitor.start_monitoring().await;
    println!("Watching for due tasks. Commands: c, d, s MINUTES, q (Ctrl-C to quit)");

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            Some(alert) = rx.recv() => {
                let now = Utc::now();
                if let Some(previous) = presenter.show(alert, now) {
                    println!("(replacing alert for \"{}\")", previous.task.title);
                }
                if let Some(card) = presenter.render(now) {
                    println!("\n{card}");
                }
            }
            _ = ticker.tick() => {
                if let Some(event) = presenter.tick(Utc::now()) {
                    println!("{}", describe(&event));
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !handle_input(line.trim(), &mut presenter, &monitor).await {
                        break;
                    }
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    monitor.stop_monitoring();
    Ok(())
}

/// Apply one line of user input. Returns `false` to quit.
async fn handle_input(input: &str, presenter: &mut AlertPresenter, monitor: &AlertMonitor) -> bool {
    let mut parts = input.split_whitespace();
    let result = match parts.next() {
        None => return true,
        Some("q" | "quit") => return false,
        Some("c" | "complete") => presenter.complete(monitor).await,
        Some("d" | "dismiss") => presenter.dismiss(),
        Some("s" | "snooze") => match parts.next().and_then(|m| m.parse::<u32>().ok()) {
            Some(minutes) => presenter.snooze(minutes, monitor),
            None => {
                let options: Vec<String> =
                    presenter.snooze_options().iter().map(u32::to_string).collect();
                println!("usage: s MINUTES (one of {})", options.join(", "));
                return true;
            }
        },
        Some(other) => {
            println!("unknown command '{other}' (c, d, s MINUTES, q)");
            return true;
        }
    };

    match result {
        Ok(event) => println!("{}", describe(&event)),
        Err(err) => eprintln!("error: {err}"),
    }
    true
}

fn summary(alert: &Alert) -> String {
    let profile = alert.profile();
    let minutes = alert.minutes_until_due;
    format!(
        "{} [{}] {} ({}) {} {} minute{}",
        profile.icon,
        alert.severity,
        alert.task.title,
        alert.task.id,
        profile.urgency_text.to_lowercase(),
        minutes,
        if minutes == 1 { "" } else { "s" }
    )
}

fn describe(event: &PresenterEvent) -> String {
    match event {
        PresenterEvent::Completed { task_id } => format!("Task {task_id} marked complete"),
        PresenterEvent::Dismissed { task_id } => format!("Alert for {task_id} dismissed"),
        PresenterEvent::AutoDismissed { task_id } => format!("Alert for {task_id} timed out"),
        PresenterEvent::Snoozed { task_id, until } => {
            format!("Task {task_id} snoozed until {}", until.format("%H:%M UTC"))
        }
    }
}
