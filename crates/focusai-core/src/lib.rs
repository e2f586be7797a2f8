//! # FocusAI Core Library
//!
//! Task model, task store clients and the due-task alert engine behind the
//! FocusAI productivity tracker. The `focusai-cli` binary is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Task store**: [`TaskStore`] port with an HTTP client for the FocusAI
//!   REST API and an in-memory implementation
//! - **Alert engine**: [`AlertMonitor`] polls pending tasks, classifies them
//!   by time left and notifies subscribers at most once per 5-minute bucket
//! - **Presenter**: [`AlertPresenter`], a wall-clock state machine that the
//!   caller drives with `tick()`
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`AlertMonitor`]: Polling, classification and deduplication
//! - [`HttpTaskStore`]: REST client
//! - [`Config`]: Application configuration management
//! - [`Clock`]: Time source, swappable in tests

pub mod alerts;
pub mod clock;
pub mod error;
pub mod storage;
pub mod store;
pub mod task;

pub use alerts::{
    Alert, AlertLedger, AlertMonitor, AlertPresenter, CycleReport, LedgerRetention,
    MonitorSettings, PresenterEvent, Severity, SubscriptionId,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AlertError, ConfigError, CoreError, TaskStoreError, ValidationError};
pub use storage::{AlertsConfig, ApiConfig, Config};
pub use store::{HttpTaskStore, MemoryTaskStore, TaskStore};
pub use task::{CalendarTasks, NewTask, Priority, Task, TaskQuery, TaskStats, TaskUpdate};
