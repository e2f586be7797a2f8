//! Task store port and its adapters.
//!
//! The alert engine only needs to list pending tasks and patch one task, but
//! the trait carries the full CRUD surface so the CLI can drive either
//! backend through the same handle.

pub mod http;
pub mod memory;

use std::future::Future;
use std::pin::Pin;

use crate::error::TaskStoreError;
use crate::task::{NewTask, Task, TaskQuery, TaskUpdate};

pub use http::HttpTaskStore;
pub use memory::MemoryTaskStore;

/// Boxed future returned by [`TaskStore`] methods; keeps the trait dyn-compatible.
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TaskStoreError>> + Send + 'a>>;

/// Reads and writes task records.
pub trait TaskStore: Send + Sync {
    /// Lists tasks matching `query`, in the store's order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or answers with an error.
    fn get_tasks(&self, query: &TaskQuery) -> StoreFuture<'_, Vec<Task>>;

    /// Applies `update` to the task `id` and returns the stored result.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] or [`TaskStoreError::Api`] with
    /// status 404 for unknown ids, or a transport error.
    fn update_task(&self, id: &str, update: &TaskUpdate) -> StoreFuture<'_, Task>;

    /// Creates a task and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Invalid`] for a blank title, or a transport error.
    fn create_task(&self, task: &NewTask) -> StoreFuture<'_, Task>;

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task does not exist or the store fails.
    fn delete_task(&self, id: &str) -> StoreFuture<'_, ()>;
}
