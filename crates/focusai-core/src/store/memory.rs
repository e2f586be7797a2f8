//! In-process task store.
//!
//! Keeps tasks in insertion order behind a mutex. Used by tests and the CLI's
//! offline demo; it can be switched "offline" to exercise failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use super::{StoreFuture, TaskStore};
use crate::clock::{Clock, SystemClock};
use crate::error::TaskStoreError;
use crate::task::{NewTask, Task, TaskQuery, TaskUpdate};

pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
    fetches: AtomicUsize,
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryTaskStore {
    /// Empty store stamping `createdAt`/`updatedAt` from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            clock,
            offline: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Insert (or replace by id) a fully formed task.
    pub fn insert(&self, task: Task) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => tasks.push(task),
        }
    }

    /// Snapshot of one task.
    pub fn get(&self, id: &str) -> Option<Task> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// While offline every call fails with [`TaskStoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `get_tasks` calls served or refused so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), TaskStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TaskStoreError::Unavailable("task store is offline".into()));
        }
        Ok(())
    }

    fn list(&self, query: &TaskQuery) -> Result<Vec<Task>, TaskStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let now = self.clock.now();
        Ok(self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|t| query.matches(t, now))
            .cloned()
            .collect())
    }

    fn patch(&self, id: &str, update: &TaskUpdate) -> Result<Task, TaskStoreError> {
        self.check_online()?;
        let now = self.clock.now();
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskStoreError::NotFound(id.to_string()))?;
        task.apply(update, now);
        Ok(task.clone())
    }

    fn create(&self, new_task: &NewTask) -> Result<Task, TaskStoreError> {
        self.check_online()?;
        new_task.validate()?;
        let task = new_task
            .clone()
            .into_task(Uuid::new_v4().to_string(), self.clock.now());
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task.clone());
        Ok(task)
    }

    fn remove(&self, id: &str) -> Result<(), TaskStoreError> {
        self.check_online()?;
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(TaskStoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl TaskStore for MemoryTaskStore {
    fn get_tasks(&self, query: &TaskQuery) -> StoreFuture<'_, Vec<Task>> {
        let result = self.list(query);
        Box::pin(async move { result })
    }

    fn update_task(&self, id: &str, update: &TaskUpdate) -> StoreFuture<'_, Task> {
        let result = self.patch(id, update);
        Box::pin(async move { result })
    }

    fn create_task(&self, task: &NewTask) -> StoreFuture<'_, Task> {
        let result = self.create(task);
        Box::pin(async move { result })
    }

    fn delete_task(&self, id: &str) -> StoreFuture<'_, ()> {
        let result = self.remove(id);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::task::test_support::task;
    use chrono::Utc;

    fn store() -> MemoryTaskStore {
        MemoryTaskStore::new(Arc::new(ManualClock::new(Utc::now())))
    }

    #[tokio::test]
    async fn create_assigns_id_and_lists_it() {
        let store = store();
        let created = store.create_task(&NewTask::new("Buy milk")).await.unwrap();
        assert!(!created.id.is_empty());

        let pending = store.get_tasks(&TaskQuery::pending()).await.unwrap();
        assert_eq!(pending, vec![created]);
    }

    #[tokio::test]
    async fn blank_title_is_refused() {
        let err = store().create_task(&NewTask::new(" ")).await.unwrap_err();
        assert!(matches!(err, TaskStoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn completed_tasks_drop_out_of_pending_query() {
        let store = store();
        store.insert(task("t1", "Write report"));
        store.update_task("t1", &TaskUpdate::complete()).await.unwrap();

        assert!(store.get_tasks(&TaskQuery::pending()).await.unwrap().is_empty());
        assert!(store.get("t1").unwrap().completed_at.is_some());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = store();
        let err = store.update_task("nope", &TaskUpdate::complete()).await.unwrap_err();
        assert!(matches!(err, TaskStoreError::NotFound(_)));
        let err = store.delete_task("nope").await.unwrap_err();
        assert!(matches!(err, TaskStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn offline_store_refuses_every_call_but_counts_fetches() {
        let store = store();
        store.set_offline(true);
        assert!(store.get_tasks(&TaskQuery::pending()).await.is_err());
        assert!(store.update_task("t1", &TaskUpdate::complete()).await.is_err());
        assert_eq!(store.fetch_count(), 1);
    }

    #[test]
    fn insert_replaces_by_id() {
        let store = store();
        store.insert(task("t1", "old"));
        store.insert(task("t1", "new"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("t1").unwrap().title, "new");
    }
}
