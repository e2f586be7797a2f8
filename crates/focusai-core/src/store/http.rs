//! REST client for the `/api/todos` API.
//!
//! Every response is wrapped in `{ success, data, message }`. Non-2xx answers
//! are turned into [`TaskStoreError::Api`] using the body's `message` when
//! present, otherwise a per-endpoint fallback text.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{StoreFuture, TaskStore};
use crate::error::TaskStoreError;
use crate::storage::ApiConfig;
use crate::task::{CalendarTasks, NewTask, Task, TaskQuery, TaskStats, TaskUpdate};

/// Response envelope shared by all endpoints.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    message: Option<String>,
}

/// Task store backed by the FocusAI backend.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    base_url: Url,
    token: Option<String>,
    http_client: Client,
}

impl HttpTaskStore {
    /// Create a client for `base_url` (e.g. `http://localhost:5001`).
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Unavailable`] if the URL does not parse or
    /// cannot carry a path, or [`TaskStoreError::Http`] if the HTTP client
    /// cannot be built.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TaskStoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TaskStoreError::Unavailable(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TaskStoreError::Unavailable(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            token: token.filter(|t| !t.is_empty()),
            http_client,
        })
    }

    /// Build from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// Same as [`HttpTaskStore::new`].
    pub fn from_config(api: &ApiConfig) -> Result<Self, TaskStoreError> {
        Self::new(
            &api.base_url,
            api.token.clone(),
            Duration::from_secs(api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/api/todos/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TaskStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TaskStoreError::Unavailable(format!("base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "todos"])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, TaskStoreError> {
        let url = self.endpoint(segments)?;
        let mut builder = self.http_client.request(method, url);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send and return the raw body of a successful response.
    async fn send_raw(request: RequestBuilder, fallback: &str) -> Result<String, TaskStoreError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback.to_string());
            return Err(TaskStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    /// Send and decode the envelope's `data`.
    async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, TaskStoreError> {
        let body = Self::send_raw(request, fallback).await?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| TaskStoreError::Decode(e.to_string()))?;
        envelope
            .data
            .ok_or_else(|| TaskStoreError::Decode("response has no 'data' field".into()))
    }

    /// Aggregate counters for the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn stats(&self) -> Result<TaskStats, TaskStoreError> {
        let request = self.request(Method::GET, &["stats"])?;
        Self::send(request, "Failed to fetch todo statistics").await
    }

    /// Tasks for one month, grouped by due day. `month` is zero-based, as the
    /// API expects; `None` means the current year/month on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn calendar(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<CalendarTasks, TaskStoreError> {
        let mut pairs = Vec::new();
        if let Some(year) = year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(month) = month {
            pairs.push(("month", month.to_string()));
        }
        let request = self.request(Method::GET, &["calendar"])?.query(&pairs);
        Self::send(request, "Failed to fetch calendar todos").await
    }

    /// Pending tasks due within the next seven days.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn upcoming(&self) -> Result<Vec<Task>, TaskStoreError> {
        let request = self.request(Method::GET, &["upcoming"])?;
        Self::send(request, "Failed to fetch upcoming todos").await
    }
}

impl TaskStore for HttpTaskStore {
    fn get_tasks(&self, query: &TaskQuery) -> StoreFuture<'_, Vec<Task>> {
        let request = self
            .request(Method::GET, &[])
            .map(|r| r.query(&query.to_query_pairs()));
        Box::pin(async move { Self::send(request?, "Failed to fetch todos").await })
    }

    fn update_task(&self, id: &str, update: &TaskUpdate) -> StoreFuture<'_, Task> {
        let request = self.request(Method::PUT, &[id]).map(|r| r.json(update));
        Box::pin(async move { Self::send(request?, "Failed to update todo").await })
    }

    fn create_task(&self, task: &NewTask) -> StoreFuture<'_, Task> {
        let request = task
            .validate()
            .map_err(TaskStoreError::from)
            .and_then(|()| self.request(Method::POST, &[]))
            .map(|r| r.json(task));
        Box::pin(async move { Self::send(request?, "Failed to create todo").await })
    }

    fn delete_task(&self, id: &str) -> StoreFuture<'_, ()> {
        let request = self.request(Method::DELETE, &[id]);
        Box::pin(async move {
            Self::send_raw(request?, "Failed to delete todo").await?;
            Ok(())
        })
    }
}
