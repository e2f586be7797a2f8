pub mod alerts;
pub mod config;
pub mod task;

use std::error::Error;
use std::sync::Arc;

use focusai_core::{Config, HttpTaskStore};
use tracing::debug;

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Config from disk with `FOCUSAI_API_URL` / `FOCUSAI_TOKEN` applied.
pub fn effective_config() -> Config {
    Config::load_or_default().with_env_overrides()
}

pub fn http_store(config: &Config) -> Result<Arc<HttpTaskStore>, Box<dyn Error>> {
    debug!(base_url = %config.api.base_url, auth = config.api.token.is_some(), "using task API");
    Ok(Arc::new(HttpTaskStore::from_config(&config.api)?))
}

/// Single-threaded runtime for one command.
pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
