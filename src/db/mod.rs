//! Database Module - Storage access behind one trait
//!
//! Handlers only ever see `Arc<dyn Database>`; the backend is picked at
//! startup from [`crate::config::StoreBackend`].

pub mod memory;
pub mod query;
pub mod supabase;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::models::AppResult;

pub use memory::MemoryDatabase;
pub use query::{Filter, Order, Query, SelectItem, SelectSpec};
pub use supabase::SupabaseClient;

/// Row-level access to tables and views
#[async_trait]
pub trait Database: Send + Sync {
    /// Read rows matching `query`
    async fn select(&self, table: &str, query: &Query) -> AppResult<Vec<Value>>;

    /// Insert rows, returning them as stored (with generated ids)
    async fn insert(&self, table: &str, rows: Vec<Value>) -> AppResult<Vec<Value>>;

    /// Merge `patch` into every row matching `filters`; returns updated rows
    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> AppResult<Vec<Value>>;

    /// Remove rows matching `filters`; returns the removed rows
    async fn delete(&self, table: &str, filters: &[Filter]) -> AppResult<Vec<Value>>;

    /// Short backend name for logs and /health
    fn backend_name(&self) -> &'static str;
}

/// Select and decode rows into `T`
pub async fn select_as<T: DeserializeOwned>(
    db: &dyn Database,
    table: &str,
    query: &Query,
) -> AppResult<Vec<T>> {
    let rows = db.select(table, query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// Build the configured backend
pub fn connect(config: &AppConfig) -> AppResult<Arc<dyn Database>> {
    match &config.store {
        StoreBackend::Supabase { url, service_key } => Ok(Arc::new(SupabaseClient::new(
            url,
            service_key,
            config.db_timeout,
            config.db_max_retries,
        )?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryDatabase::new())),
    }
}
