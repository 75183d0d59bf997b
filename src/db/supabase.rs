//! Supabase REST Client
//!
//! Talks to PostgREST at `{SUPABASE_URL}/rest/v1/{table}` with the service
//! role key. Reads are retried with exponential backoff and jitter on
//! transport errors, HTTP 429 and 5xx. Writes are sent exactly once so a
//! timeout can never insert the same payroll twice.

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::query::{filter_pairs, validate_identifier, Filter, Query};
use super::Database;
use crate::models::{AppError, AppResult, ErrorCode};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// First retry delay in milliseconds
pub const BASE_RETRY_MS: u64 = 200;

/// Retry delay cap in milliseconds
pub const MAX_RETRY_MS: u64 = 5000;

/// Jitter percentage for retry delay
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// PostgREST error body
#[derive(Debug, Default, Deserialize)]
pub struct PostgrestError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Supabase (PostgREST) backend
#[derive(Clone)]
pub struct SupabaseClient {
    rest_url: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl SupabaseClient {
    pub fn new(
        project_url: &str,
        service_key: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> AppResult<Self> {
        let invalid_key = |_| AppError::invalid_config("SUPABASE_SERVICE_ROLE_KEY", "<hidden>");

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert("apikey", HeaderValue::from_str(service_key).map_err(invalid_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", service_key)).map_err(invalid_key)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::with_source(ErrorCode::ConfigInvalidValue, "Failed to build HTTP client", e))?;

        Ok(Self {
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            client,
            max_retries: max_retries.max(1),
        })
    }

    fn table_url(&self, table: &str) -> AppResult<String> {
        validate_identifier(table)?;
        Ok(format!("{}/{}", self.rest_url, table))
    }

    /// Delay before retry `attempt` (1-based), with ±20% jitter
    pub fn backoff_delay(attempt: u32) -> Duration {
        let base = BASE_RETRY_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = base.min(MAX_RETRY_MS);
        let jitter_range = (capped * RETRY_JITTER_PERCENT) / 100;
        let jitter: i64 = rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64));
        Duration::from_millis((capped as i64 + jitter).max(50) as u64)
    }

    /// Send one request and decode the row array
    async fn execute(&self, request: RequestBuilder) -> AppResult<Vec<Value>> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let code = if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                ErrorCode::DbUnavailable
            } else {
                ErrorCode::DbError
            };
            let body: PostgrestError = response.json().await.unwrap_or_default();
            let message = body
                .message
                .clone()
                .unwrap_or_else(|| format!("Supabase HTTP error: {}", status));
            debug!(
                status = status.as_u16(),
                code = body.code.as_deref().unwrap_or("-"),
                details = body.details.as_deref().unwrap_or("-"),
                hint = body.hint.as_deref().unwrap_or("-"),
                "Supabase rejected request"
            );
            return Err(AppError::new(code, message));
        }

        let body: Value = response.json().await?;
        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    /// Read with backoff retries
    async fn execute_with_retry<F>(&self, build: F) -> AppResult<Vec<Value>>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.execute(build()).await {
                Ok(rows) => return Ok(rows),
                Err(err) if err.code.is_retryable() && attempt < self.max_retries => {
                    let delay = Self::backoff_delay(attempt);
                    warn!(
                        "⏳ Supabase read failed ({}), retry {}/{} in {}ms",
                        err,
                        attempt,
                        self.max_retries - 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn require_filters(filters: &[Filter]) -> AppResult<()> {
    if filters.is_empty() {
        return Err(AppError::bad_request("Update/hapus tanpa filter tidak diizinkan"));
    }
    Ok(())
}

#[async_trait]
impl Database for SupabaseClient {
    async fn select(&self, table: &str, query: &Query) -> AppResult<Vec<Value>> {
        let url = self.table_url(table)?;
        let pairs = query.to_postgrest();
        self.execute_with_retry(|| self.client.get(&url).query(&pairs))
            .await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> AppResult<Vec<Value>> {
        let url = self.table_url(table)?;
        let request = self
            .client
            .post(&url)
            .header("Prefer", "return=representation")
            .json(&rows);
        self.execute(request).await
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> AppResult<Vec<Value>> {
        require_filters(filters)?;
        let url = self.table_url(table)?;
        let request = self
            .client
            .patch(&url)
            .query(&filter_pairs(filters))
            .header("Prefer", "return=representation")
            .json(&patch);
        self.execute(request).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> AppResult<Vec<Value>> {
        require_filters(filters)?;
        let url = self.table_url(table)?;
        let request = self
            .client
            .delete(&url)
            .query(&filter_pairs(filters))
            .header("Prefer", "return=representation");
        self.execute(request).await
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
