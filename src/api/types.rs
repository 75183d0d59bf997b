//! API Request/Response Types
//!
//! Two envelopes are in use. The finance pages read
//! `{status, message?, data}`; the generic table pages (stok, menu,
//! pemasok, ...) read `{success, data?, message?}` / `{success, error}`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::models::AppError;
use crate::utils::CacheStats;

// ============================================
// Finance envelope
// ============================================

#[derive(Debug, Serialize)]
pub struct FinanceResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> FinanceResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinanceErrorBody {
    pub status: &'static str,
    pub message: String,
}

/// Error leaving a finance route
#[derive(Debug)]
pub struct FinanceFailure(pub AppError);

impl From<AppError> for FinanceFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for FinanceFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::bad_request(rejection.body_text()))
    }
}

impl IntoResponse for FinanceFailure {
    fn into_response(self) -> Response {
        let status = log_failure(&self.0);
        let body = FinanceErrorBody {
            status: "error",
            message: self.0.message,
        };
        (status, Json(body)).into_response()
    }
}

// ============================================
// Table envelope
// ============================================

#[derive(Debug, Serialize)]
pub struct TableResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> TableResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl TableResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TableErrorBody {
    pub success: bool,
    pub error: String,
}

/// Error leaving a table, inventory or nutrition route
#[derive(Debug)]
pub struct TableFailure(pub AppError);

impl From<AppError> for TableFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for TableFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::bad_request(rejection.body_text()))
    }
}

impl From<QueryRejection> for TableFailure {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::bad_request(rejection.body_text()))
    }
}

impl IntoResponse for TableFailure {
    fn into_response(self) -> Response {
        let status = log_failure(&self.0);
        let body = TableErrorBody {
            success: false,
            error: self.0.message,
        };
        (status, Json(body)).into_response()
    }
}

fn log_failure(err: &AppError) -> StatusCode {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(code = err.code_str(), error = %err, "Request failed");
    } else {
        warn!(code = err.code_str(), error = %err, "Request rejected");
    }
    status
}

// ============================================
// Health / root
// ============================================

#[derive(Debug, Serialize)]
pub struct RootMessage {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: &'static str,
    pub nutrition_cache: CacheStats,
}

// ============================================
// Query strings
// ============================================

/// `GET /api/nutrition/search`
#[derive(Debug, Default, Deserialize)]
pub struct NutritionSearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

/// `GET /api/nutrition/foods/:id/label`
#[derive(Debug, Default, Deserialize)]
pub struct LabelParams {
    #[serde(default)]
    pub serving: Option<String>,
}
