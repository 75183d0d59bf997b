//! Centralized Error Handling Module
//!
//! Setiap kegagalan punya kode error yang unik supaya log mudah difilter.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - DB_xxx: database / Supabase errors
//! - API_xxx: request errors
//! - CFG_xxx: configuration errors
//! - EXT_xxx: external services (OpenFoodFacts)

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message (forwarded raw to the client)
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// HTTP status for this error
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Database Errors
    // ============================================
    /// Could not reach the database service
    DbConnectionFailed,
    /// Database request timed out
    DbTimeout,
    /// Database rejected the request (PostgREST error body)
    DbError,
    /// Database returned something we could not decode
    DbInvalidResponse,
    /// Database overloaded or failing (HTTP 429 / 5xx)
    DbUnavailable,

    // ============================================
    // API Errors
    // ============================================
    /// Missing or invalid request field
    ApiBadRequest,
    /// Unauthorized (invalid API key)
    ApiUnauthorized,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Record not found
    ApiNotFound,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // External Service Errors
    // ============================================
    /// OpenFoodFacts API error
    NutritionApiError,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DbConnectionFailed => "DB_CONNECTION_FAILED",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DbError => "DB_ERROR",
            Self::DbInvalidResponse => "DB_INVALID_RESPONSE",
            Self::DbUnavailable => "DB_UNAVAILABLE",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiNotFound => "API_NOT_FOUND",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::NutritionApiError => "EXT_NUTRITION_ERROR",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiNotFound => 404,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DbConnectionFailed | Self::DbTimeout | Self::DbUnavailable
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Missing or invalid request field (400)
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// Record not found (404)
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotFound, msg)
    }

    /// Missing environment variable
    pub fn missing_env(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissingEnv, msg)
    }

    /// Invalid configuration value
    pub fn invalid_config(key: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {:?}", key, value),
        )
    }

    /// Nutrition provider error
    pub fn nutrition_api(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NutritionApiError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::DbTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::DbConnectionFailed, "Connection failed")
        } else if err.is_decode() {
            Self::new(ErrorCode::DbInvalidResponse, err.to_string())
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        Self::with_source(ErrorCode::DbInvalidResponse, message, err)
    }
}
