//! SPPG Dashboard Library
//!
//! Backend for the SPPG (school-meal unit) operations dashboard:
//! - Budget plans (RAB), expenses, payroll and financial reports
//! - Inventory and nutrition-label lookups
//! - A generic CRUD proxy over the Supabase tables used by the frontend

pub mod api;
pub mod config;
pub mod core;
pub mod db;
pub mod models;
pub mod providers;
pub mod utils;

pub use config::{AppConfig, StoreBackend};
pub use db::{Database, MemoryDatabase, SupabaseClient};
pub use models::{AppError, AppResult, ErrorCode};
pub use providers::OpenFoodFactsClient;
pub use utils::{CacheStats, TtlCache};
