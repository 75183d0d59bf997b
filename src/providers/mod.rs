//! Providers Module - External Data Sources
//!
//! Third-party APIs the dashboard reads from (not our database).

pub mod openfoodfacts;

pub use openfoodfacts::*;
