//! Utils Module - Helper Functions & Shared Utilities

pub mod cache;
pub mod constants;

pub use cache::*;
