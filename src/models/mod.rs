//! Models Module - Error type & domain data structures

pub mod errors;
pub mod types;

pub use errors::*;
pub use types::*;
