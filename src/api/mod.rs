//! SPPG Dashboard REST API Module
//! Finance, inventory and nutrition endpoints plus the generic table proxy

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use middleware::start_cleanup_task;
pub use routes::create_router;
pub use types::*;
