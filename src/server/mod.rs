//! HTTP server
//!
//! [`ServerBuilder`] opens the database, starts the daily scheduler and serves
//! the JSON API under `/api` next to the static front-end.

pub mod builder;
pub mod context;
pub mod handlers;
pub mod router;

pub use builder::{ServerBuilder, shutdown_signal};
pub use context::AppContext;
pub use router::{api_routes, build_router};
