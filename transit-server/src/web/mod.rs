//! Web layer for the transit server.
//!
//! A thin JSON surface over [`TransitService`](crate::service::TransitService):
//! journey search, quotes, and ticket issuance, validation and consumption.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
