//! HTTP JSON surface of the matrix service.

pub mod error;
mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;

#[cfg(test)]
mod tests;
