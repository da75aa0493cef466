//! HTTP front end for the NASDAQ stock agent
//!
//! Exposes the analysis pipeline over REST and the A2A message endpoint.

mod app;
mod error;
mod routes;
mod state;

pub use app::create_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
