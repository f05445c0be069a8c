pub mod api;
pub mod config;
pub mod kubectl;
pub mod server;
pub mod template;

pub use crate::api::{router, ApiError, AppState};
pub use crate::config::Config;
