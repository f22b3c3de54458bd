pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod job;
pub mod notify;
pub mod providers;
pub mod store;

pub use config::Config;
pub use error::{JobError, NotifyError};
pub use job::{JobOutcome, RefreshPolicy, TokenRefreshJob};

use std::sync::Arc;

/// Shared application state passed to all API handlers.
pub struct AppState {
    pub config: Config,
    pub job: TokenRefreshJob,
}

pub type SharedState = Arc<AppState>;
