pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod repository;
pub mod services;
pub mod state;

pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
