//! devlab-core — typed client for the devlab API.
//!
//! This crate owns everything below the UI:
//! - Configuration resolution (environment, config file, endpoints)
//! - DTOs mirrored from the remote API
//! - A blocking HTTP transport with retry, backoff, and a circuit breaker
//! - Cursor-pagination envelope types
//! - One service module per remote resource

pub mod breaker;
pub mod config;
pub mod error;
pub mod http;
pub mod page;
pub mod services;
pub mod types;

pub use config::Config;
pub use error::ApiError;
pub use page::{Identified, ListQuery, Page};
pub use services::DevlabClient;
