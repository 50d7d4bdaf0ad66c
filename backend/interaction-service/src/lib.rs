//! Real-time blog interactions: likes, saves, comments and view counts kept
//! consistent over a shared hierarchical document store.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod logging;
pub mod repository;
pub mod security;
pub mod services;
pub mod workers;

pub use error::{ServiceError, ServiceResult};
