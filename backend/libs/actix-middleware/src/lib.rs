//! # Actix Middleware Library
//!
//! Middleware components shared by the HTTP services
//!
//! ## Modules
//! - `jwt_auth`: JWT authentication middleware and the `AuthenticatedUser` extractor
//! - `logging`: request ID tagging and request/response logging

pub mod jwt_auth;
pub mod logging;

pub use jwt_auth::{AuthError, AuthenticatedUser, Claims, JwtAuthMiddleware, JwtKeys};
pub use logging::{Logging, RequestId, REQUEST_ID_HEADER};
