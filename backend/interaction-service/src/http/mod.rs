//! HTTP surface
//!
//! Bearer tokens are decoded by [`actix_middleware::JwtAuthMiddleware`];
//! handlers turn the resulting [`AuthenticatedUser`] into an [`Identity`]
//! and run services scoped to that caller.

pub mod admin;
pub mod blogs;
pub mod comments;
pub mod health;

use crate::domain::Identity;
use crate::error::{ServiceError, ServiceResult};
use crate::services::{Interactions, ServiceContext};
use actix_middleware::AuthenticatedUser;
use actix_web::web;

const ADMIN_ROLE: &str = "admin";

#[derive(Clone)]
pub struct AppState {
    pub context: ServiceContext,
}

impl AppState {
    pub fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    pub fn identify(&self, user: AuthenticatedUser) -> Identity {
        let mut identity = Identity {
            user_id: user.user_id,
            email: user.email,
            name: user.name,
            photo: user.picture,
            is_admin: user.role.as_deref() == Some(ADMIN_ROLE),
        };
        identity.is_admin = self.context.rules().is_admin(&identity);
        identity
    }

    /// Services for an optional caller
    pub fn services(&self, user: Option<AuthenticatedUser>) -> (Option<Identity>, Interactions) {
        let identity = user.map(|u| self.identify(u));
        let services = self.context.for_caller(identity.clone());
        (identity, services)
    }

    /// Services for a caller that must be signed in
    pub fn signed_in(&self, user: Option<AuthenticatedUser>) -> ServiceResult<(Identity, Interactions)> {
        let identity = self.identify(user.ok_or(ServiceError::Unauthenticated)?);
        let services = self.context.for_caller(Some(identity.clone()));
        Ok((identity, services))
    }
}

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ServiceError::InvalidInput(err.to_string()).into()
    }))
    .service(health::health)
    .service(health::ready)
    .service(
        web::scope("/api/v1")
            .service(blogs::toggle_like)
            .service(blogs::toggle_save)
            .service(blogs::get_interactions)
            .service(blogs::list_likes)
            .service(blogs::record_view)
            .service(blogs::saved_blogs)
            .service(comments::list_comments)
            .service(comments::add_comment)
            .service(comments::update_comment)
            .service(comments::delete_comment)
            .service(admin::reconcile_blog)
            .service(admin::reconcile_all),
    );
}
