use super::AppState;
use crate::error::ServiceError;
use crate::services::Interactions;
use actix_middleware::AuthenticatedUser;
use actix_web::{post, web, HttpResponse};

fn require_admin(
    state: &AppState,
    user: Option<AuthenticatedUser>,
) -> Result<Interactions, ServiceError> {
    let (identity, services) = state.signed_in(user)?;
    if !identity.is_admin {
        return Err(ServiceError::PermissionDenied(
            "admin role required".to_string(),
        ));
    }
    Ok(services)
}

/// POST /admin/blogs/{blog_id}/reconcile
/// Recount likes, saves and comments and repair the blog's counters
#[post("/admin/blogs/{blog_id}/reconcile")]
pub async fn reconcile_blog(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    let services = require_admin(&state, user)?;
    let counters = services.counters.reconcile(&blog_id).await?;
    Ok(HttpResponse::Ok().json(counters))
}

/// POST /admin/reconcile
/// Reconcile every blog
#[post("/admin/reconcile")]
pub async fn reconcile_all(
    state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    let services = require_admin(&state, user)?;
    let report = services.counters.reconcile_all().await?;
    Ok(HttpResponse::Ok().json(report))
}
