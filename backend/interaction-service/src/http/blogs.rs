use super::AppState;
use crate::domain::{RelationKind, RelationRecord};
use crate::error::ServiceError;
use actix_middleware::AuthenticatedUser;
use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionsResponse {
    pub blog_id: String,
    pub liked: bool,
    pub saved: bool,
    pub likes: i64,
    pub saves_count: i64,
    pub comments_count: i64,
    pub views: i64,
}

#[derive(Serialize)]
pub struct ViewResponse {
    pub views: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBlogsResponse {
    pub blog_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct LikesResponse {
    pub likes: Vec<RelationRecord>,
}

async fn toggle(
    state: &AppState,
    blog_id: String,
    user: Option<AuthenticatedUser>,
    kind: RelationKind,
) -> Result<HttpResponse, ServiceError> {
    let (identity, services) = state.signed_in(user)?;
    let outcome = services.relation(kind).toggle(&blog_id, &identity).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /blogs/{blog_id}/like
/// Toggle the caller's like
#[post("/blogs/{blog_id}/like")]
pub async fn toggle_like(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    toggle(&state, blog_id.into_inner(), user, RelationKind::Like).await
}

/// POST /blogs/{blog_id}/save
/// Toggle the caller's save
#[post("/blogs/{blog_id}/save")]
pub async fn toggle_save(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    toggle(&state, blog_id.into_inner(), user, RelationKind::Save).await
}

/// GET /blogs/{blog_id}/interactions
/// Counters plus the caller's own liked/saved flags (false for anonymous)
#[get("/blogs/{blog_id}/interactions")]
pub async fn get_interactions(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    let blog_id = blog_id.into_inner();
    let (identity, services) = state.services(user);

    let counters = services.stats.get(&blog_id).await?;
    let (liked, saved) = match identity {
        Some(identity) => (
            services.likes.has_relation(&blog_id, &identity.user_id).await?,
            services.saves.has_relation(&blog_id, &identity.user_id).await?,
        ),
        None => (false, false),
    };

    Ok(HttpResponse::Ok().json(InteractionsResponse {
        blog_id,
        liked,
        saved,
        likes: counters.likes,
        saves_count: counters.saves_count,
        comments_count: counters.comments_count,
        views: counters.views,
    }))
}

/// GET /blogs/{blog_id}/likes
#[get("/blogs/{blog_id}/likes")]
pub async fn list_likes(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    let (_, services) = state.services(user);
    let likes = services.likes.list_relations(&blog_id).await?;
    Ok(HttpResponse::Ok().json(LikesResponse { likes }))
}

/// POST /blogs/{blog_id}/views
/// Count a detail-page load. Always accepted; failures only reach the logs.
#[post("/blogs/{blog_id}/views")]
pub async fn record_view(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
) -> HttpResponse {
    let (_, services) = state.services(user);
    let views = services.views.increment_views(&blog_id).await;
    HttpResponse::Accepted().json(ViewResponse { views })
}

/// GET /me/saved
/// Blogs the caller has saved
#[get("/me/saved")]
pub async fn saved_blogs(
    state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    let (identity, services) = state.signed_in(user)?;
    let blog_ids = services.saves.blogs_for_user(&identity.user_id).await?;
    Ok(HttpResponse::Ok().json(SavedBlogsResponse { blog_ids }))
}
