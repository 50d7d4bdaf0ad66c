use super::AppState;
use crate::domain::Comment;
use crate::error::ServiceError;
use crate::services::CommentInput;
use actix_middleware::AuthenticatedUser;
use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Serialize;

#[derive(Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// GET /blogs/{blog_id}/comments
/// Newest first
#[get("/blogs/{blog_id}/comments")]
pub async fn list_comments(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    let (_, services) = state.services(user);
    let comments = services.comments.list(&blog_id).await?;
    Ok(HttpResponse::Ok().json(CommentsResponse { comments }))
}

/// POST /blogs/{blog_id}/comments
#[post("/blogs/{blog_id}/comments")]
pub async fn add_comment(
    state: web::Data<AppState>,
    blog_id: web::Path<String>,
    user: Option<AuthenticatedUser>,
    body: web::Json<CommentInput>,
) -> Result<HttpResponse, ServiceError> {
    let (identity, services) = state.signed_in(user)?;
    let comment = services.comments.add(&blog_id, &body, &identity).await?;
    Ok(HttpResponse::Created().json(comment))
}

/// PATCH /blogs/{blog_id}/comments/{comment_id}
/// Author only
#[patch("/blogs/{blog_id}/comments/{comment_id}")]
pub async fn update_comment(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    user: Option<AuthenticatedUser>,
    body: web::Json<CommentInput>,
) -> Result<HttpResponse, ServiceError> {
    let (blog_id, comment_id) = path.into_inner();
    let (identity, services) = state.signed_in(user)?;
    let comment = services
        .comments
        .update(&blog_id, &comment_id, &body, &identity)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// DELETE /blogs/{blog_id}/comments/{comment_id}
/// Author or admin. Deleting an unknown comment reports `deleted: false`.
#[delete("/blogs/{blog_id}/comments/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, ServiceError> {
    let (blog_id, comment_id) = path.into_inner();
    let (_, services) = state.signed_in(user)?;
    let deleted = services.comments.delete(&blog_id, &comment_id).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse { deleted }))
}
