use super::AppState;
use crate::domain::paths;
use actix_web::{get, web, HttpResponse};
use serde_json::json;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Ready once the store answers a read
#[get("/ready")]
pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    let probe = match paths::blogs_root() {
        Ok(path) => state.context.store().read(&path).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match probe {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ready",
            "listeners": state.context.store().listener_count(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "error": e.to_string(),
            }))
        }
    }
}
