use actix_middleware::{AuthenticatedUser, JwtAuthMiddleware, JwtKeys, Logging, REQUEST_ID_HEADER};
use actix_web::{test, web, App, HttpResponse};
use std::sync::Arc;

async fn whoami(user: Option<AuthenticatedUser>) -> HttpResponse {
    match user {
        Some(u) => HttpResponse::Ok().body(u.user_id),
        None => HttpResponse::Ok().body("anonymous"),
    }
}

async fn protected(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().body(user.user_id)
}

fn alice() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "alice".to_string(),
        email: None,
        name: Some("Alice".to_string()),
        picture: None,
        role: None,
    }
}

#[actix_rt::test]
async fn test_missing_token_is_anonymous() {
    let keys = Arc::new(JwtKeys::from_secret(b"secret"));
    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(keys))
            .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "anonymous");
}

#[actix_rt::test]
async fn test_valid_token_sets_user() {
    let keys = Arc::new(JwtKeys::from_secret(b"secret"));
    let token = keys.issue(&alice(), 3600).unwrap();
    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(keys))
            .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "alice");
}

#[actix_rt::test]
async fn test_invalid_token_is_rejected() {
    let keys = Arc::new(JwtKeys::from_secret(b"secret"));
    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(keys))
            .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::try_call_service(&app, req).await;
    let status = match resp {
        Ok(resp) => resp.status(),
        Err(e) => e.as_response_error().status_code(),
    };
    assert_eq!(status.as_u16(), 401);
}

#[actix_rt::test]
async fn test_required_user_extractor_rejects_anonymous() {
    let keys = Arc::new(JwtKeys::from_secret(b"secret"));
    let app = test::init_service(
        App::new()
            .wrap(JwtAuthMiddleware::new(keys))
            .route("/protected", web::get().to(protected)),
    )
    .await;

    let req = test::TestRequest::get().uri("/protected").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}

#[actix_rt::test]
async fn test_logging_echoes_request_id() {
    let app = test::init_service(
        App::new()
            .wrap(Logging)
            .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header((REQUEST_ID_HEADER, "req-42"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap(),
        "req-42"
    );

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get(REQUEST_ID_HEADER).is_some());
}
