//! End-to-end tests for the users REST surface.
//!
//! The router is assembled exactly as the server does it: requests registered on a
//! dispatcher builder, then REST bindings mounted on top of the frozen dispatcher.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use modkit::Dispatcher;
use users::domain::repo::UsersRepository;
use users::{User, UsersModule};

fn build_router(module: UsersModule) -> Router {
    let dispatcher = module
        .register_requests(Dispatcher::builder())
        .expect("requests register")
        .build();
    module
        .register_rest(Router::new(), Arc::new(dispatcher))
        .expect("routes register")
}

fn app() -> Router {
    build_router(UsersModule::default())
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("json body")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn create_user_returns_201_with_location() -> Result<()> {
    let resp = app()
        .oneshot(post_json(
            "/api/users",
            r#"{"name":"John","email":"john@example.com"}"#,
        ))
        .await?;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("location header");

    let body = body_json(resp).await;
    assert_eq!(body["name"], "John");
    assert_eq!(body["email"], "john@example.com");
    let id = Uuid::parse_str(body["id"].as_str().expect("id string"))?;
    assert_eq!(location, format!("/api/users/{id}"));
    Ok(())
}

#[tokio::test]
async fn create_user_mints_fresh_ids() -> Result<()> {
    let router = app();
    let mut ids = Vec::new();
    for _ in 0..2 {
        let resp = router
            .clone()
            .oneshot(post_json(
                "/api/users",
                r#"{"name":"John","email":"john@example.com"}"#,
            ))
            .await?;
        let body = body_json(resp).await;
        ids.push(body["id"].as_str().unwrap().to_string());
    }
    assert_ne!(ids[0], ids[1]);
    Ok(())
}

#[tokio::test]
async fn create_user_reports_every_violation() -> Result<()> {
    let resp = app()
        .oneshot(post_json("/api/users", r#"{"name":"","email":"not-an-email"}"#))
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "type": "https://tools.ietf.org/html/rfc7231#section-6.5.1",
            "title": "Validation Error",
            "status": 400,
            "errors": {
                "Name": ["Name is required"],
                "Email": ["Email must be a valid email address"]
            }
        })
    );
    Ok(())
}

#[tokio::test]
async fn create_user_rejects_long_name() -> Result<()> {
    let payload = json!({ "name": "x".repeat(101), "email": "john@example.com" }).to_string();
    let resp = app().oneshot(post_json("/api/users", &payload)).await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(
        body["errors"]["Name"],
        json!(["Name must not exceed 100 characters"])
    );
    assert!(body["errors"].get("Email").is_none());
    Ok(())
}

#[tokio::test]
async fn create_user_missing_fields_fail_validation() -> Result<()> {
    let resp = app().oneshot(post_json("/api/users", "{}")).await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["errors"]["Name"], json!(["Name is required"]));
    assert_eq!(body["errors"]["Email"], json!(["Email is required"]));
    Ok(())
}

#[tokio::test]
async fn create_user_null_email_matches_missing_email() -> Result<()> {
    let resp = app()
        .oneshot(post_json("/api/users", r#"{"name":"John","email":null}"#))
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["errors"].get("Name").is_none());
    assert_eq!(body["errors"]["Email"], json!(["Email is required"]));
    Ok(())
}

#[tokio::test]
async fn create_user_blank_email_reports_required_and_format() -> Result<()> {
    let resp = app()
        .oneshot(post_json("/api/users", r#"{"name":"John","email":""}"#))
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(
        body["errors"]["Email"],
        json!(["Email is required", "Email must be a valid email address"])
    );
    Ok(())
}

#[tokio::test]
async fn create_user_accepts_loose_email_forms() -> Result<()> {
    let long_local = format!("{}@example.com", "x".repeat(300));
    for email in ["a@b", "john doe@example.com", long_local.as_str()] {
        let payload = json!({ "name": "John", "email": email }).to_string();
        let resp = app().oneshot(post_json("/api/users", &payload)).await?;
        assert_eq!(resp.status(), StatusCode::CREATED, "{email}");
    }
    Ok(())
}

#[tokio::test]
async fn create_user_with_malformed_json_is_bad_request() -> Result<()> {
    let resp = app().oneshot(post_json("/api/users", "{not json")).await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert!(body.get("errors").is_none());
    Ok(())
}

#[tokio::test]
async fn get_users_returns_sample_set_in_order() -> Result<()> {
    let resp = app().oneshot(get("/api/users")).await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "users": [
                { "id": "550e8400-e29b-41d4-a716-446655440000", "name": "John Doe", "email": "john.doe@example.com" },
                { "id": "6ba7b810-9dad-11d1-80b4-00c04fd430c8", "name": "Jane Smith", "email": "jane.smith@example.com" },
                { "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7", "name": "Bob Johnson", "email": "bob.johnson@example.com" }
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn reads_are_idempotent() -> Result<()> {
    let router = app();
    for uri in ["/api/users", "/api/users/6ba7b810-9dad-11d1-80b4-00c04fd430c8"] {
        let first = body_json(router.clone().oneshot(get(uri)).await?).await;
        let second = body_json(router.clone().oneshot(get(uri)).await?).await;
        assert_eq!(first, second, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn get_user_by_id_found() -> Result<()> {
    let resp = app()
        .oneshot(get("/api/users/550e8400-e29b-41d4-a716-446655440000"))
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["name"], "John Doe");
    assert_eq!(body["email"], "john.doe@example.com");
    Ok(())
}

#[tokio::test]
async fn get_user_by_id_absent_is_empty_404() -> Result<()> {
    let resp = app()
        .oneshot(get("/api/users/00000000-0000-0000-0000-000000000000"))
        .await?;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn get_user_with_non_uuid_id_is_404() -> Result<()> {
    let resp = app().oneshot(get("/api/users/not-a-uuid")).await?;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
    Ok(())
}

struct BrokenRepository;

#[async_trait::async_trait]
impl UsersRepository for BrokenRepository {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>> {
        Err(anyhow::anyhow!("storage offline: /var/lib/users.db"))
    }

    async fn list(&self) -> Result<Vec<User>> {
        Err(anyhow::anyhow!("storage offline: /var/lib/users.db"))
    }
}

#[tokio::test]
async fn unexpected_failure_is_generic_500() -> Result<()> {
    let router = build_router(UsersModule::new(Arc::new(BrokenRepository)));
    let resp = router.oneshot(get("/api/users")).await?;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = body_bytes(resp).await;
    let text = String::from_utf8_lossy(&bytes);
    assert!(!text.contains("storage offline"));

    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(
        body,
        json!({
            "type": "https://tools.ietf.org/html/rfc7231#section-6.6.1",
            "title": "Internal Server Error",
            "status": 500,
            "detail": "An error occurred while processing your request"
        })
    );
    Ok(())
}

#[test]
fn routes_refuse_dispatcher_without_handlers() {
    let result = UsersModule::default().register_rest(Router::new(), Arc::new(Dispatcher::builder().build()));
    assert!(result.is_err());
}

#[test]
fn openapi_document_lists_user_operations() {
    let doc = UsersModule::default().openapi();
    let json = serde_json::to_value(&doc).unwrap();
    assert!(json["paths"]["/api/users"]["get"].is_object());
    assert!(json["paths"]["/api/users"]["post"].is_object());
    assert!(json["paths"]["/api/users/{id}"]["get"].is_object());
    assert_eq!(json["paths"]["/api/users"]["post"]["operationId"], "CreateUser");
}
