#![allow(dead_code, unused_macros)]

use actix_web::web;
use chirpy_server::{AppState, MemoryStore, Settings};
use std::sync::Arc;

pub const POLKA_KEY: &str = "test_polka_key";

pub fn test_state() -> (web::Data<AppState>, Arc<MemoryStore>) {
    test_state_with(|_| {})
}

pub fn test_state_with(customize: impl FnOnce(&mut Settings)) -> (web::Data<AppState>, Arc<MemoryStore>) {
    let mut settings = Settings::new_for_test().expect("Failed to load test config");
    customize(&mut settings);
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_store(settings, store.clone());
    (web::Data::new(state), store)
}

/// Builds the full application around `$state`.
macro_rules! spawn_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure(chirpy_server::configure($state.config.server.filepath_root.clone())),
        )
        .await
    };
}

/// Sends a `TestRequest` and returns the status with the JSON body
/// (`Null` when the body is empty or not JSON).
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = actix_web::test::read_body(resp).await;
        let json: serde_json::Value =
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }};
}

/// Registers and logs in a user; evaluates to the login response body.
macro_rules! login_user {
    ($app:expr, $email:expr, $password:expr) => {{
        let (status, _) = call!(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/users")
                .set_json(serde_json::json!({ "email": $email, "password": $password }))
        );
        assert_eq!(status, actix_web::http::StatusCode::CREATED);

        let (status, body) = call!(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/login")
                .set_json(serde_json::json!({ "email": $email, "password": $password }))
        );
        assert_eq!(status, actix_web::http::StatusCode::OK);
        body
    }};
}

pub fn bearer(token: &serde_json::Value) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token.as_str().expect("token is a string")))
}
