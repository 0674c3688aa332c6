#[macro_use]
mod common;

use actix_web::{http::StatusCode, test::TestRequest};
use chirpy_server::auth::token::{issue_access_token, validate_access_token};
use common::{bearer, test_state};
use serde_json::json;
use uuid::Uuid;

#[actix_web::test]
async fn test_register_and_login() {
    let (state, _) = test_state();
    let app = spawn_app!(state);

    let (status, user) = call!(
        app,
        TestRequest::post()
            .uri("/api/users")
            .set_json(json!({ "email": "walt@breakingbad.com", "password": "04234" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "walt@breakingbad.com");
    assert_eq!(user["is_chirpy_red"], false);
    assert!(user.get("hashed_password").is_none());
    assert!(user.get("password").is_none());

    let (status, login) = call!(
        app,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "email": "walt@breakingbad.com", "password": "04234" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["id"], user["id"]);
    assert!(login["token"].is_string());
    assert_eq!(login["refresh_token"].as_str().unwrap().len(), 64);

    let user_id = Uuid::parse_str(login["id"].as_str().unwrap()).unwrap();
    let token = login["token"].as_str().unwrap();
    assert_eq!(validate_access_token(token, "test_secret").unwrap(), user_id);
}

#[actix_web::test]
async fn test_duplicate_registration_rejected() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    login_user!(app, "walt@breakingbad.com", "04234");

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/users")
            .set_json(json!({ "email": "walt@breakingbad.com", "password": "other" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_invalid_login() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    login_user!(app, "walt@breakingbad.com", "04234");

    for (email, password) in [
        ("walt@breakingbad.com", "wrongpassword"),
        ("nonexistent@example.com", "04234"),
    ] {
        let (status, body) = call!(
            app,
            TestRequest::post()
                .uri("/api/login")
                .set_json(json!({ "email": email, "password": password }))
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Incorrect email or password");
    }
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let (state, _) = test_state();
    let app = spawn_app!(state);

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/users")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_refresh_and_revoke() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    let login = login_user!(app, "jesse@breakingbad.com", "yo");
    let refresh_header = bearer(&login["refresh_token"]);

    let (status, body) = call!(
        app,
        TestRequest::post().uri("/api/refresh").insert_header(refresh_header.clone())
    );
    assert_eq!(status, StatusCode::OK);
    let fresh = body["token"].as_str().unwrap();
    let user_id = Uuid::parse_str(login["id"].as_str().unwrap()).unwrap();
    assert_eq!(validate_access_token(fresh, "test_secret").unwrap(), user_id);

    // Not rotated: the same refresh token works again
    let (status, _) = call!(
        app,
        TestRequest::post().uri("/api/refresh").insert_header(refresh_header.clone())
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call!(
        app,
        TestRequest::post().uri("/api/revoke").insert_header(refresh_header.clone())
    );
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    for _ in 0..2 {
        let (status, body) = call!(
            app,
            TestRequest::post().uri("/api/refresh").insert_header(refresh_header.clone())
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Refresh token has been revoked");
    }

    // Repeat revokes are success-adjacent
    let (status, _) = call!(
        app,
        TestRequest::post().uri("/api/revoke").insert_header(refresh_header)
    );
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_refresh_requires_known_token() {
    let (state, _) = test_state();
    let app = spawn_app!(state);

    let (status, body) = call!(app, TestRequest::post().uri("/api/refresh"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/refresh")
            .insert_header(("Authorization", "Bearer deadbeef"))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unknown refresh token");

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/revoke")
            .insert_header(("Authorization", "Bearer deadbeef"))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_access_token_cannot_refresh() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    let login = login_user!(app, "jesse@breakingbad.com", "yo");

    let (status, _) = call!(
        app,
        TestRequest::post().uri("/api/refresh").insert_header(bearer(&login["token"]))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_update_user() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    let login = login_user!(app, "walt@breakingbad.com", "04234");

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri("/api/users")
            .insert_header(bearer(&login["token"]))
            .set_json(json!({ "email": "heisenberg@breakingbad.com", "password": "losPollos" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "heisenberg@breakingbad.com");
    assert_eq!(body["id"], login["id"]);

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "email": "heisenberg@breakingbad.com", "password": "losPollos" }))
    );
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_update_user_requires_valid_access_token() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    let login = login_user!(app, "walt@breakingbad.com", "04234");
    let user_id = Uuid::parse_str(login["id"].as_str().unwrap()).unwrap();
    let update = json!({ "email": "heisenberg@breakingbad.com", "password": "losPollos" });

    let (status, _) = call!(
        app,
        TestRequest::put().uri("/api/users").set_json(update.clone())
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call!(
        app,
        TestRequest::put()
            .uri("/api/users")
            .insert_header(("Authorization", format!("Basic {}", login["token"].as_str().unwrap())))
            .set_json(update.clone())
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = issue_access_token(user_id, "test_secret", chrono::Duration::seconds(-5)).unwrap();
    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri("/api/users")
            .insert_header(("Authorization", format!("Bearer {}", expired)))
            .set_json(update.clone())
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token expired");

    let forged = issue_access_token(user_id, "another_secret", chrono::Duration::hours(1)).unwrap();
    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri("/api/users")
            .insert_header(("Authorization", format!("Bearer {}", forged)))
            .set_json(update)
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[actix_web::test]
async fn test_login_honours_shorter_expiry() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    login_user!(app, "walt@breakingbad.com", "04234");

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({
                "email": "walt@breakingbad.com",
                "password": "04234",
                "expires_in_seconds": 1
            }))
    );
    assert_eq!(status, StatusCode::OK);

    let token = body["token"].as_str().unwrap();
    let later = chrono::Utc::now() + chrono::Duration::seconds(2);
    assert!(chirpy_server::auth::token::validate_access_token_at(token, "test_secret", later).is_err());
}

#[actix_web::test]
async fn test_login_with_extreme_expiry_uses_bounded_lifetime() {
    let (state, _) = test_state();
    let app = spawn_app!(state);
    let registered = login_user!(app, "walt@breakingbad.com", "04234");
    let user_id = Uuid::parse_str(registered["id"].as_str().unwrap()).unwrap();

    for expires_in_seconds in [i64::MAX, i64::MIN] {
        let (status, body) = call!(
            app,
            TestRequest::post()
                .uri("/api/login")
                .set_json(json!({
                    "email": "walt@breakingbad.com",
                    "password": "04234",
                    "expires_in_seconds": expires_in_seconds
                }))
        );
        assert_eq!(status, StatusCode::OK, "{}", expires_in_seconds);

        let token = body["token"].as_str().unwrap();
        assert_eq!(validate_access_token(token, "test_secret").unwrap(), user_id);
        let past_cap = chrono::Utc::now() + chrono::Duration::hours(1) + chrono::Duration::seconds(5);
        assert!(chirpy_server::auth::token::validate_access_token_at(token, "test_secret", past_cap).is_err());
    }
}
