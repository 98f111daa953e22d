#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, login, send, test_state, test_state_with_mailer, ADMIN_EMAIL, ADMIN_PASSWORD};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use workboard::auth::AuthResponse;
use workboard::error::AppError;
use workboard::mailer::Mailer;

#[derive(Default)]
struct CapturingMailer {
    links: Mutex<Vec<String>>,
}

impl CapturingMailer {
    fn last_token(&self) -> String {
        let links = self.links.lock().unwrap();
        let link = links.last().expect("no reset mail was sent");
        link.split("token=").nth(1).unwrap().to_string()
    }
}

impl Mailer for CapturingMailer {
    fn send_password_reset(&self, _to: &str, _name: &str, reset_link: &str) -> Result<(), AppError> {
        self.links.lock().unwrap().push(reset_link.to_string());
        Ok(())
    }
}

#[actix_rt::test]
async fn test_seeded_admin_login_and_logout() {
    let state = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login_response: AuthResponse = test::read_body_json(resp).await;
    assert!(login_response.success);
    assert!(!login_response.token.is_empty());
    assert_eq!(login_response.user.email, ADMIN_EMAIL);
    let token = login_response.token;

    let me = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, me).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());

    let logout = || {
        test::TestRequest::post()
            .uri("/auth/logout")
            .insert_header(bearer(&token))
            .to_request()
    };
    let (status, body) = send(&app, logout()).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);

    // Repeating the logout is harmless.
    let (status, _) = send(&app, logout()).await;
    assert_eq!(status, StatusCode::OK);

    for uri in ["/auth/me", "/projects", "/notifications"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&token))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} accepted a revoked token", uri);
        assert_eq!(body["success"], false);
    }
}

#[actix_rt::test]
async fn test_logout_can_revoke_refresh_token() {
    let state = test_state().await;
    let app = test_app!(state);
    let (access, refresh) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .insert_header(bearer(&access))
        .set_json(json!({ "refresh_token": refresh }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/refresh")
        .insert_header(bearer(&refresh))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    // Without a body only the access token is revoked.
    let (access, refresh) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .insert_header(bearer(&access))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/refresh")
        .insert_header(bearer(&refresh))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[actix_rt::test]
async fn test_refresh_requires_refresh_token() {
    let state = test_state().await;
    let app = test_app!(state);
    let (access, refresh) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let with_access = test::TestRequest::post()
        .uri("/auth/refresh")
        .insert_header(bearer(&access))
        .to_request();
    let (status, _) = send(&app, with_access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refresh token is not accepted as a credential elsewhere.
    let misuse = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&refresh))
        .to_request();
    let (status, _) = send(&app, misuse).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/refresh")
        .insert_header(bearer(&refresh))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let fresh = body["token"].as_str().unwrap();

    let me = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(fresh))
        .to_request();
    let (status, _) = send(&app, me).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_register_creates_contributor() {
    let state = test_state().await;
    let app = test_app!(state);

    let payload = json!({
        "name": "Integration User",
        "email": "integration@example.com",
        "password": "Password123!",
        "role": "admin"
    });
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(&payload)
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed: {}", body);
    assert_eq!(body["user"]["role"], "contributor");
    assert!(body["refresh_token"].as_str().is_some());

    let again = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(&payload)
        .to_request();
    let (status, body) = send(&app, again).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already registered");

    login(&app, "integration@example.com", "Password123!").await;
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let state = test_state().await;
    let app = test_app!(state);

    let test_cases = vec![
        (json!({ "email": "test@example.com", "password": "Password123!" }), "missing name"),
        (json!({ "name": "Test", "password": "Password123!" }), "missing email"),
        (json!({ "name": "Test", "email": "test@example.com" }), "missing password"),
        (
            json!({ "name": "Test", "email": "invalid-email", "password": "Password123!" }),
            "invalid email format",
        ),
        (
            json!({ "name": "", "email": "test@example.com", "password": "Password123!" }),
            "empty name",
        ),
        (
            json!({ "name": "Test", "email": "test@example.com", "password": "123" }),
            "password too short",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(&payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "Test case failed: {}. Body: {}",
            description,
            body
        );
        assert_eq!(body["success"], false);
    }

    let malformed = test::TestRequest::post()
        .uri("/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let (status, _) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_invalid_login_inputs() {
    let state = test_state().await;
    let app = test_app!(state);

    let test_cases = vec![
        (json!({ "password": "admin123" }), StatusCode::BAD_REQUEST, "missing email"),
        (json!({ "email": ADMIN_EMAIL }), StatusCode::BAD_REQUEST, "missing password"),
        (
            json!({ "email": "invalid-email", "password": "admin123" }),
            StatusCode::BAD_REQUEST,
            "invalid email format",
        ),
        (
            json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }),
            StatusCode::UNAUTHORIZED,
            "incorrect password",
        ),
        (
            json!({ "email": "nobody@example.com", "password": "admin123" }),
            StatusCode::UNAUTHORIZED,
            "non-existent user",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(&payload)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(
            status, expected_status,
            "Test case failed: {}. Body: {}",
            description, body
        );
    }
}

#[actix_rt::test]
async fn test_deactivated_user_is_locked_out() {
    let state = test_state().await;
    let app = test_app!(state);
    let admin = common::admin_token(&app).await;
    let (id, token) =
        common::user_with_role(&app, &admin, "leaver@example.com", "contributor").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/users/{}", id))
        .insert_header(bearer(&admin))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let me = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, me).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": "leaver@example.com", "password": "secret123" }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_password_reset_is_single_use() {
    let mailer = Arc::new(CapturingMailer::default());
    let state = test_state_with_mailer(mailer.clone()).await;
    let app = test_app!(state);

    let forgot = |email: &str| {
        test::TestRequest::post()
            .uri("/auth/forgot-password")
            .set_json(json!({ "email": email }))
            .to_request()
    };
    let (known_status, known_body) = send(&app, forgot(ADMIN_EMAIL)).await;
    let (unknown_status, unknown_body) = send(&app, forgot("ghost@example.com")).await;
    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, known_status);
    assert_eq!(unknown_body, known_body);
    assert_eq!(mailer.links.lock().unwrap().len(), 1);

    let token = mailer.last_token();
    let verify = test::TestRequest::post()
        .uri("/auth/verify-reset-token")
        .set_json(json!({ "token": token }))
        .to_request();
    let (status, _) = send(&app, verify).await;
    assert_eq!(status, StatusCode::OK);

    let reset = || {
        test::TestRequest::post()
            .uri("/auth/reset-password")
            .set_json(json!({ "token": token, "password": "brand-new-pw" }))
            .to_request()
    };
    let (status, body) = send(&app, reset()).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = send(&app, reset()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    login(&app, ADMIN_EMAIL, "brand-new-pw").await;
    let old = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .to_request();
    let (status, _) = send(&app, old).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unknown = test::TestRequest::post()
        .uri("/auth/verify-reset-token")
        .set_json(json!({ "token": "not-a-real-token" }))
        .to_request();
    let (status, _) = send(&app, unknown).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_expired_reset_token_is_rejected() {
    let mailer = Arc::new(CapturingMailer::default());
    let state = test_state_with_mailer(mailer.clone()).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/forgot-password")
        .set_json(json!({ "email": ADMIN_EMAIL }))
        .to_request();
    send(&app, req).await;
    let token = mailer.last_token();

    sqlx::query("UPDATE password_reset_tokens SET expires_at = ? WHERE token = ?")
        .bind(chrono::Utc::now() - chrono::Duration::seconds(1))
        .bind(&token)
        .execute(&state.pool)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/auth/verify-reset-token")
        .set_json(json!({ "token": token }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/auth/reset-password")
        .set_json(json!({ "token": token, "password": "too-late-pw" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
}

#[actix_rt::test]
async fn test_profile_update_keeps_email_unique() {
    let state = test_state().await;
    let app = test_app!(state);
    let admin = common::admin_token(&app).await;
    let (_, token) = common::user_with_role(&app, &admin, "me@example.com", "manager").await;

    let taken = test::TestRequest::put()
        .uri("/auth/profile")
        .insert_header(bearer(&token))
        .set_json(json!({ "email": ADMIN_EMAIL }))
        .to_request();
    let (status, _) = send(&app, taken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let rename = test::TestRequest::put()
        .uri("/users/profile")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Renamed", "is_active": false }))
        .to_request();
    let (status, body) = send(&app, rename).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "Renamed");
    assert_eq!(body["data"]["is_active"], true);

    let change = test::TestRequest::post()
        .uri("/users/change-password")
        .insert_header(bearer(&token))
        .set_json(json!({ "current_password": "secret123", "new_password": "secret456" }))
        .to_request();
    let (status, _) = send(&app, change).await;
    assert_eq!(status, StatusCode::OK);
    login(&app, "me@example.com", "secret456").await;
}

#[actix_rt::test]
async fn test_missing_token_is_rejected() {
    let state = test_state().await;
    let app = test_app!(state);

    let health = test::TestRequest::get().uri("/health").to_request();
    let (status, _) = send(&app, health).await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::get().uri("/projects").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get()
        .uri("/projects")
        .insert_header(("Authorization", "Bearer not.a.jwt"))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
