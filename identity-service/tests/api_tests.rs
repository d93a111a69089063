mod common;

use common::refresh_cookie;
use common::TestApp;
use common::ACCESS_TTL_SECONDS;
use identity_service::domain::user::models::UserId;
use identity_service::domain::user::ports::UserRepository;
use reqwest::StatusCode;
use serde_json::json;

const EMAIL: &str = "a@x.com";
const NAME: &str = "Ann Lee";
const PASSWORD: &str = "Secret123!";

async fn access_token(response: reqwest::Response) -> String {
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    body["data"]["accessToken"]
        .as_str()
        .expect("accessToken missing")
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/health")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/health")
        .header("x-request-id", "req-123")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_sign_up_success() {
    let app = TestApp::spawn().await;

    let response = app.sign_up(EMAIL, NAME, PASSWORD).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(refresh_cookie(&response).is_none());

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["message"], "User created successfully");

    let user_id = body["data"]["userId"].as_str().unwrap();
    let stored = app
        .users
        .find_by_id(&UserId::from_string(user_id).unwrap())
        .await
        .unwrap()
        .expect("User not stored");
    assert_eq!(stored.email.as_str(), EMAIL);
    assert_ne!(stored.password_hash, PASSWORD);
}

#[tokio::test]
async fn test_sign_up_duplicate_email_case_insensitive() {
    let app = TestApp::spawn().await;

    app.sign_up(EMAIL, NAME, PASSWORD).await;
    let response = app.sign_up("A@X.COM", "Someone Else", "Different99!").await;

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Email already exists");
}

#[tokio::test]
async fn test_sign_up_invalid_input() {
    let app = TestApp::spawn().await;

    let invalid = [
        json!({ "email": "not-an-email", "name": NAME, "password": PASSWORD }),
        json!({ "email": EMAIL, "name": "An", "password": PASSWORD }),
        json!({ "email": EMAIL, "name": NAME, "password": "short" }),
        json!({
            "email": format!("{}@{}.com", "a".repeat(64), "b".repeat(223)),
            "name": NAME,
            "password": PASSWORD
        }),
    ];

    for body in invalid {
        let response = app
            .post("/api/auth/sign-up")
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_sign_in_success() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;

    let response = app.sign_in(EMAIL, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .cookies()
        .find(|cookie| cookie.name() == "refresh_token")
        .expect("Refresh cookie not set");
    assert!(cookie.http_only());
    assert_eq!(cookie.path(), Some("/api/auth"));
    assert!(cookie.same_site_lax());
    assert_eq!(cookie.value().len(), 64);
    let secret = cookie.value().to_string();

    let token = access_token(response).await;
    let claims = app.token_signer.verify(&token).expect("Invalid access token");
    assert_eq!(claims.email, EMAIL);
    assert_eq!(claims.name, NAME);
    assert_eq!(claims.exp - claims.iat, ACCESS_TTL_SECONDS);

    let user = app
        .users
        .find_by_id(&UserId::from_string(&claims.sub).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(user.last_login_at.is_some());

    // Only the hash of the secret is stored
    let stored = app.refresh_tokens.all().await;
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0].token_hash.as_str(), secret);
    assert_eq!(stored[0].user_id, user.id);
}

#[tokio::test]
async fn test_sign_in_records_device() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;

    app.post("/api/auth/sign-in")
        .header("user-agent", "integration-test/1.0")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .json(&json!({ "email": EMAIL, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");

    let stored = app.refresh_tokens.all().await;
    assert_eq!(
        stored[0].device.user_agent.as_deref(),
        Some("integration-test/1.0")
    );
    assert_eq!(stored[0].device.ip.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_sign_in_with_malformed_forwarded_for_uses_peer() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;

    let response = app
        .post("/api/auth/sign-in")
        .header("x-forwarded-for", "a".repeat(65))
        .json(&json!({ "email": EMAIL, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let stored = app.refresh_tokens.all().await;
    assert_eq!(stored[0].device.ip.as_deref(), Some("127.0.0.1"));
}

#[tokio::test]
async fn test_sign_in_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;

    let wrong_password = app.sign_in(EMAIL, "WrongPass1!").await;
    let unknown_email = app.sign_in("nobody@x.com", PASSWORD).await;
    let malformed_email = app.sign_in("nobody", PASSWORD).await;

    for response in [wrong_password, unknown_email, malformed_email] {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(refresh_cookie(&response).is_none());

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["message"], "Invalid credentials");
    }

    assert!(app.refresh_tokens.all().await.is_empty());
}

#[tokio::test]
async fn test_sign_in_inactive_user() {
    let app = TestApp::spawn().await;
    let response = app.sign_up(EMAIL, NAME, PASSWORD).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let user_id = UserId::from_string(body["data"]["userId"].as_str().unwrap()).unwrap();

    assert!(app.users.set_active(&user_id, false).await);

    let response = app.sign_in(EMAIL, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_cookie() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;

    let response = app.sign_in(EMAIL, PASSWORD).await;
    let original = refresh_cookie(&response).unwrap();

    let response = app
        .post("/api/auth/refresh")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let rotated = refresh_cookie(&response).expect("Rotated cookie not set");
    assert_ne!(rotated, original);

    let token = access_token(response).await;
    assert!(app.token_signer.verify(&token).is_ok());

    // Replaying the consumed secret fails
    let replay = app
        .post_with_refresh_cookie("/api/auth/refresh", &original)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = replay.json().await.unwrap();
    assert_eq!(body["data"]["message"], "Invalid refresh token");
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/refresh")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "Refresh token not found in cookies");
}

#[tokio::test]
async fn test_refresh_unknown_secret() {
    let app = TestApp::spawn().await;

    let response = app
        .post_with_refresh_cookie("/api/auth/refresh", "deadbeef")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_inactive_user() {
    let app = TestApp::spawn().await;
    let response = app.sign_up(EMAIL, NAME, PASSWORD).await;
    let body: serde_json::Value = response.json().await.unwrap();
    let user_id = UserId::from_string(body["data"]["userId"].as_str().unwrap()).unwrap();

    let response = app.sign_in(EMAIL, PASSWORD).await;
    let secret = refresh_cookie(&response).unwrap();

    app.users.set_active(&user_id, false).await;

    let response = app
        .post_with_refresh_cookie("/api/auth/refresh", &secret)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "User account is not active");
}

#[tokio::test]
async fn test_concurrent_refresh_single_winner() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;

    let response = app.sign_in(EMAIL, PASSWORD).await;
    let secret = refresh_cookie(&response).unwrap();

    let requests = (0..8)
        .map(|_| app.post_with_refresh_cookie("/api/auth/refresh", &secret))
        .collect();
    let responses = send_concurrently(requests).await;

    let successes = responses
        .iter()
        .filter(|response| response.status() == StatusCode::OK)
        .count();
    assert_eq!(successes, 1);
}

async fn send_concurrently(requests: Vec<reqwest::RequestBuilder>) -> Vec<reqwest::Response> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| tokio::spawn(request.send()))
        .collect();

    let mut responses = Vec::new();
    for handle in handles {
        responses.push(
            handle
                .await
                .expect("Request task panicked")
                .expect("Failed to execute request"),
        );
    }
    responses
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;

    let response = app.sign_in(EMAIL, PASSWORD).await;
    let secret = refresh_cookie(&response).unwrap();

    let response = app
        .post("/api/auth/logout")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(refresh_cookie(&response).as_deref(), Some(""));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "Logged out successfully");

    let response = app
        .post_with_refresh_cookie("/api/auth/refresh", &secret)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_unknown_secret_succeeds() {
    let app = TestApp::spawn().await;

    let response = app
        .post_with_refresh_cookie("/api/auth/logout", "deadbeef")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_without_cookie() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/logout")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_all_revokes_only_own_sessions() {
    let app = TestApp::spawn().await;
    app.sign_up(EMAIL, NAME, PASSWORD).await;
    app.sign_up("b@x.com", "Bob Stone", PASSWORD).await;

    let mut ann_secrets = Vec::new();
    let mut token = String::new();
    for _ in 0..3 {
        let response = app.sign_in(EMAIL, PASSWORD).await;
        ann_secrets.push(refresh_cookie(&response).unwrap());
        token = access_token(response).await;
    }

    let response = app.sign_in("b@x.com", PASSWORD).await;
    let bob_secret = refresh_cookie(&response).unwrap();

    let response = app
        .delete_authenticated("/api/auth/logout-all", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["count"], 3);
    assert_eq!(body["data"]["message"], "Logged out from 3 devices");

    for secret in ann_secrets {
        let response = app
            .post_with_refresh_cookie("/api/auth/refresh", &secret)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .post_with_refresh_cookie("/api/auth/refresh", &bob_secret)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_all_requires_bearer_token() {
    let app = TestApp::spawn().await;

    let response = app
        .api_client
        .delete(app.url("/api/auth/logout-all"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .delete_authenticated("/api/auth/logout-all", "not.a.jwt")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_session_workflow() {
    let app = TestApp::spawn().await;

    // Sign up
    let response = app.sign_up(EMAIL, NAME, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Sign in
    let response = app.sign_in(EMAIL, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = refresh_cookie(&response).unwrap();

    // Refresh
    let response = app
        .post("/api/auth/refresh")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let second = refresh_cookie(&response).unwrap();

    // Logout
    let response = app
        .post("/api/auth/logout")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    // Every secret issued before logout is dead
    for secret in [first, second] {
        let response = app
            .post_with_refresh_cookie("/api/auth/refresh", &secret)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let stored = app.refresh_tokens.all().await;
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|token| token.revoked));
}
