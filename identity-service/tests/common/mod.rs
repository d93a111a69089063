#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use auth::Argon2Hasher;
use auth::SignerSettings;
use auth::TokenSigner;
use identity_service::config::CookieConfig;
use identity_service::domain::credentials::models::TokenLifetimes;
use identity_service::domain::credentials::service::CredentialService;
use identity_service::inbound::http::cookies::RefreshCookie;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryRefreshTokenRepository;
use identity_service::outbound::repositories::InMemoryUserRepository;
use serde_json::json;

pub const JWT_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ACCESS_TTL_SECONDS: i64 = 900;
pub const REFRESH_TTL_SECONDS: i64 = 604_800;

/// Test application that spawns a real server backed by in-memory storage
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub users: Arc<InMemoryUserRepository>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    pub token_signer: Arc<TokenSigner>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(InMemoryUserRepository::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new());

        let token_signer = Arc::new(
            TokenSigner::new(&SignerSettings {
                secret: JWT_SECRET.to_string(),
                audience: "identity-web".to_string(),
                issuer: "identity-service".to_string(),
            })
            .expect("Failed to create token signer"),
        );

        let credential_service = Arc::new(CredentialService::new(
            Arc::clone(&users),
            Arc::clone(&refresh_tokens),
            Arc::new(Argon2Hasher::new()),
            Arc::clone(&token_signer),
            TokenLifetimes {
                access_ttl_seconds: ACCESS_TTL_SECONDS,
                refresh_ttl_seconds: REFRESH_TTL_SECONDS,
            },
        ));

        let router = create_router(
            credential_service,
            Arc::clone(&token_signer),
            RefreshCookie::new(&CookieConfig::default(), REFRESH_TTL_SECONDS),
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create reqwest client"),
            users,
            refresh_tokens,
            token_signer,
        }
    }

    /// Client without a cookie store, for presenting arbitrary cookies
    pub fn bare_client() -> reqwest::Client {
        reqwest::Client::builder()
            .build()
            .expect("Failed to create reqwest client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(self.url(path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(self.url(path))
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(self.url(path)).bearer_auth(token)
    }

    /// POST with an explicit refresh cookie and no cookie store
    pub fn post_with_refresh_cookie(&self, path: &str, secret: &str) -> reqwest::RequestBuilder {
        Self::bare_client()
            .post(self.url(path))
            .header(reqwest::header::COOKIE, format!("refresh_token={}", secret))
    }

    pub async fn sign_up(&self, email: &str, name: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/sign-up")
            .json(&json!({
                "email": email,
                "name": name,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/sign-in")
            .json(&json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Value of the refresh cookie set by a response, if any
pub fn refresh_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name() == "refresh_token")
        .map(|cookie| cookie.value().to_string())
}
