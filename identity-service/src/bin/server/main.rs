use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::Argon2Hasher;
use auth::SignerSettings;
use auth::TokenSigner;
use identity_service::config::Config;
use identity_service::domain::credentials::ports::CredentialServicePort;
use identity_service::domain::credentials::service::CredentialService;
use identity_service::inbound::http::cookies::RefreshCookie;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::PostgresRefreshTokenRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        access_token_ttl_seconds = config.jwt.access_token_ttl_seconds,
        refresh_token_ttl_seconds = config.jwt.refresh_token_ttl_seconds,
        cookie_secure = config.cookie.secure,
        "Configuration loaded"
    );

    let token_signer = Arc::new(
        TokenSigner::new(&SignerSettings {
            secret: config.jwt.secret.clone(),
            audience: config.jwt.audience.clone(),
            issuer: config.jwt.issuer.clone(),
        })
        .map_err(|e| {
            tracing::error!(error = %e, "Access token signer could not be created");
            e
        })?,
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let refresh_token_repository = Arc::new(PostgresRefreshTokenRepository::new(pg_pool));

    let credential_service: Arc<dyn CredentialServicePort> = Arc::new(CredentialService::new(
        user_repository,
        refresh_token_repository,
        Arc::new(Argon2Hasher::new()),
        Arc::clone(&token_signer),
        config.jwt.lifetimes(),
    ));

    spawn_purge_task(
        Arc::clone(&credential_service),
        config.maintenance.purge_interval_seconds,
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        credential_service,
        token_signer,
        RefreshCookie::new(&config.cookie, config.jwt.refresh_token_ttl_seconds),
    );

    axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

/// Periodically delete expired refresh tokens. Disabled when `interval_seconds` is 0.
fn spawn_purge_task(credential_service: Arc<dyn CredentialServicePort>, interval_seconds: u64) {
    if interval_seconds == 0 {
        tracing::info!("Expired refresh token purge disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
        loop {
            interval.tick().await;
            if let Err(e) = credential_service.purge_expired_refresh_tokens().await {
                tracing::error!(error = ?e, "Expired refresh token purge failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
