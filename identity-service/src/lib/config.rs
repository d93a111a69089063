use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::credentials::models::TokenLifetimes;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cookie: CookieConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_seconds: i64,
    #[serde(default = "default_refresh_token_ttl")]
    pub refresh_token_ttl_seconds: i64,
    pub audience: String,
    pub issuer: String,
}

impl JwtConfig {
    pub fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access_ttl_seconds: self.access_token_ttl_seconds,
            refresh_ttl_seconds: self.refresh_token_ttl_seconds,
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// SameSite policy of the refresh cookie
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieConfig {
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSitePolicy,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: false,
            same_site: SameSitePolicy::default(),
            domain: None,
            path: default_cookie_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MaintenanceConfig {
    /// Expired refresh token purge interval; 0 disables the task
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_token_ttl() -> i64 {
    3600
}

fn default_refresh_token_ttl() -> i64 {
    604_800
}

fn default_cookie_path() -> String {
    "/api/auth".to_string()
}

fn default_purge_interval() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}
