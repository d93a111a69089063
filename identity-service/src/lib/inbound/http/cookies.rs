use std::convert::Infallible;
use std::net::IpAddr;
use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::ConnectInfo;
use axum::extract::FromRequestParts;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;
use cookie::time::Duration as CookieDuration;
use http::header::USER_AGENT;
use http::request::Parts;
use http::HeaderMap;

use crate::config::CookieConfig;
use crate::config::SameSitePolicy;
use crate::domain::credentials::models::DeviceInfo;

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Attributes of the refresh token cookie.
///
/// Removal must repeat path and domain or browsers keep the original cookie.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    secure: bool,
    same_site: SameSite,
    domain: Option<String>,
    path: String,
    max_age_seconds: i64,
}

impl RefreshCookie {
    /// # Arguments
    /// * `config` - Cookie section of the service configuration
    /// * `max_age_seconds` - Refresh token TTL
    pub fn new(config: &CookieConfig, max_age_seconds: i64) -> Self {
        let same_site = match config.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::None => SameSite::None,
        };

        if same_site == SameSite::None && !config.secure {
            tracing::warn!("SameSite=None refresh cookie without Secure will be rejected by browsers");
        }

        Self {
            secure: config.secure,
            same_site,
            domain: config.domain.clone(),
            path: config.path.clone(),
            max_age_seconds,
        }
    }

    fn build(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::build((REFRESH_COOKIE_NAME, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .path(self.path.clone());

        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.clone());
        }

        cookie.build()
    }

    /// Add the refresh secret to the jar.
    pub fn set(&self, jar: CookieJar, secret: String) -> CookieJar {
        let mut cookie = self.build(secret);
        cookie.set_max_age(CookieDuration::seconds(self.max_age_seconds));
        jar.add(cookie)
    }

    /// Instruct the client to drop the refresh cookie.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.build(String::new()))
    }

    /// Read the refresh secret presented by the client.
    pub fn read(jar: &CookieJar) -> Option<String> {
        jar.get(REFRESH_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
    }
}

/// Device metadata of the calling client.
#[derive(Debug, Clone)]
pub struct ClientDevice(pub DeviceInfo);

#[async_trait]
impl<S> FromRequestParts<S> for ClientDevice
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientDevice(device_info(&parts.headers, peer)))
    }
}

/// Derive device metadata from request headers.
///
/// The IP is the first `X-Forwarded-For` entry when it parses as an IP
/// address, else `peer`.
pub fn device_info(headers: &HeaderMap, peer: Option<String>) -> DeviceInfo {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_string());

    DeviceInfo::new(user_agent, forwarded.or(peer))
}
