use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::refresh::missing_refresh_cookie;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies::RefreshCookie;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<LogoutResponseData>), ApiError> {
    let secret = RefreshCookie::read(&jar).ok_or_else(missing_refresh_cookie)?;

    let outcome = state.credential_service.logout(&secret).await?;

    let jar = if outcome.clear_cookie {
        state.refresh_cookie.clear(jar)
    } else {
        jar
    };

    Ok((
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            LogoutResponseData {
                message: outcome.message,
            },
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutResponseData {
    pub message: String,
}
