use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;

use super::AccessTokenResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies::ClientDevice;
use crate::inbound::http::cookies::RefreshCookie;
use crate::inbound::http::router::AppState;

pub async fn refresh(
    State(state): State<AppState>,
    ClientDevice(device): ClientDevice,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<AccessTokenResponseData>), ApiError> {
    let secret = RefreshCookie::read(&jar).ok_or_else(missing_refresh_cookie)?;

    let tokens = state
        .credential_service
        .refresh(&secret, device)
        .await?;

    let jar = state.refresh_cookie.set(jar, tokens.refresh_token);

    Ok((
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            AccessTokenResponseData {
                access_token: tokens.access_token,
            },
        ),
    ))
}

pub(super) fn missing_refresh_cookie() -> ApiError {
    tracing::warn!("Refresh token cookie missing");
    ApiError::Unauthorized("Refresh token not found in cookies".to_string())
}
