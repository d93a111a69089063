use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<LogoutAllResponseData>), ApiError> {
    let outcome = state.credential_service.logout_all(&user.user_id).await?;

    // The caller's own session is among the revoked ones
    let jar = state.refresh_cookie.clear(jar);

    Ok((
        jar,
        ApiSuccess::new(
            StatusCode::OK,
            LogoutAllResponseData {
                message: outcome.message,
                count: outcome.revoked,
            },
        ),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutAllResponseData {
    pub message: String,
    pub count: u64,
}
