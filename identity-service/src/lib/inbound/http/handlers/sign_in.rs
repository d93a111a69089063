use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::AccessTokenResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::credentials::errors::CredentialError;
use crate::domain::credentials::models::SignInCommand;
use crate::domain::user::models::EmailAddress;
use crate::inbound::http::cookies::ClientDevice;
use crate::inbound::http::router::AppState;

pub async fn sign_in(
    State(state): State<AppState>,
    ClientDevice(device): ClientDevice,
    jar: CookieJar,
    Json(body): Json<SignInRequest>,
) -> Result<(CookieJar, ApiSuccess<AccessTokenResponseData>), ApiError> {
    // A malformed email can never match an account
    let email = EmailAddress::new(body.email)
        .map_err(|_| ApiError::from(CredentialError::InvalidCredentials))?;

    let tokens = state
        .credential_service
        .sign_in(SignInCommand::new(email, body.password), device)
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

/// HTTP request body for signing in (raw JSON)
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SignInRequest {
    email: String,
    password: String,
}
