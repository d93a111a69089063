use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::credentials::models::SignUpCommand;
use crate::domain::credentials::models::SignUpOutcome;
use crate::domain::user::errors::DisplayNameError;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::inbound::http::router::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<ApiSuccess<SignUpResponseData>, ApiError> {
    state
        .credential_service
        .sign_up(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|outcome| ApiSuccess::new(StatusCode::CREATED, outcome.into()))
}

/// HTTP request body for registering a user (raw JSON)
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SignUpRequest {
    email: String,
    name: String,
    password: String,
}

#[derive(Debug, Clone, Error)]
enum ParseSignUpRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid name: {0}")]
    Name(#[from] DisplayNameError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl SignUpRequest {
    fn try_into_command(self) -> Result<SignUpCommand, ParseSignUpRequestError> {
        let email = EmailAddress::new(self.email)?;
        let name = DisplayName::new(self.name)?;
        let password = Password::new(self.password)?;
        Ok(SignUpCommand::new(email, name, password))
    }
}

impl From<ParseSignUpRequestError> for ApiError {
    fn from(err: ParseSignUpRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponseData {
    pub message: String,
    pub user_id: String,
}

impl From<SignUpOutcome> for SignUpResponseData {
    fn from(outcome: SignUpOutcome) -> Self {
        Self {
            message: outcome.message,
            user_id: outcome.user_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, name: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_request_normalizes_email() {
        let command = request(" A@X.com ", "Ann Lee", "Secret123!")
            .try_into_command()
            .unwrap();
        assert_eq!(command.email.as_str(), "a@x.com");
        assert_eq!(command.name.as_str(), "Ann Lee");
    }

    #[test]
    fn test_invalid_fields_rejected() {
        assert!(matches!(
            request("not-an-email", "Ann Lee", "Secret123!").try_into_command(),
            Err(ParseSignUpRequestError::Email(_))
        ));
        assert!(matches!(
            request("a@x.com", "An", "Secret123!").try_into_command(),
            Err(ParseSignUpRequestError::Name(_))
        ));
        assert!(matches!(
            request("a@x.com", "Ann Lee", "short").try_into_command(),
            Err(ParseSignUpRequestError::Password(_))
        ));
    }
}
