pub mod extractors;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::AppError;
use crate::models::User;

pub use extractors::CurrentUser;
pub use guard::{policy, AllowedRoles};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer, TokenPair, TokenType};

/// Failures of the authentication slice: credentials, tokens, ledger and reset tokens.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    UserNotFound,
    InvalidCredential,
    InactiveUser,
    InvalidToken,
    TokenExpired,
    TokenRevoked,
    WrongTokenType,
    InvalidResetToken(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::InvalidCredential => write!(f, "Invalid credentials"),
            AuthError::InactiveUser => write!(f, "User account is inactive"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenRevoked => write!(f, "Token has been revoked"),
            AuthError::WrongTokenType => write!(f, "Wrong token type"),
            AuthError::InvalidResetToken(reason) => write!(f, "Invalid reset token: {}", reason),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            // Unknown email and wrong password look the same from outside.
            AuthError::UserNotFound | AuthError::InvalidCredential => {
                AppError::Unauthorized("Invalid email or password".into())
            }
            AuthError::InvalidResetToken(_) => AppError::BadRequest(error.to_string()),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
///
/// Self-registered accounts are always contributors; any `role` field is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyResetTokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    /// The new password.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Optional body of `POST /auth/logout`.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Response after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
    /// The access token.
    pub token: String,
    pub refresh_token: String,
}

impl AuthResponse {
    pub fn new(message: &str, user: User, tokens: TokenPair) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            user,
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}
