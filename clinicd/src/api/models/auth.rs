//! API models for authentication flows.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::UserResponse;
use crate::store::models::otp::OtpPurpose;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Request body for `POST /auth/verify-otp`. `type` says which flow the code
/// completes; it must match the outstanding challenge.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
    #[serde(rename = "type")]
    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// The reset link is also emailed; it is returned here because the
    /// original deployment had no outbound mail in some environments.
    pub reset_link: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub email: String,
    pub new_password: String,
}

/// Successful sign-in/sign-up/verify body. The session cookie rides on the
/// same response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
}

/// Returned instead of a session when one-time codes are enabled: the client
/// must complete `verify-otp` before it gets a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallengeResponse {
    #[serde(rename = "requiresOTP")]
    pub requires_otp: bool,
    pub contact_method: String,
    pub contact_value: String,
}

impl OtpChallengeResponse {
    pub fn email_challenge(email: &str) -> Self {
        Self {
            requires_otp: true,
            contact_method: "email".to_string(),
            contact_value: mask_email(email),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Mask an email for display: keep the first character of the local part and
/// the full domain, e.g. `p***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}
