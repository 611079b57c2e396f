use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for sign-up.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for email verification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub verification_token: String,
    pub otp: String,
}

/// Request body for resending a verification code.
#[derive(Debug, Deserialize)]
pub struct ResendCodeRequest {
    pub email: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Returned after login and after successful verification.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Returned while verification is still pending (sign-up, resend-code).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPendingResponse {
    pub verification_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub otp_expiration: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_camel_case_rfc3339() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            created_at: time::macros::datetime!(2026-01-02 03:04:05 UTC),
        };
        let json = serde_json::to_value(&user).expect("serialize");
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["createdAt"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn verify_email_request_accepts_camel_case() {
        let parsed: VerifyEmailRequest =
            serde_json::from_str(r#"{"verificationToken":"tok","otp":"123456"}"#)
                .expect("deserialize");
        assert_eq!(parsed.verification_token, "tok");
        assert_eq!(parsed.otp, "123456");
    }
}
