use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, PublicUser, ResendCodeRequest, SessionResponse, SignUpRequest,
            VerificationPendingResponse, VerifyEmailRequest,
        },
        jwt::JwtKeys,
        otp::{generate_otp, is_expired},
        password::{hash_secret, verify_secret},
        repo_types::{User, UserVerification},
    },
    error::ApiError,
    mailer::{EmailTemplate, MailError, Mailer},
    response::ApiData,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/verification-code", post(resend_code))
        .route("/auth/log-in", post(login))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hint appended to the account-exists conflict, depending on whether the
/// verified account carries a password.
fn login_hint(user: &User) -> &'static str {
    if user.password_hash.is_some() {
        "Please login."
    } else {
        "Try login method."
    }
}

async fn send_verification_email(
    mailer: &dyn Mailer,
    to: &str,
    code: String,
) -> Result<(), ApiError> {
    match mailer.send(to, EmailTemplate::VerificationCode { code }).await {
        Ok(()) => Ok(()),
        Err(MailError::RecipientNotFound) => {
            warn!(recipient = %to, "verification email recipient not found");
            Err(ApiError::Internal(
                "Email not found. Please enter correct email.".into(),
            ))
        }
        Err(MailError::Delivery(e)) => {
            error!(error = %e, recipient = %to, "verification email delivery failed");
            Err(ApiError::Internal(
                "Cannot send verification email at the moment.".into(),
            ))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(mut payload): Json<SignUpRequest>,
) -> Result<ApiData<VerificationPendingResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.is_empty() || payload.password.len() > 64 {
        warn!("password length out of bounds");
        return Err(ApiError::Validation(
            "Password must be between 1 and 64 characters".into(),
        ));
    }

    // Only a verified account blocks re-signup; a pending one is overwritten.
    if let Some(user) = User::find_by_email(&state.db, &payload.email).await? {
        if user.email_verified {
            warn!(email = %payload.email, "sign-up against verified account");
            return Err(ApiError::Conflict(format!(
                "Account already exists. {}",
                login_hint(&user)
            )));
        }
    }

    let password_hash = hash_secret(&payload.password)?;
    let otp = generate_otp()?;

    let user_id = User::upsert_with_verification(
        &state.db,
        &payload.email,
        &password_hash,
        &otp.hash,
        otp.expires_at,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "sign-up upsert failed");
        ApiError::Internal("Cannot sign up at the moment.".into())
    })?;

    send_verification_email(state.mailer.as_ref(), &payload.email, otp.text).await?;

    let keys = JwtKeys::from_ref(&state);
    let verification_token = keys.sign_verification(user_id, &payload.email)?;

    info!(user_id = %user_id, email = %payload.email, "sign-up pending verification");
    Ok(ApiData(VerificationPendingResponse {
        verification_token,
        otp_expiration: otp.expires_at,
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<ApiData<SessionResponse>, ApiError> {
    if payload.otp.is_empty() || payload.otp.len() > 6 {
        return Err(ApiError::Validation("Invalid OTP".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_verification(&payload.verification_token)
        .map_err(|e| {
            warn!(error = %e, "invalid verification token");
            ApiError::Authentication("Invalid or expired verification token".into())
        })?;

    let user = User::find_by_email(&state.db, &claims.email).await?;
    let verification = UserVerification::find_by_user(&state.db, claims.sub).await?;
    let (Some(user), Some(verification)) = (user, verification) else {
        return Err(ApiError::Conflict("Please sign up first.".into()));
    };

    if is_expired(verification.otp_expires_at) {
        warn!(user_id = %user.id, "otp expired");
        return Err(ApiError::Validation("OTP is expired.".into()));
    }
    if !verify_secret(&payload.otp, &verification.otp_hash) {
        warn!(user_id = %user.id, "otp mismatch");
        return Err(ApiError::Validation("OTP is incorrect.".into()));
    }

    User::mark_verified(&state.db, user.id).await.map_err(|e| {
        error!(error = %e, user_id = %user.id, "mark_verified failed");
        ApiError::Internal("Cannot verify user at the moment.".into())
    })?;

    let token = keys.sign_session(user.id, &user.email)?;

    info!(user_id = %user.id, "email verified");
    Ok(ApiData(SessionResponse {
        token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn resend_code(
    State(state): State<AppState>,
    Json(mut payload): Json<ResendCodeRequest>,
) -> Result<ApiData<VerificationPendingResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        return Err(ApiError::Conflict("Please sign up first".into()));
    };
    if user.email_verified {
        return Err(ApiError::Conflict(format!(
            "Account already exists. {}",
            login_hint(&user)
        )));
    }

    let otp = generate_otp()?;
    UserVerification::upsert(&state.db, user.id, &otp.hash, otp.expires_at)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user.id, "verification upsert failed");
            ApiError::Internal("Cannot send verification code at the moment".into())
        })?;

    send_verification_email(state.mailer.as_ref(), &user.email, otp.text).await?;

    let keys = JwtKeys::from_ref(&state);
    let verification_token = keys.sign_verification(user.id, &user.email)?;

    info!(user_id = %user.id, "verification code resent");
    Ok(ApiData(VerificationPendingResponse {
        verification_token,
        otp_expiration: otp.expires_at,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<ApiData<SessionResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::NotFound("User not found. Please sign up.".into()));
    };

    if !user.email_verified {
        warn!(user_id = %user.id, "login before verification");
        return Err(ApiError::Validation(
            "Email not verified. Verify your email before proceeding.".into(),
        ));
    }

    let Some(password_hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "login with password against external account");
        return Err(ApiError::Validation("Invalid login method.".into()));
    };

    if !verify_secret(&payload.password, password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Validation("Invalid credentials.".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(ApiData(SessionResponse {
        token,
        user: PublicUser::from(user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn verified_user(password_hash: Option<String>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            password_hash,
            email_verified: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn emails_are_normalized_before_lookup() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }

    #[test]
    fn conflict_hint_depends_on_login_method() {
        assert_eq!(login_hint(&verified_user(Some("hash".into()))), "Please login.");
        assert_eq!(login_hint(&verified_user(None)), "Try login method.");
    }

    #[tokio::test]
    async fn mail_errors_map_to_distinct_internal_messages() {
        struct FailingMailer(MailError);
        #[axum::async_trait]
        impl Mailer for FailingMailer {
            async fn send(&self, _to: &str, _template: EmailTemplate) -> Result<(), MailError> {
                Err(match &self.0 {
                    MailError::RecipientNotFound => MailError::RecipientNotFound,
                    MailError::Delivery(m) => MailError::Delivery(m.clone()),
                })
            }
        }

        let err = send_verification_email(
            &FailingMailer(MailError::RecipientNotFound),
            "a@b.com",
            "123456".into(),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::Internal(m) => {
                assert_eq!(m, "Email not found. Please enter correct email.")
            }
            other => panic!("expected Internal, got {other:?}"),
        }

        let err = send_verification_email(
            &FailingMailer(MailError::Delivery("timeout".into())),
            "a@b.com",
            "123456".into(),
        )
        .await
        .unwrap_err();
        match err {
            ApiError::Internal(m) => {
                assert_eq!(m, "Cannot send verification email at the moment.")
            }
            other => panic!("expected Internal, got {other:?}"),
        }
    }
}
