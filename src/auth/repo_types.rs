use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. A NULL password hash marks an account created
/// through an external login method.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub email_verified: bool,
    pub created_at: OffsetDateTime,
}

/// Pending email verification. The unique constraint on `user_id` guarantees
/// at most one row per user.
#[derive(Debug, Clone, FromRow)]
pub struct UserVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub otp_hash: String,
    pub otp_expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}
