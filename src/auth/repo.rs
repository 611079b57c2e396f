use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{User, UserVerification};

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, email_verified, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, email_verified, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Sign-up write: the user row and its verification row land together or
    /// not at all. Concurrent sign-ups for one email converge on the unique
    /// constraint instead of erroring.
    pub async fn upsert_with_verification(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        otp_hash: &str,
        otp_expires_at: OffsetDateTime,
    ) -> anyhow::Result<Uuid> {
        let mut tx = db.begin().await?;

        let (user_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET password_hash = EXCLUDED.password_hash
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_verifications (user_id, otp_hash, otp_expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET otp_hash = EXCLUDED.otp_hash,
                    otp_expires_at = EXCLUDED.otp_expires_at,
                    updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(otp_hash)
        .bind(otp_expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user_id)
    }

    /// Flips the verified flag and drops the pending verification in one
    /// transaction; a partial result would violate the one-verification
    /// invariant.
    pub async fn mark_verified(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
        let mut tx = db.begin().await?;

        let updated = sqlx::query(r#"UPDATE users SET email_verified = TRUE WHERE id = $1"#)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            anyhow::bail!("user {user_id} disappeared during verification");
        }

        sqlx::query(r#"DELETE FROM user_verifications WHERE user_id = $1"#)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_password(
        db: &PgPool,
        user_id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE id = $1"#)
            .bind(user_id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

impl UserVerification {
    pub async fn find_by_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Option<UserVerification>> {
        let verification = sqlx::query_as::<_, UserVerification>(
            r#"
            SELECT id, user_id, otp_hash, otp_expires_at, created_at, updated_at
            FROM user_verifications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(verification)
    }

    /// Resend-code write. Concurrent resends race benignly: the unique
    /// constraint makes the last write win, and only that OTP's plaintext
    /// reaches a mailbox afterwards.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        otp_hash: &str,
        otp_expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_verifications (user_id, otp_hash, otp_expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET otp_hash = EXCLUDED.otp_hash,
                    otp_expires_at = EXCLUDED.otp_expires_at,
                    updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(otp_hash)
        .bind(otp_expires_at)
        .execute(db)
        .await?;
        Ok(())
    }
}
