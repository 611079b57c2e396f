use axum::{extract::State, routing::patch, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        jwt::AuthUser,
        password::{hash_secret, verify_secret},
        repo_types::User,
    },
    error::ApiError,
    response::ApiData,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/password", patch(change_password))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: bool,
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiData<UpdatedResponse>, ApiError> {
    if payload.new_password.len() < 6 || payload.new_password.len() > 64 {
        return Err(ApiError::Validation(
            "Password must be between 6 and 64 characters".into(),
        ));
    }

    let Some(user) = User::find_by_id(&state.db, auth.user_id).await? else {
        return Err(ApiError::NotFound("User not found.".into()));
    };

    // An account without a password (external login) may set one without
    // proving the old one.
    if let Some(current_hash) = user.password_hash.as_deref() {
        let old_password = payload.old_password.as_deref().unwrap_or("");
        if !verify_secret(old_password, current_hash) {
            warn!(user_id = %user.id, "password change with wrong old password");
            return Err(ApiError::Validation("Password does not match.".into()));
        }
    }

    let password_hash = hash_secret(&payload.new_password)?;
    let affected = User::update_password(&state.db, auth.user_id, &password_hash).await?;
    if affected == 0 {
        error!(user_id = %auth.user_id, "password update affected no rows");
        return Err(ApiError::Internal(
            "Cannot update password at the moment".into(),
        ));
    }

    info!(user_id = %auth.user_id, "password updated");
    Ok(ApiData(UpdatedResponse { updated: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_password_request_accepts_camel_case_and_optional_old() {
        let parsed: ChangePasswordRequest =
            serde_json::from_str(r#"{"oldPassword":"old-secret","newPassword":"new-secret"}"#)
                .expect("deserialize");
        assert_eq!(parsed.old_password.as_deref(), Some("old-secret"));
        assert_eq!(parsed.new_password, "new-secret");

        let parsed: ChangePasswordRequest =
            serde_json::from_str(r#"{"newPassword":"new-secret"}"#).expect("deserialize");
        assert!(parsed.old_password.is_none());
    }
}
