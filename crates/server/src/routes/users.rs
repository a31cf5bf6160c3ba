use axum::{
    extract::State,
    routing::{delete, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::{self, models::UserPreferences},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    routes::auth::{
        hash_password, validate_email, validate_password, validate_username, verify_password,
        UserResponse,
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
        .route("/account", delete(delete_account))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub preferences: Option<UserPreferences>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let mut user = db::users::find_by_id(&state.db.pool, &auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(username) = body.username {
        let username = username.trim().to_string();
        validate_username(&username)?;
        user.username = username;
    }
    if let Some(email) = body.email {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        user.email = email;
    }

    if let Some(existing) =
        db::users::find_conflicting(&state.db.pool, Some(&user.id), &user.username, &user.email)
            .await?
    {
        let message = if existing.username == user.username {
            "Username already taken"
        } else {
            "Email already registered"
        };
        return Err(AppError::Conflict(message.to_string()));
    }

    if let Some(preferences) = body.preferences {
        if preferences.theme != "light" && preferences.theme != "dark" {
            return Err(AppError::Validation(
                "Theme must be 'light' or 'dark'".to_string(),
            ));
        }
        if !(10..=24).contains(&preferences.font_size) {
            return Err(AppError::Validation(
                "Font size must be between 10 and 24".to_string(),
            ));
        }
        user.theme = preferences.theme;
        user.font_size = preferences.font_size;
        user.auto_save = preferences.auto_save;
    }

    user.updated_at = Utc::now();
    db::users::update_profile(&state.db.pool, &user).await?;

    Ok(Json(user.into()))
}

async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = db::users::find_by_id(&state.db.pool, &auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&body.current_password, &user.password_hash)? {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    validate_password(&body.new_password)?;

    let hash = hash_password(&body.new_password)?;
    db::users::update_password(&state.db.pool, &user.id, &hash).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully",
    })))
}

/// Password-confirmed account deletion. Cascades through every owned
/// project and its files before removing the user row.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<DeleteAccountRequest>,
) -> Result<Json<serde_json::Value>> {
    let user = db::users::find_by_id(&state.db.pool, &auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::Validation("Password is incorrect".to_string()));
    }

    state.projects.delete_all_owned(&user.id).await?;
    db::users::delete(&state.db.pool, &user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account deleted successfully",
    })))
}
