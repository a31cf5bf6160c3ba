use sqlx::SqlitePool;

use crate::{db::models::User, error::Result};

const COLUMNS: &str = "id, username, email, password_hash, is_active, theme, \
                       font_size, auto_save, created_at, updated_at";

pub async fn insert(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, is_active, theme, font_size, auto_save, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.is_active)
    .bind(&user.theme)
    .bind(user.font_size)
    .bind(user.auto_save)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Looks for another user already holding either of the given keys.
/// Used for the friendly duplicate message; the UNIQUE indexes remain the
/// authority if a concurrent write slips past this check.
pub async fn find_conflicting(
    pool: &SqlitePool,
    exclude_id: Option<&str>,
    username: &str,
    email: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE (username = ? OR email = ?) AND id IS NOT ?"
    ))
    .bind(username)
    .bind(email)
    .bind(exclude_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn update_profile(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        "UPDATE users SET username = ?, email = ?, theme = ?, font_size = ?, auto_save = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.theme)
    .bind(user.font_size)
    .bind(user.auto_save)
    .bind(user.updated_at)
    .bind(&user.id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_password(pool: &SqlitePool, id: &str, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
