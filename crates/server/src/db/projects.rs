use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{db::models::Project, error::Result};

const COLUMNS: &str = "id, owner_id, name, description, slug, root_folder_id, framework, \
                       auto_save, theme, is_public, last_opened_at, created_at, updated_at";

pub async fn insert(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        "INSERT INTO projects (id, owner_id, name, description, slug, root_folder_id, framework, auto_save, theme, is_public, last_opened_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&project.id)
    .bind(&project.owner_id)
    .bind(&project.name)
    .bind(&project.description)
    .bind(&project.slug)
    .bind(&project.root_folder_id)
    .bind(&project.framework)
    .bind(project.auto_save)
    .bind(&project.theme)
    .bind(project.is_public)
    .bind(project.last_opened_at)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Project>> {
    let project =
        sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(project)
}

/// Ownership-scoped lookup. `None` covers both "does not exist" and
/// "not yours", so callers cannot leak existence across tenants.
pub async fn find_owned(
    pool: &SqlitePool,
    id: &str,
    owner_id: &str,
) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(project)
}

pub async fn list_by_owner(pool: &SqlitePool, owner_id: &str) -> Result<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE owner_id = ? ORDER BY last_opened_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn set_root_folder(pool: &SqlitePool, id: &str, folder_id: &str) -> Result<()> {
    sqlx::query("UPDATE projects SET root_folder_id = ? WHERE id = ?")
        .bind(folder_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn touch_last_opened(pool: &SqlitePool, id: &str, at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE projects SET last_opened_at = ? WHERE id = ?")
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        "UPDATE projects SET name = ?, description = ?, framework = ?, auto_save = ?, theme = ?, is_public = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&project.name)
    .bind(&project.description)
    .bind(&project.framework)
    .bind(project.auto_save)
    .bind(&project.theme)
    .bind(project.is_public)
    .bind(project.updated_at)
    .bind(&project.id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
