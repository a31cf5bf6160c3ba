use sqlx::SqlitePool;

use crate::{db::models::FileNode, error::Result};

const COLUMNS: &str = "id, project_id, parent_id, name, kind, content, language, \
                       size_in_bytes, is_read_only, path, created_at, updated_at";

pub async fn insert(pool: &SqlitePool, node: &FileNode) -> Result<()> {
    sqlx::query(
        "INSERT INTO files (id, project_id, parent_id, name, kind, content, language, size_in_bytes, is_read_only, path, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&node.id)
    .bind(&node.project_id)
    .bind(&node.parent_id)
    .bind(&node.name)
    .bind(node.kind)
    .bind(&node.content)
    .bind(&node.language)
    .bind(node.size_in_bytes)
    .bind(node.is_read_only)
    .bind(&node.path)
    .bind(node.created_at)
    .bind(node.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<FileNode>> {
    let node = sqlx::query_as::<_, FileNode>(&format!("SELECT {COLUMNS} FROM files WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(node)
}

/// All nodes of a project, folders before files, names ascending.
pub async fn list_by_project(pool: &SqlitePool, project_id: &str) -> Result<Vec<FileNode>> {
    let nodes = sqlx::query_as::<_, FileNode>(&format!(
        "SELECT {COLUMNS} FROM files WHERE project_id = ? ORDER BY kind DESC, name ASC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(nodes)
}

pub async fn children_of(pool: &SqlitePool, parent_id: &str) -> Result<Vec<FileNode>> {
    let nodes = sqlx::query_as::<_, FileNode>(&format!(
        "SELECT {COLUMNS} FROM files WHERE parent_id = ? ORDER BY kind DESC, name ASC"
    ))
    .bind(parent_id)
    .fetch_all(pool)
    .await?;

    Ok(nodes)
}

/// Does another node with this name exist under the same parent?
/// `exclude_id` lets a rename skip the node itself.
pub async fn sibling_exists(
    pool: &SqlitePool,
    project_id: &str,
    parent_id: Option<&str>,
    name: &str,
    exclude_id: Option<&str>,
) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM files WHERE project_id = ? AND parent_id IS ? AND name = ? AND id IS NOT ?",
    )
    .bind(project_id)
    .bind(parent_id)
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub async fn update(pool: &SqlitePool, node: &FileNode) -> Result<()> {
    sqlx::query(
        "UPDATE files SET name = ?, content = ?, language = ?, size_in_bytes = ?, is_read_only = ?, path = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&node.name)
    .bind(&node.content)
    .bind(&node.language)
    .bind(node.size_in_bytes)
    .bind(node.is_read_only)
    .bind(&node.path)
    .bind(node.updated_at)
    .bind(&node.id)
    .execute(pool)
    .await?;

    Ok(())
}

/// After a folder rename, move every descendant path from the old prefix
/// to the new one in a single statement. The prefix is matched with an
/// exact substr comparison, not LIKE, so `%` and `_` in folder names stay
/// literal.
pub async fn rewrite_descendant_paths(
    pool: &SqlitePool,
    project_id: &str,
    old_prefix: &str,
    new_prefix: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE files SET path = ? || substr(path, length(?) + 1) \
         WHERE project_id = ? AND substr(path, 1, length(?) + 1) = ? || '/'",
    )
    .bind(new_prefix)
    .bind(old_prefix)
    .bind(project_id)
    .bind(old_prefix)
    .bind(old_prefix)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM files WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_by_project(pool: &SqlitePool, project_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM files WHERE project_id = ?")
        .bind(project_id)
        .execute(pool)
        .await?;

    Ok(())
}
