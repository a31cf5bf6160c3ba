use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{FileNode, NodeKind},
    error::Result,
    middleware::auth::AuthUser,
    services::files::{NewNode, NodePatch, TreeNode},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_file))
        .route("/project/:project_id", get(list_files))
        .route("/project/:project_id/tree", get(get_file_tree))
        .route("/:id", get(get_file).put(update_file).delete(delete_file))
        .route("/:id/rename", put(rename_file))
}

#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub project_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFileRequest {
    pub name: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    pub is_read_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileNode>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FileTreeResponse {
    pub tree: Vec<TreeNode>,
}

async fn list_files(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<FileListResponse>> {
    let files = state.files.list(&project_id, &user.id).await?;
    let count = files.len();

    Ok(Json(FileListResponse { files, count }))
}

async fn get_file_tree(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<FileTreeResponse>> {
    let tree = state.files.tree(&project_id, &user.id).await?;

    Ok(Json(FileTreeResponse { tree }))
}

async fn get_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FileNode>> {
    let file = state.files.get(&id, &user.id).await?;

    Ok(Json(file))
}

async fn create_file(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateFileRequest>,
) -> Result<Json<FileNode>> {
    let file = state
        .files
        .create(
            &user.id,
            NewNode {
                project_id: body.project_id,
                parent_id: body.parent_id,
                name: body.name,
                kind: body.kind,
                content: body.content,
            },
        )
        .await?;

    Ok(Json(file))
}

async fn update_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateFileRequest>,
) -> Result<Json<FileNode>> {
    let file = state
        .files
        .update(
            &id,
            &user.id,
            NodePatch {
                name: body.name,
                content: body.content,
                language: body.language,
                is_read_only: body.is_read_only,
            },
        )
        .await?;

    Ok(Json(file))
}

async fn rename_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<RenameFileRequest>,
) -> Result<Json<FileNode>> {
    let file = state.files.rename(&id, &user.id, &body.new_name).await?;

    Ok(Json(file))
}

async fn delete_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let kind = state.files.delete(&id, &user.id).await?;

    let what = match kind {
        NodeKind::Folder => "Folder",
        NodeKind::File => "File",
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("{what} deleted successfully"),
    })))
}
