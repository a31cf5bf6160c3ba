use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{FileNode, Project, ProjectSettings},
    error::Result,
    middleware::auth::AuthUser,
    services::projects::{NewProject, ProjectPatch},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub framework: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsPatch {
    pub framework: Option<String>,
    pub auto_save: Option<bool>,
    pub theme: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<SettingsPatch>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub root_folder_id: Option<String>,
    pub settings: ProjectSettings,
    pub is_public: bool,
    pub last_opened_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            settings: project.settings(),
            id: project.id,
            owner_id: project.owner_id,
            name: project.name,
            description: project.description,
            slug: project.slug,
            root_folder_id: project.root_folder_id,
            is_public: project.is_public,
            last_opened_at: project.last_opened_at,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProjectWithFilesResponse {
    pub project: ProjectResponse,
    pub files: Vec<FileNode>,
}

async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProjectListResponse>> {
    let projects = state.projects.list(&user.id).await?;

    let projects: Vec<ProjectResponse> = projects.into_iter().map(Into::into).collect();
    let count = projects.len();

    Ok(Json(ProjectListResponse { projects, count }))
}

async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    let project = state
        .projects
        .create(
            &user.id,
            NewProject {
                name: body.name,
                description: body.description,
                framework: body.framework,
            },
        )
        .await?;

    Ok(Json(project.into()))
}

async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectWithFilesResponse>> {
    let (project, files) = state.projects.get(&id, &user.id).await?;

    Ok(Json(ProjectWithFilesResponse {
        project: project.into(),
        files,
    }))
}

async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    let settings = body.settings.unwrap_or(SettingsPatch {
        framework: None,
        auto_save: None,
        theme: None,
    });

    let project = state
        .projects
        .update(
            &id,
            &user.id,
            ProjectPatch {
                name: body.name,
                description: body.description,
                framework: settings.framework,
                auto_save: settings.auto_save,
                theme: settings.theme,
                is_public: body.is_public,
            },
        )
        .await?;

    Ok(Json(project.into()))
}

async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.projects.delete(&id, &user.id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Project deleted successfully",
    })))
}
