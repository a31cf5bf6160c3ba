use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub theme: String,
    pub font_size: i64,
    pub auto_save: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editor preferences, stored as flat columns and nested in API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub theme: String,
    pub font_size: i64,
    pub auto_save: bool,
}

impl User {
    pub fn preferences(&self) -> UserPreferences {
        UserPreferences {
            theme: self.theme.clone(),
            font_size: self.font_size,
            auto_save: self.auto_save,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub root_folder_id: Option<String>,
    pub framework: String,
    pub auto_save: bool,
    pub theme: String,
    pub is_public: bool,
    pub last_opened_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub framework: String,
    pub auto_save: bool,
    pub theme: String,
}

impl Project {
    pub fn settings(&self) -> ProjectSettings {
        ProjectSettings {
            framework: self.framework.clone(),
            auto_save: self.auto_save,
            theme: self.theme.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// A file or folder in a project's tree. Folders carry no content or
/// language; `parent_id` of `None` marks a root-level node.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileNode {
    pub id: String,
    pub project_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub size_in_bytes: i64,
    pub is_read_only: bool,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}
