use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{
        self,
        models::{FileNode, NodeKind, Project},
        Database,
    },
    error::{AppError, Result},
    sanitize,
    services::templates,
};

const ROOT_FOLDER_NAME: &str = "src";

/// URL-safe unique identifier: lowercased name reduced to
/// `[a-z0-9-]`, capped at 30 chars, plus a base-36 timestamp suffix.
pub fn generate_slug(name: &str) -> String {
    let mut base = String::new();
    let mut prev_hyphen = true; // swallows leading separators
    for c in name.to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' => {
                if base.len() == 30 {
                    break;
                }
                base.push(c);
                prev_hyphen = false;
            }
            ' ' | '-' => {
                if !prev_hyphen && base.len() < 30 {
                    base.push('-');
                    prev_hyphen = true;
                }
            }
            _ => {}
        }
    }
    let base = base.trim_end_matches('-');

    format!("{base}-{}", base36(Utc::now().timestamp_millis()))
}

fn base36(mut n: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}

#[derive(Debug)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub framework: Option<String>,
}

#[derive(Debug, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub framework: Option<String>,
    pub auto_save: Option<bool>,
    pub theme: Option<String>,
    pub is_public: Option<bool>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AppError::Validation("Project name is required".to_string()));
    }
    if name.len() > 100 {
        return Err(AppError::Validation(
            "Project name cannot exceed 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.len() > 500 {
        return Err(AppError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_framework(framework: &str) -> Result<()> {
    if !templates::SUPPORTED_FRAMEWORKS.contains(&framework) {
        return Err(AppError::Validation(format!(
            "Unsupported framework: {framework}"
        )));
    }
    Ok(())
}

fn validate_theme(theme: &str) -> Result<()> {
    if theme != "light" && theme != "dark" {
        return Err(AppError::Validation(
            "Theme must be 'light' or 'dark'".to_string(),
        ));
    }
    Ok(())
}

/// Project lifecycle: creation with template seeding, listing, ownership
/// checked fetch/update, and delete with file cascade.
#[derive(Clone)]
pub struct ProjectService {
    db: Database,
}

impl ProjectService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, owner_id: &str, input: NewProject) -> Result<Project> {
        let name = sanitize::strip_html(input.name.trim());
        validate_name(&name)?;

        let description = sanitize::clean_description(input.description.as_deref().unwrap_or(""));
        validate_description(&description)?;

        let framework = input.framework.unwrap_or_else(|| "react".to_string());
        validate_framework(&framework)?;

        let now = Utc::now();
        let mut project = Project {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            slug: generate_slug(&name),
            name,
            description,
            root_folder_id: None,
            framework: framework.clone(),
            auto_save: true,
            theme: "light".to_string(),
            is_public: false,
            last_opened_at: now,
            created_at: now,
            updated_at: now,
        };

        db::projects::insert(&self.db.pool, &project).await?;

        // Root folder, then the framework's starter files under it. These
        // are sequential store calls; a crash in between leaves a partial
        // project rather than rolling back.
        let root = FileNode {
            id: Uuid::new_v4().to_string(),
            project_id: project.id.clone(),
            parent_id: None,
            name: ROOT_FOLDER_NAME.to_string(),
            kind: NodeKind::Folder,
            content: None,
            language: None,
            size_in_bytes: 0,
            is_read_only: false,
            path: format!("/{ROOT_FOLDER_NAME}"),
            created_at: now,
            updated_at: now,
        };
        db::files::insert(&self.db.pool, &root).await?;
        db::projects::set_root_folder(&self.db.pool, &project.id, &root.id).await?;
        project.root_folder_id = Some(root.id.clone());

        for file in templates::template_files(&framework) {
            let seed = FileNode {
                id: Uuid::new_v4().to_string(),
                project_id: project.id.clone(),
                parent_id: Some(root.id.clone()),
                name: file.name.to_string(),
                kind: NodeKind::File,
                content: Some(file.content.to_string()),
                language: Some(file.language.to_string()),
                size_in_bytes: file.content.len() as i64,
                is_read_only: false,
                path: format!("{}/{}", root.path, file.name),
                created_at: now,
                updated_at: now,
            };
            db::files::insert(&self.db.pool, &seed).await?;
        }

        Ok(project)
    }

    pub async fn list(&self, owner_id: &str) -> Result<Vec<Project>> {
        db::projects::list_by_owner(&self.db.pool, owner_id).await
    }

    /// Fetch one project with its files, bumping `last_opened_at`.
    pub async fn get(&self, project_id: &str, owner_id: &str) -> Result<(Project, Vec<FileNode>)> {
        let mut project = db::projects::find_owned(&self.db.pool, project_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let files = db::files::list_by_project(&self.db.pool, project_id).await?;

        // One timestamp for both the row and the response.
        let opened_at = Utc::now();
        db::projects::touch_last_opened(&self.db.pool, project_id, opened_at).await?;
        project.last_opened_at = opened_at;

        Ok((project, files))
    }

    pub async fn update(
        &self,
        project_id: &str,
        owner_id: &str,
        patch: ProjectPatch,
    ) -> Result<Project> {
        let mut project = db::projects::find_owned(&self.db.pool, project_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        if let Some(name) = patch.name {
            let name = sanitize::strip_html(name.trim());
            validate_name(&name)?;
            project.name = name;
        }
        if let Some(description) = patch.description {
            let description = sanitize::clean_description(&description);
            validate_description(&description)?;
            project.description = description;
        }
        if let Some(framework) = patch.framework {
            validate_framework(&framework)?;
            project.framework = framework;
        }
        if let Some(auto_save) = patch.auto_save {
            project.auto_save = auto_save;
        }
        if let Some(theme) = patch.theme {
            validate_theme(&theme)?;
            project.theme = theme;
        }
        if let Some(is_public) = patch.is_public {
            project.is_public = is_public;
        }

        project.updated_at = Utc::now();
        db::projects::update(&self.db.pool, &project).await?;

        Ok(project)
    }

    /// Bulk delete of the whole file set, then the project row. No
    /// per-node recursion; there is no cross-project concern.
    pub async fn delete(&self, project_id: &str, owner_id: &str) -> Result<()> {
        db::projects::find_owned(&self.db.pool, project_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        db::files::delete_by_project(&self.db.pool, project_id).await?;
        db::projects::delete(&self.db.pool, project_id).await?;

        Ok(())
    }

    /// Account-deletion cascade: every owned project and its files.
    pub async fn delete_all_owned(&self, owner_id: &str) -> Result<()> {
        for project in db::projects::list_by_owner(&self.db.pool, owner_id).await? {
            db::files::delete_by_project(&self.db.pool, &project.id).await?;
            db::projects::delete(&self.db.pool, &project.id).await?;
        }
        Ok(())
    }
}
