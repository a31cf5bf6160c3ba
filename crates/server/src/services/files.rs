use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{
        self,
        models::{FileNode, NodeKind},
        Database,
    },
    error::{AppError, Result},
};

/// Hard cap on stored file content, in bytes (100 KiB).
pub const MAX_CONTENT_BYTES: usize = 102_400;

/// Syntax-highlighting language derived from a filename's extension.
pub fn language_from_extension(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "js" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "css" => "css",
        "scss" => "scss",
        "html" => "html",
        "json" => "json",
        "md" => "markdown",
        "txt" => "text",
        _ => "text",
    }
}

#[derive(Debug)]
pub struct NewNode {
    pub project_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    pub content: Option<String>,
}

#[derive(Debug, Default)]
pub struct NodePatch {
    pub name: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    pub is_read_only: Option<bool>,
}

/// A node with its children attached, for the editor's tree sidebar.
/// Storage stays flat; this view is rebuilt on every read.
#[derive(Debug, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: FileNode,
    pub children: Vec<TreeNode>,
}

/// Groups a flat, ordered node list by parent and assembles the forest.
/// Input order (folders first, then names) is preserved at every level.
/// Assembly walks an explicit stack, like folder deletion, so nesting
/// depth never grows the call stack.
pub fn build_tree(nodes: Vec<FileNode>) -> Vec<TreeNode> {
    let mut child_ids: HashMap<String, Vec<String>> = HashMap::new();
    let mut arena: HashMap<String, TreeNode> = HashMap::new();
    let mut root_ids = Vec::new();

    for node in nodes {
        match node.parent_id.clone() {
            Some(parent) => child_ids
                .entry(parent)
                .or_default()
                .push(node.id.clone()),
            None => root_ids.push(node.id.clone()),
        }
        arena.insert(
            node.id.clone(),
            TreeNode {
                node,
                children: Vec::new(),
            },
        );
    }

    // Preorder walk; replayed in reverse it reaches every folder only
    // after its descendants, so each subtree is complete when claimed.
    let mut order = Vec::new();
    let mut stack = root_ids.clone();
    while let Some(id) = stack.pop() {
        if let Some(children) = child_ids.get(&id) {
            stack.extend(children.iter().cloned());
        }
        order.push(id);
    }

    for id in order.iter().rev() {
        let children = match child_ids.get(id) {
            Some(ids) => ids
                .iter()
                .filter_map(|child| arena.remove(child))
                .collect(),
            None => continue,
        };
        if let Some(parent) = arena.get_mut(id) {
            parent.children = children;
        }
    }

    // Orphans (parent missing from the input) are dropped with the arena.
    root_ids
        .iter()
        .filter_map(|id| arena.remove(id))
        .collect()
}

fn child_path(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        Some(parent) => format!("{}/{name}", parent.trim_end_matches('/')),
        None => format!("/{name}"),
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AppError::Validation("File name is required".to_string()));
    }
    if name.len() > 100 {
        return Err(AppError::Validation(
            "File name cannot exceed 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn check_content_size(content: &str) -> Result<()> {
    if content.len() > MAX_CONTENT_BYTES {
        return Err(AppError::Validation(
            "File content cannot exceed 100KB".to_string(),
        ));
    }
    Ok(())
}

/// Tree operations over a project's files: ownership checks, sibling-name
/// collisions, language inference and recursive deletion.
#[derive(Clone)]
pub struct FileTreeService {
    db: Database,
}

impl FileTreeService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Ownership gate for project-scoped calls. Missing and inaccessible
    /// projects are indistinguishable to the caller.
    async fn check_project_access(&self, project_id: &str, requester_id: &str) -> Result<()> {
        db::projects::find_owned(&self.db.pool, project_id, requester_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
        Ok(())
    }

    /// Loads a node and verifies the requester owns its project.
    async fn load_node(&self, file_id: &str, requester_id: &str) -> Result<FileNode> {
        let node = db::files::find_by_id(&self.db.pool, file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let owned =
            db::projects::find_owned(&self.db.pool, &node.project_id, requester_id).await?;
        if owned.is_none() {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        Ok(node)
    }

    pub async fn list(&self, project_id: &str, requester_id: &str) -> Result<Vec<FileNode>> {
        self.check_project_access(project_id, requester_id).await?;
        db::files::list_by_project(&self.db.pool, project_id).await
    }

    pub async fn tree(&self, project_id: &str, requester_id: &str) -> Result<Vec<TreeNode>> {
        let nodes = self.list(project_id, requester_id).await?;
        Ok(build_tree(nodes))
    }

    pub async fn get(&self, file_id: &str, requester_id: &str) -> Result<FileNode> {
        self.load_node(file_id, requester_id).await
    }

    pub async fn create(&self, requester_id: &str, input: NewNode) -> Result<FileNode> {
        self.check_project_access(&input.project_id, requester_id)
            .await?;

        let name = input.name.trim().to_string();
        validate_name(&name)?;

        // A parent must be a folder in the same project; parent assignment
        // is fixed at creation, which is what keeps the tree acyclic.
        let parent_path = match input.parent_id.as_deref() {
            Some(parent_id) => {
                let parent = db::files::find_by_id(&self.db.pool, parent_id)
                    .await?
                    .filter(|p| p.is_folder() && p.project_id == input.project_id)
                    .ok_or_else(|| {
                        AppError::Validation(
                            "Parent must be an existing folder in this project".to_string(),
                        )
                    })?;
                Some(parent.path)
            }
            None => None,
        };

        if db::files::sibling_exists(
            &self.db.pool,
            &input.project_id,
            input.parent_id.as_deref(),
            &name,
            None,
        )
        .await?
        {
            let what = match input.kind {
                NodeKind::Folder => "Folder",
                NodeKind::File => "File",
            };
            return Err(AppError::Conflict(format!(
                "{what} with this name already exists"
            )));
        }

        let (content, language) = match input.kind {
            NodeKind::File => {
                let content = input.content.unwrap_or_default();
                check_content_size(&content)?;
                (Some(content), Some(language_from_extension(&name).to_string()))
            }
            NodeKind::Folder => (None, None),
        };

        let now = Utc::now();
        let node = FileNode {
            id: Uuid::new_v4().to_string(),
            path: child_path(parent_path.as_deref(), &name),
            project_id: input.project_id,
            parent_id: input.parent_id,
            name,
            kind: input.kind,
            size_in_bytes: content.as_deref().map(str::len).unwrap_or(0) as i64,
            content,
            language,
            is_read_only: false,
            created_at: now,
            updated_at: now,
        };

        db::files::insert(&self.db.pool, &node).await?;

        Ok(node)
    }

    pub async fn update(
        &self,
        file_id: &str,
        requester_id: &str,
        patch: NodePatch,
    ) -> Result<FileNode> {
        let mut node = self.load_node(file_id, requester_id).await?;

        if let Some(content) = patch.content {
            if node.is_folder() {
                return Err(AppError::BadRequest(
                    "Cannot set content of a folder".to_string(),
                ));
            }
            if node.is_read_only {
                return Err(AppError::Validation("File is read-only".to_string()));
            }
            check_content_size(&content)?;
            node.size_in_bytes = content.len() as i64;
            node.content = Some(content);
        }

        if let Some(new_name) = patch.name {
            self.apply_rename(&mut node, new_name.trim()).await?;
        }

        if let Some(language) = patch.language {
            if !node.is_folder() {
                node.language = Some(language);
            }
        }

        // Toggled last, so locking a file and writing its final content in
        // one request works.
        if let Some(is_read_only) = patch.is_read_only {
            if !node.is_folder() {
                node.is_read_only = is_read_only;
            }
        }

        node.updated_at = Utc::now();
        db::files::update(&self.db.pool, &node).await?;

        Ok(node)
    }

    pub async fn rename(
        &self,
        file_id: &str,
        requester_id: &str,
        new_name: &str,
    ) -> Result<FileNode> {
        let mut node = self.load_node(file_id, requester_id).await?;

        self.apply_rename(&mut node, new_name.trim()).await?;

        node.updated_at = Utc::now();
        db::files::update(&self.db.pool, &node).await?;

        Ok(node)
    }

    /// Renames in place: collision check against siblings (the node itself
    /// excluded, so a same-name rename is a no-op), language re-derived for
    /// files, descendant paths rewritten for folders.
    async fn apply_rename(&self, node: &mut FileNode, new_name: &str) -> Result<()> {
        validate_name(new_name)?;

        if db::files::sibling_exists(
            &self.db.pool,
            &node.project_id,
            node.parent_id.as_deref(),
            new_name,
            Some(&node.id),
        )
        .await?
        {
            return Err(AppError::Conflict("Name already exists".to_string()));
        }

        let old_path = node.path.clone();
        let parent_prefix = old_path
            .rsplit_once('/')
            .map(|(prefix, _)| prefix.to_string())
            .unwrap_or_default();
        let new_path = format!("{parent_prefix}/{new_name}");

        node.name = new_name.to_string();
        node.path = new_path.clone();
        if !node.is_folder() {
            node.language = Some(language_from_extension(new_name).to_string());
        } else if old_path != new_path {
            db::files::rewrite_descendant_paths(
                &self.db.pool,
                &node.project_id,
                &old_path,
                &new_path,
            )
            .await?;
        }

        Ok(())
    }

    /// Deletes a node; a folder takes its whole subtree with it. The
    /// traversal uses an explicit stack so nesting depth never grows the
    /// call stack, and descendants are removed before their ancestors.
    pub async fn delete(&self, file_id: &str, requester_id: &str) -> Result<NodeKind> {
        let node = self.load_node(file_id, requester_id).await?;

        if node.is_folder() {
            // Preorder collection; reversed, every node comes after all of
            // its descendants.
            let mut order = Vec::new();
            let mut stack = vec![node.id.clone()];
            while let Some(id) = stack.pop() {
                for child in db::files::children_of(&self.db.pool, &id).await? {
                    if child.is_folder() {
                        stack.push(child.id.clone());
                    }
                    order.push(child.id);
                }
            }

            for id in order.iter().rev() {
                db::files::delete(&self.db.pool, id).await?;
            }
        }

        db::files::delete(&self.db.pool, &node.id).await?;

        Ok(node.kind)
    }
}
