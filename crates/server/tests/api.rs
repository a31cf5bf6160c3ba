use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use cipherstudio_server::{app, config::Config, db::Database, AppState};

async fn test_server() -> TestServer {
    let db = Database::connect_in_memory().await.unwrap();
    db.run_migrations().await.unwrap();

    let config = Config {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
    };

    TestServer::new(app(AppState::new(db, config))).unwrap()
}

async fn register(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter42",
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

async fn create_project(server: &TestServer, token: &str, name: &str) -> Value {
    let response = server
        .post("/api/projects")
        .authorization_bearer(token)
        .json(&json!({ "name": name }))
        .await;

    response.assert_status_ok();
    response.json()
}

async fn project_files(server: &TestServer, token: &str, project_id: &str) -> Vec<Value> {
    let response = server
        .get(&format!("/api/files/project/{project_id}"))
        .authorization_bearer(token)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    body["files"].as_array().unwrap().clone()
}

#[tokio::test]
async fn health_check_works() {
    let server = test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn register_login_and_profile() {
    let server = test_server().await;

    let token = register(&server, "alice").await;

    // Wrong password is rejected without detail
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "wrong-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "hunter42" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password_hash").is_none());

    let response = server
        .get("/api/auth/profile")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["preferences"]["theme"], "light");
    assert_eq!(body["preferences"]["font_size"], 14);
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let server = test_server().await;

    register(&server, "alice").await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "hunter42",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "bad name!",
            "email": "bad@example.com",
            "password": "hunter42",
        }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "short",
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn protected_routes_require_token() {
    let server = test_server().await;

    let response = server.get("/api/projects").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/projects")
        .authorization_bearer("not-a-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_project_is_seeded_from_template() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    assert!(project["slug"].as_str().unwrap().starts_with("demo-"));
    assert_eq!(project["settings"]["framework"], "react");
    assert!(project["root_folder_id"].is_string());

    let files = project_files(&server, &token, project["id"].as_str().unwrap()).await;
    assert_eq!(files.len(), 4);

    // Folders sort before files
    assert_eq!(files[0]["name"], "src");
    assert_eq!(files[0]["kind"], "folder");
    assert!(files[0]["parent_id"].is_null());
    assert!(files[0].get("content").is_none());

    let names: Vec<&str> = files[1..].iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["App.css", "App.jsx", "index.js"]);

    let app_jsx = &files[2];
    assert_eq!(app_jsx["language"], "jsx");
    assert_eq!(app_jsx["path"], "/src/App.jsx");
    assert_eq!(app_jsx["parent_id"], project["root_folder_id"]);
}

#[tokio::test]
async fn sibling_names_are_unique_and_self_rename_is_allowed() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();
    let root_id = project["root_folder_id"].as_str().unwrap();

    let files = project_files(&server, &token, project_id).await;
    let app_jsx_id = files
        .iter()
        .find(|f| f["name"] == "App.jsx")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Renaming to its own name is not a collision
    let response = server
        .put(&format!("/api/files/{app_jsx_id}/rename"))
        .authorization_bearer(&token)
        .json(&json!({ "new_name": "App.jsx" }))
        .await;
    response.assert_status_ok();

    // A second sibling with the same name is
    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": root_id,
            "name": "App.jsx",
            "kind": "file",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Same name under a different parent is fine
    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": null,
            "name": "App.jsx",
            "kind": "file",
        }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn rename_changes_language_and_descendant_paths() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();
    let root_id = project["root_folder_id"].as_str().unwrap();

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": root_id,
            "name": "components",
            "kind": "folder",
        }))
        .await;
    response.assert_status_ok();
    let folder: Value = response.json();
    assert_eq!(folder["path"], "/src/components");

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": folder["id"],
            "name": "Button.jsx",
            "kind": "file",
            "content": "export default () => null;",
        }))
        .await;
    response.assert_status_ok();
    let button: Value = response.json();
    assert_eq!(button["language"], "jsx");
    assert_eq!(button["path"], "/src/components/Button.jsx");

    // File rename re-derives the language
    let response = server
        .put(&format!("/api/files/{}/rename", button["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .json(&json!({ "new_name": "Button.ts" }))
        .await;
    response.assert_status_ok();
    let renamed: Value = response.json();
    assert_eq!(renamed["language"], "typescript");
    assert_eq!(renamed["path"], "/src/components/Button.ts");

    // Folder rename rewrites descendant paths
    let response = server
        .put(&format!("/api/files/{}/rename", folder["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .json(&json!({ "new_name": "widgets" }))
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/files/{}", button["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let button: Value = response.json();
    assert_eq!(button["path"], "/src/widgets/Button.ts");
}

#[tokio::test]
async fn folder_rename_leaves_lookalike_siblings_alone() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();

    // "a_b" would match "axb" if the rename treated the old path as a
    // LIKE pattern
    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": null,
            "name": "a_b",
            "kind": "folder",
        }))
        .await;
    response.assert_status_ok();
    let renamed_folder: Value = response.json();

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": null,
            "name": "axb",
            "kind": "folder",
        }))
        .await;
    response.assert_status_ok();
    let sibling: Value = response.json();

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": sibling["id"],
            "name": "f.js",
            "kind": "file",
        }))
        .await;
    response.assert_status_ok();
    let bystander: Value = response.json();

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": renamed_folder["id"],
            "name": "g.js",
            "kind": "file",
        }))
        .await;
    response.assert_status_ok();
    let descendant: Value = response.json();

    let response = server
        .put(&format!(
            "/api/files/{}/rename",
            renamed_folder["id"].as_str().unwrap()
        ))
        .authorization_bearer(&token)
        .json(&json!({ "new_name": "renamed" }))
        .await;
    response.assert_status_ok();

    // The real descendant moved
    let response = server
        .get(&format!("/api/files/{}", descendant["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["path"], "/renamed/g.js");

    // The lookalike sibling's file did not
    let response = server
        .get(&format!("/api/files/{}", bystander["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["path"], "/axb/f.js");
}

#[tokio::test]
async fn read_only_files_reject_content_writes() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();

    let files = project_files(&server, &token, project_id).await;
    let app_jsx_id = files
        .iter()
        .find(|f| f["name"] == "App.jsx")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Locking and writing final content in one request is allowed
    let response = server
        .put(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .json(&json!({ "content": "// frozen", "is_read_only": true }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["is_read_only"], true);

    let response = server
        .put(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .json(&json!({ "content": "// overwrite" }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .get(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_eq!(body["content"], "// frozen");

    // Unlocking makes it writable again
    let response = server
        .put(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .json(&json!({ "is_read_only": false }))
        .await;
    response.assert_status_ok();

    let response = server
        .put(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .json(&json!({ "content": "// thawed" }))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn tree_view_nests_children_under_their_folders() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();
    let root_id = project["root_folder_id"].as_str().unwrap();

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": root_id,
            "name": "components",
            "kind": "folder",
        }))
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/files/project/{project_id}/tree"))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    let tree = body["tree"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["name"], "src");

    let children = tree[0]["children"].as_array().unwrap();
    assert_eq!(children.len(), 4);
    // Folder first, then the seeded files by name
    assert_eq!(children[0]["name"], "components");
    assert_eq!(children[1]["name"], "App.css");
}

#[tokio::test]
async fn folder_delete_removes_entire_subtree() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();
    let root_id = project["root_folder_id"].as_str().unwrap();

    // Nested: src/components/forms/Input.jsx
    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": root_id,
            "name": "components",
            "kind": "folder",
        }))
        .await;
    let components: Value = response.json();

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": components["id"],
            "name": "forms",
            "kind": "folder",
        }))
        .await;
    let forms: Value = response.json();

    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": forms["id"],
            "name": "Input.jsx",
            "kind": "file",
        }))
        .await;
    let input: Value = response.json();

    let response = server
        .delete(&format!("/api/files/{root_id}"))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let files = project_files(&server, &token, project_id).await;
    assert!(files.is_empty());

    // Everything under the deleted root is gone, including nested leaves
    let response = server
        .get(&format!("/api/files/{}", input["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn content_updates_enforce_size_and_kind() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();
    let root_id = project["root_folder_id"].as_str().unwrap();

    let files = project_files(&server, &token, project_id).await;
    let app_jsx_id = files
        .iter()
        .find(|f| f["name"] == "App.jsx")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // size_in_bytes is the UTF-8 byte length, not the char count
    let response = server
        .put(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .json(&json!({ "content": "héllo 🚀" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["size_in_bytes"], 11);
    assert_eq!(body["content"], "héllo 🚀");

    // Over the 100 KiB cap
    let response = server
        .put(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .json(&json!({ "content": "a".repeat(102_401) }))
        .await;
    response.assert_status_bad_request();

    // Content stayed at the last good write
    let response = server
        .get(&format!("/api/files/{app_jsx_id}"))
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_eq!(body["size_in_bytes"], 11);

    // Folders have no content
    let response = server
        .put(&format!("/api/files/{root_id}"))
        .authorization_bearer(&token)
        .json(&json!({ "content": "nope" }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn parent_must_be_a_folder_in_the_same_project() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();

    let files = project_files(&server, &token, project_id).await;
    let app_jsx_id = files
        .iter()
        .find(|f| f["name"] == "App.jsx")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // A file cannot be a parent
    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": app_jsx_id,
            "name": "nested.js",
            "kind": "file",
        }))
        .await;
    response.assert_status_bad_request();

    // Neither can a folder from another project
    let other = create_project(&server, &token, "Other").await;
    let response = server
        .post("/api/files")
        .authorization_bearer(&token)
        .json(&json!({
            "project_id": project_id,
            "parent_id": other["root_folder_id"],
            "name": "stray.js",
            "kind": "file",
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn projects_are_invisible_across_tenants() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;
    let mallory = register(&server, "mallory").await;

    let project = create_project(&server, &alice, "Secret").await;
    let project_id = project["id"].as_str().unwrap();

    // Existence is not revealed at the project level
    let response = server
        .get(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&mallory)
        .await;
    response.assert_status_not_found();

    let response = server
        .get(&format!("/api/files/project/{project_id}"))
        .authorization_bearer(&mallory)
        .await;
    response.assert_status_not_found();

    // File access on someone else's node is forbidden
    let files = project_files(&server, &alice, project_id).await;
    let file_id = files[1]["id"].as_str().unwrap();
    let response = server
        .get(&format!("/api/files/{file_id}"))
        .authorization_bearer(&mallory)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // And mallory cannot delete alice's project
    let response = server
        .delete(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&mallory)
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn project_listing_is_most_recently_opened_first() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let first = create_project(&server, &token, "First").await;
    let _second = create_project(&server, &token, "Second").await;

    // Opening the older project moves it to the front
    let response = server
        .get(&format!("/api/projects/{}", first["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/projects")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["projects"][0]["name"], "First");
}

#[tokio::test]
async fn get_reports_the_stored_last_opened_time() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;
    let project_id = project["id"].as_str().unwrap();

    let response = server
        .get(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let reported = body["project"]["last_opened_at"].clone();

    // The listing reads the row back; it must carry the same instant the
    // get response reported
    let response = server
        .get("/api/projects")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["projects"][0]["last_opened_at"], reported);
}

#[tokio::test]
async fn project_update_sanitizes_input() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Demo").await;

    let response = server
        .put(&format!("/api/projects/{}", project["id"].as_str().unwrap()))
        .authorization_bearer(&token)
        .json(&json!({
            "name": "<b>Renamed</b> Demo",
            "description": "<b>bold</b><script>alert(1)</script>",
            "settings": { "theme": "dark" },
            "is_public": true,
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["name"], "Renamed Demo");
    let description = body["description"].as_str().unwrap();
    assert!(description.contains("<b>bold</b>"));
    assert!(!description.contains("<script>"));
    assert_eq!(body["settings"]["theme"], "dark");
    assert_eq!(body["is_public"], true);

    // Slug is fixed at creation
    assert_eq!(body["slug"], project["slug"]);
}

#[tokio::test]
async fn deleting_a_project_removes_all_its_files() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let project = create_project(&server, &token, "Doomed").await;
    let project_id = project["id"].as_str().unwrap();

    let files = project_files(&server, &token, project_id).await;
    let file_id = files[1]["id"].as_str().unwrap().to_string();

    let response = server
        .delete(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();

    let response = server
        .get(&format!("/api/projects/{project_id}"))
        .authorization_bearer(&token)
        .await;
    response.assert_status_not_found();

    let response = server
        .get(&format!("/api/files/{file_id}"))
        .authorization_bearer(&token)
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn profile_password_and_account_lifecycle() {
    let server = test_server().await;
    let token = register(&server, "alice").await;

    let response = server
        .put("/api/users/profile")
        .authorization_bearer(&token)
        .json(&json!({
            "preferences": { "theme": "dark", "font_size": 16, "auto_save": false },
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["preferences"]["theme"], "dark");
    assert_eq!(body["preferences"]["font_size"], 16);

    // Password change requires the current password
    let response = server
        .put("/api/users/password")
        .authorization_bearer(&token)
        .json(&json!({ "current_password": "wrong", "new_password": "new-password" }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .put("/api/users/password")
        .authorization_bearer(&token)
        .json(&json!({ "current_password": "hunter42", "new_password": "new-password" }))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "hunter42" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "new-password" }))
        .await;
    response.assert_status_ok();

    // Account deletion cascades through projects
    create_project(&server, &token, "Gone Soon").await;
    let response = server
        .delete("/api/users/account")
        .authorization_bearer(&token)
        .json(&json!({ "password": "new-password" }))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "new-password" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn username_update_detects_conflicts() {
    let server = test_server().await;
    let alice = register(&server, "alice").await;
    register(&server, "bob").await;

    let response = server
        .put("/api/users/profile")
        .authorization_bearer(&alice)
        .json(&json!({ "username": "bob" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Keeping your own name is not a conflict
    let response = server
        .put("/api/users/profile")
        .authorization_bearer(&alice)
        .json(&json!({ "username": "alice" }))
        .await;
    response.assert_status_ok();
}
