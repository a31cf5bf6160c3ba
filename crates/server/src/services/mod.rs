pub mod files;
pub mod projects;
pub mod templates;
