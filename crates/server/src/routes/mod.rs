pub mod auth;
pub mod files;
pub mod projects;
pub mod users;
