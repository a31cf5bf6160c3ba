pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod sanitize;
pub mod services;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::util::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use services::{files::FileTreeService, projects::ProjectService};

#[derive(Clone)]
pub struct AppState {
    pub db: db::Database,
    pub config: config::Config,
    pub projects: ProjectService,
    pub files: FileTreeService,
}

impl AppState {
    pub fn new(db: db::Database, config: config::Config) -> Self {
        Self {
            projects: ProjectService::new(db.clone()),
            files: FileTreeService::new(db.clone()),
            db,
            config,
        }
    }
}

/// Builds the full application router: public auth routes, protected
/// user/project/file routes behind the JWT middleware, and the SPA
/// fallback for the editor frontend.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .nest("/auth", routes::auth::protected_router())
        .nest("/users", routes::users::router())
        .nest("/projects", routes::projects::router())
        .nest("/files", routes::files::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    let api_router = Router::new()
        .nest("/auth", routes::auth::router())
        .merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .fallback(serve_spa)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn serve_spa(req: Request<Body>) -> Response {
    let path = req.uri().path();

    // Try to serve static file first
    let static_path = format!("static{path}");
    if std::path::Path::new(&static_path).exists() {
        let serve_dir = ServeDir::new("static");
        if let Ok(res) = serve_dir.oneshot(req).await {
            return res.into_response();
        }
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    // For SPA routes, serve index.html
    match tokio::fs::read("static/index.html").await {
        Ok(contents) => Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "text/html")
            .body(Body::from(contents))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(_) => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Not found"))
            .unwrap_or_else(|_| StatusCode::NOT_FOUND.into_response()),
    }
}
