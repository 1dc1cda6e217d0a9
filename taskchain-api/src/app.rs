/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskchain_api::{app::{build_router, AppState}, config::Config};
/// use taskchain_shared::{store::PgStore, workflow::WorkflowService};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let workflow = WorkflowService::new(Arc::new(PgStore::new(pool.clone())));
/// let app = build_router(AppState::new(pool, workflow, config));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskchain_shared::workflow::WorkflowService;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (accounts and health check)
    pub db: PgPool,

    /// Task and scenario operations
    pub workflow: Arc<WorkflowService>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, workflow: WorkflowService, config: Config) -> Self {
        Self {
            db,
            workflow: Arc::new(workflow),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── /auth/                        (public)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /refresh
///     │   ├── POST /verify-email
///     │   ├── POST /password-reset
///     │   └── POST /password-reset/confirm
///     ├── /scenarios/                   (JWT)
///     │   ├── POST   /
///     │   ├── GET    /
///     │   ├── GET    /:id
///     │   ├── DELETE /:id
///     │   └── POST   /:id/tasks
///     └── /tasks/                       (JWT)
///         ├── GET    /                  ungrouped tasks
///         ├── POST   /                  ungrouped task
///         ├── GET    /:id
///         ├── DELETE /:id
///         ├── POST   /:id/complete
///         └── POST   /:id/release
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/verify-email", post(routes::auth::verify_email))
        .route("/password-reset", post(routes::auth::request_password_reset))
        .route(
            "/password-reset/confirm",
            post(routes::auth::confirm_password_reset),
        );

    let scenario_routes = Router::new()
        .route(
            "/",
            post(routes::scenarios::create_scenario).get(routes::scenarios::list_scenarios),
        )
        .route(
            "/:id",
            get(routes::scenarios::get_scenario).delete(routes::scenarios::delete_scenario),
        )
        .route("/:id/tasks", post(routes::scenarios::create_scenario_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_ungrouped_tasks).post(routes::tasks::create_ungrouped_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task).delete(routes::tasks::delete_task),
        )
        .route("/:id/complete", post(routes::tasks::complete_task))
        .route("/:id/release", post(routes::tasks::release_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/scenarios", scenario_routes)
        .nest("/tasks", task_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS policy: permissive when `*` is configured, otherwise the listed origins
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
