/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Authentication
///
/// `auth_layer` validates the Bearer token and then loads the user row, so
/// every request downstream carries a fresh [`Principal`] in its extensions.
/// Deactivated or deleted accounts fail here even if their token is still
/// valid. `require_manager` and `require_admin` gate whole route groups on
/// top of that.
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskdeck_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdeck_shared::auth::jwt;
use taskdeck_shared::models::User;
use taskdeck_shared::policy::{PolicyError, Principal};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
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
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// ├── /v1/
/// │   ├── /auth/                      # Register, login, logout, verify
/// │   ├── /users/                     # Directory, hierarchy, profile
/// │   ├── /notifications/             # Unread list, read receipts
/// │   └── /tasks/                     # Tasks, trash, dashboard
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Compression
/// 4. Security headers
/// 5. Authentication (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Register, login, and logout are public; verify needs a session.
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .merge(
            Router::new()
                .route("/verify", get(routes::auth::verify))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    auth_layer,
                )),
        );

    // Directory and hierarchy routes gated per handler; the manager-only
    // listings get the require_manager layer.
    let user_manager_routes = Router::new()
        .route("/team", get(routes::users::list_team))
        .route(
            "/assignment-candidates",
            get(routes::users::list_assignment_candidates),
        )
        .layer(axum::middleware::from_fn(require_manager));

    let user_admin_routes = Router::new()
        .route("/:id/active", put(routes::users::set_active))
        .route("/:id", delete(routes::users::delete_user))
        .layer(axum::middleware::from_fn(require_admin));

    let user_routes = Router::new()
        .route("/managers", get(routes::users::list_managers))
        .route("/teams", get(routes::users::list_teams))
        .route(
            "/team-members/:manager_id",
            get(routes::users::list_team_members),
        )
        .route(
            "/manager-hierarchy/:manager_id",
            get(routes::users::manager_hierarchy),
        )
        .route("/assign-manager", put(routes::users::assign_manager))
        .route("/profile", put(routes::users::update_profile))
        .route("/change-password", put(routes::users::change_password))
        .merge(user_manager_routes)
        .merge(user_admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_unread))
        .route("/read", put(routes::notifications::mark_read))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // Task mutation routes are manager-gated as a group; per-task department
    // and assignment checks happen in the handlers.
    let task_manager_routes = Router::new()
        .route("/", post(routes::tasks::crud::create_task))
        .route("/:id", put(routes::tasks::crud::update_task))
        .route("/:id", delete(routes::tasks::crud::delete_task))
        .route("/:id/duplicate", post(routes::tasks::crud::duplicate_task))
        .route("/:id/subtask", put(routes::tasks::crud::create_subtask))
        .route("/:id/trash", put(routes::tasks::trash::trash_task))
        .route("/:id/restore", put(routes::tasks::trash::restore_task))
        .route("/trashed", delete(routes::tasks::trash::delete_all_trashed))
        .route(
            "/trashed/restore",
            put(routes::tasks::trash::restore_all_trashed),
        )
        .layer(axum::middleware::from_fn(require_manager));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::crud::list_tasks))
        .route("/dashboard", get(routes::tasks::dashboard::dashboard))
        .route("/:id", get(routes::tasks::crud::get_task))
        .route("/:id/stage", put(routes::tasks::stage::change_stage))
        .route("/:id/activity", post(routes::tasks::stage::post_activity))
        .merge(task_manager_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/notifications", notification_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_allowed_origins.is_empty() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Authentication middleware layer
///
/// Validates the Bearer token, loads the user from the database, and
/// injects a [`Principal`] into request extensions. Any failure along the
/// way collapses into one 401 message so a probing client cannot tell a
/// bad token from a deleted account.
pub async fn auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    const DENIED: &str = "Not authorized. Try login again.";

    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized(DENIED.to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())
        .map_err(|_| ApiError::Unauthorized(DENIED.to_string()))?;
    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::Unauthorized(DENIED.to_string()))?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::Unauthorized(DENIED.to_string()))?;

    req.extensions_mut().insert(Principal::from_user(&user));

    Ok(next.run(req).await)
}

/// Gate layer: admins and managers only
///
/// Must run after `auth_layer`; relies on the Principal it injected.
pub async fn require_manager(req: Request, next: Next) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::Unauthorized("Not authorized. Try login again.".to_string()))?;

    if !principal.can_manage_tasks() {
        return Err(PolicyError::ManagerOnly.into());
    }

    Ok(next.run(req).await)
}

/// Gate layer: admins only
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ApiError::Unauthorized("Not authorized. Try login again.".to_string()))?;

    if !principal.is_admin {
        return Err(ApiError::Forbidden(
            "Access denied: Administrator privileges required".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
