use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::TokenService;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::models::{AttendanceEntry, AttendanceList, Bill, Class, Grade, Subject, User, WeeklyNote};
use crate::database::SchoolStore;
use crate::error::ApiError;
use crate::handlers::protected::resource::{self, Resource};
use crate::handlers::{protected, public};
use crate::middleware::{audit_middleware, jwt_auth_middleware};

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SchoolStore>,
    pub tokens: TokenService,
    pub audit_logging: bool,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn SchoolStore>, tokens: TokenService) -> Self {
        Self {
            store,
            tokens,
            audit_logging: false,
            max_body_bytes: 1024 * 1024,
        }
    }

    pub fn from_config(store: Arc<dyn SchoolStore>, config: &AppConfig) -> Self {
        Self {
            store,
            tokens: TokenService::from_config(config),
            audit_logging: config.security.enable_audit_logging,
            max_body_bytes: config.api.max_request_size_bytes,
        }
    }

    pub fn with_audit_logging(mut self, enabled: bool) -> Self {
        self.audit_logging = enabled;
        self
    }
}

/// Full HTTP surface: public routes and the `/api/v1` protected routes.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(resource_routes())
        .merge(class_roster_routes())
        .merge(schedule_routes())
        .merge(auth_routes())
        // Audit runs inside authentication so the identity is already known.
        .route_layer(from_fn_with_state(state.clone(), audit_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .merge(auth_public_routes());

    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(body_limit)
        .with_state(state)
}

/// CORS for browser clients. An empty origin list allows any origin.
pub fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

fn resource_route<R: Resource>(router: Router<AppState>, path: &str) -> Router<AppState> {
    router
        .route(path, get(resource::list::<R>).post(resource::create::<R>))
        .route(
            &format!("{}/:id", path),
            get(resource::show::<R>)
                .put(resource::update::<R>)
                .delete(resource::remove::<R>),
        )
}

fn resource_routes() -> Router<AppState> {
    let router = Router::new();
    let router = resource_route::<User>(router, "/users");
    let router = resource_route::<Class>(router, "/classes");
    let router = resource_route::<Subject>(router, "/subjects");
    let router = resource_route::<Grade>(router, "/grades");
    let router = resource_route::<Bill>(router, "/bills");
    let router = resource_route::<AttendanceEntry>(router, "/attendance-entries");
    let router = resource_route::<AttendanceList>(router, "/attendance-lists");
    resource_route::<WeeklyNote>(router, "/weekly-notes")
}

fn class_roster_routes() -> Router<AppState> {
    use axum::routing::delete;
    use protected::enrollment;

    Router::new()
        .route("/classes/:id/students", post(enrollment::enroll))
        .route("/classes/:id/students/:student_id", delete(enrollment::unenroll))
}

fn schedule_routes() -> Router<AppState> {
    Router::new().route("/schedule", get(protected::schedule::schedule))
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth", get(protected::auth::current_user))
}

fn auth_public_routes() -> Router<AppState> {
    Router::new().route("/auth", post(public::auth::login))
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "School API",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.store.backend_name(),
        "endpoints": {
            "auth": "POST /api/v1/auth (public - token acquisition), GET /api/v1/auth",
            "resources": "/api/v1/{users,classes,subjects,grades,bills,attendance-entries,attendance-lists,weekly-notes}[/:id]",
            "roster": "/api/v1/classes/:id/students[/:student_id]",
            "schedule": "GET /api/v1/schedule",
            "health": "GET /health (public)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => Ok(Json(json!({
            "status": "ok",
            "timestamp": now,
            "database": state.store.backend_name(),
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("database unavailable"))
        }
    }
}
