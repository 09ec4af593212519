/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use leadbook_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::require_caller, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use leadbook_shared::notify::{Notifier, OutboxNotifier};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    /// Where lead and agent notifications go
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// State with the outbox notifier
    pub fn new(db: PgPool, config: Config) -> Self {
        let notifier = Arc::new(OutboxNotifier::new(db.clone()));
        Self::with_notifier(db, config, notifier)
    }

    pub fn with_notifier(db: PgPool, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            notifier,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                          public
/// /v1/auth/{signup,login,refresh}  public
/// /v1/leads[/:id[/assign|/category]]
/// /v1/agents[/:id]
/// /v1/categories[/:id]
/// /v1/account/password             bearer token
/// ```
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let lead_routes = Router::new()
        .route("/", get(routes::leads::list_leads).post(routes::leads::create_lead))
        .route(
            "/:id",
            get(routes::leads::get_lead)
                .put(routes::leads::update_lead)
                .delete(routes::leads::delete_lead),
        )
        .route("/:id/assign", post(routes::leads::assign_agent))
        .route("/:id/category", put(routes::leads::update_lead_category));

    let agent_routes = Router::new()
        .route("/", get(routes::agents::list_agents).post(routes::agents::create_agent))
        .route(
            "/:id",
            get(routes::agents::get_agent)
                .put(routes::agents::update_agent)
                .delete(routes::agents::delete_agent),
        );

    let category_routes = Router::new()
        .route(
            "/",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/:id",
            get(routes::categories::get_category)
                .put(routes::categories::rename_category)
                .delete(routes::categories::delete_category),
        );

    let protected = Router::new()
        .nest("/leads", lead_routes)
        .nest("/agents", agent_routes)
        .nest("/categories", category_routes)
        .route("/account/password", put(routes::auth::change_password))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_caller));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(protected);

    Router::new()
        .route("/health", get(routes::health::health_check))
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

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
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
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
