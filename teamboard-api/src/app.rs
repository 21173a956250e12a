/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use teamboard_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use teamboard_shared::auth::middleware::authenticate;
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
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
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
/// ├── GET /health                              (public)
/// └── /v1/
///     ├── /auth/                               (public, except /me)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /refresh
///     │   └── GET  /me
///     ├── /teams/                              (authenticated)
///     │   ├── GET|POST          /
///     │   ├── GET|DELETE        /:team_id
///     │   ├── POST              /:team_id/members
///     │   ├── PUT|DELETE        /:team_id/members/:user_id
///     │   ├── GET|POST          /:team_id/boards
///     │   ├── GET               /:team_id/board
///     │   └── GET               /:team_id/metrics
///     ├── /boards/                             (authenticated)
///     │   ├── GET               /:board_id
///     │   ├── GET               /:board_id/metrics
///     │   ├── POST              /:board_id/columns
///     │   └── PUT               /:board_id/columns/order
///     ├── /columns/                            (authenticated)
///     │   └── PUT|DELETE        /:column_id
///     └── /cards/                              (authenticated)
///         ├── POST              /
///         ├── GET               /mine
///         ├── GET|PUT|DELETE    /:card_id
///         └── POST              /:card_id/move
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, request tracing, then JWT
/// authentication on the protected routes.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route(
            "/me",
            get(routes::auth::me).route_layer(from_fn_with_state(state.clone(), jwt_auth_layer)),
        );

    let team_routes = Router::new()
        .route(
            "/",
            get(routes::teams::list_teams).post(routes::teams::create_team),
        )
        .route(
            "/:team_id",
            get(routes::teams::get_team).delete(routes::teams::delete_team),
        )
        .route("/:team_id/members", post(routes::teams::add_member))
        .route(
            "/:team_id/members/:user_id",
            put(routes::teams::update_member_role).delete(routes::teams::remove_member),
        )
        .route(
            "/:team_id/boards",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route("/:team_id/board", get(routes::boards::get_default_board))
        .route("/:team_id/metrics", get(routes::boards::get_default_metrics));

    let board_routes = Router::new()
        .route("/:board_id", get(routes::boards::get_board))
        .route("/:board_id/metrics", get(routes::boards::get_metrics))
        .route("/:board_id/columns", post(routes::columns::create_column))
        .route(
            "/:board_id/columns/order",
            put(routes::columns::reorder_columns),
        );

    let column_routes = Router::new().route(
        "/:column_id",
        put(routes::columns::update_column).delete(routes::columns::delete_column),
    );

    let card_routes = Router::new()
        .route("/", post(routes::cards::create_card))
        .route("/mine", get(routes::cards::my_cards))
        .route(
            "/:card_id",
            get(routes::cards::get_card)
                .put(routes::cards::update_card)
                .delete(routes::cards::delete_card),
        )
        .route("/:card_id/move", post(routes::cards::move_card));

    let protected_routes = Router::new()
        .nest("/teams", team_routes)
        .nest("/boards", board_routes)
        .nest("/columns", column_routes)
        .nest("/cards", card_routes)
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

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

/// CORS: permissive when any origin is allowed, otherwise the configured list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
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
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects an `AuthContext` into the request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
