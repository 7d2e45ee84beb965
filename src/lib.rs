use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod repository;
pub mod storage;
pub mod text;

// Routing, split by application (public site vs. gated admin console).
pub mod routes;
use routes::{admin, site};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point.
pub use auth::{GoTrueClient, IdentityState};
pub use config::AppConfig;
pub use mailer::{HttpMailer, MailerState, MockMailer};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MediaState, MockMediaStore, S3MediaStore};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the public site surface.
/// Served at `/api-docs/openapi.json` with the Swagger UI on the site app.
/// The admin console is an internal surface and is deliberately not part of
/// the published docs.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_landing, handlers::get_products, handlers::get_product_by_slug,
        handlers::get_posts, handlers::get_post_by_slug, handlers::checkout,
        handlers::contact
    ),
    components(
        schemas(
            models::Product, models::PostResponse, models::LandingResponse,
            models::CheckoutRequest, models::CheckoutItem, models::OrderDetail,
            models::Order, models::OrderItem, models::ContactRequest,
        )
    ),
    tags(
        (name = "commerce-portal", description = "Storefront & Marketing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared by both HTTP applications and across
/// all requests.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer over the two database channels.
    pub repo: RepositoryState,
    /// Session resolution against the external auth provider.
    pub identity: IdentityState,
    /// Transactional email.
    pub mailer: MailerState,
    /// Product-imagery storage (presigned uploads).
    pub media: MediaState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Allow handlers and middleware to pull individual services out of the
// shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for MailerState {
    fn from_ref(app_state: &AppState) -> MailerState {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for MediaState {
    fn from_ref(app_state: &AppState) -> MediaState {
        app_state.media.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_site_router
///
/// Assembles the public site application: API docs, the storefront and
/// marketing routes, shared state, and the observability stack.
pub fn create_site_router(state: AppState) -> Router {
    let router = Router::new()
        // Documentation: auto-generated Swagger UI for the public surface.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(site::site_routes())
        .with_state(state);

    with_observability(router)
}

/// create_admin_router
///
/// Assembles the admin console application. The admission middleware wraps
/// the entire router (including the fallback), so every request to this
/// application is inspected; its internal allow-list exempts only the
/// sign-in page, the access-denied page, and static assets.
pub fn create_admin_router(state: AppState) -> Router {
    let router = admin::admin_routes()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::admin_gate,
        ))
        .with_state(state);

    with_observability(router)
}

/// with_observability
///
/// Applies the shared outer layers to an application router: request-id
/// generation and propagation, request tracing with correlated spans, and
/// permissive CORS for the browser frontends.
fn with_observability(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    router
        .layer(
            ServiceBuilder::new()
                // Request ID generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Request tracing: wraps the request/response lifecycle in a
                // span carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Return the generated x-request-id header to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes span creation for `TraceLayer`: includes the `x-request-id`
/// header (when present) alongside the method and URI, so every log line for
/// one request correlates on a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
