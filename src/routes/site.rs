use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Site Router
///
/// The public storefront and marketing surface, accessible to any client.
/// Nothing here performs an identity or role lookup; visibility rules
/// (published-only catalog and blog) are enforced in the repository queries
/// the handlers call.
pub fn site_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness endpoint for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Landing payload with the negotiated content locale.
        .route("/", get(handlers::get_landing))
        // GET /products?search=...
        // Published catalog listing with optional search.
        .route("/products", get(handlers::get_products))
        // GET /products/{slug}
        .route("/products/{slug}", get(handlers::get_product_by_slug))
        // GET /posts, /posts/{slug}
        // Published blog entries, served with read-time estimates.
        .route("/posts", get(handlers::get_posts))
        .route("/posts/{slug}", get(handlers::get_post_by_slug))
        // POST /checkout
        // Creates an order and triggers the confirmation email.
        .route("/checkout", post(handlers::checkout))
        // POST /contact
        // Forwards the contact form to the support inbox.
        .route("/contact", post(handlers::contact))
}
