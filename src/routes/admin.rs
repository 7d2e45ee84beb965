use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Console Router
///
/// Every route the console exposes. This router is wrapped as a whole by the
/// admission middleware (see `create_admin_router`), which lets only the
/// sign-in page, the access-denied page, and static assets through without a
/// session and an admin-role row.
///
/// Defense in depth: the middleware is the first check, and every mutating
/// handler below re-runs the same admission check itself, so a privileged
/// write stays guarded even against a request that reaches a handler through
/// some path the middleware never saw.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /login, GET /access-denied
        // The two reject targets of the admission middleware. Both are on
        // its allow-list and must stay reachable anonymously.
        .route("/login", get(handlers::admin_login_page))
        .route("/access-denied", get(handlers::admin_access_denied_page))
        // GET /stats
        // Dashboard counters (catalog, orders, blog).
        .route("/stats", get(handlers::get_admin_stats))
        // --- Catalog management ---
        // Listing includes drafts; creation derives the slug server-side.
        .route(
            "/products",
            get(handlers::get_admin_products).post(handlers::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::get_admin_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        // PUT /products/{id}/publish
        // The storefront visibility toggle.
        .route(
            "/products/{id}/publish",
            put(handlers::set_product_published),
        )
        // --- Order management ---
        .route("/orders", get(handlers::get_admin_orders))
        .route("/orders/{id}", get(handlers::get_admin_order))
        .route("/orders/{id}/status", put(handlers::update_order_status))
        // --- Blog management ---
        .route(
            "/posts",
            get(handlers::get_admin_posts).post(handlers::create_post),
        )
        .route(
            "/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        // POST /uploads/presign
        // Direct-to-storage product imagery uploads.
        .route("/uploads/presign", post(handlers::presign_product_image))
}
