use crate::{
    AppState,
    gate::require_admin,
    mailer::EmailMessage,
    models::{
        self, AdminDashboardStats, CheckoutRequest, ContactRequest, CreatePostRequest,
        CreateProductRequest, LandingResponse, Order, OrderDetail, Post, PostResponse,
        PresignedUploadRequest, PresignedUploadResponse, Product, UpdateOrderStatusRequest,
        UpdatePostRequest, UpdateProductRequest,
    },
    text,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

// Order states the admin console may move an order into.
const ORDER_STATUSES: &[&str] = &["pending", "paid", "shipped", "cancelled"];

// How many catalog/blog entries the landing page surfaces.
const LANDING_FEATURED: i64 = 4;
const LANDING_POSTS: i64 = 3;

// --- Filter Structs ---

/// CatalogFilter
///
/// Accepted query parameters for the storefront catalog listing
/// (GET /products).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct CatalogFilter {
    /// Optional case-insensitive search over product title and description.
    pub search: Option<String>,
}

// --- Storefront & Marketing Handlers ---

/// get_landing
///
/// [Site] The marketing landing payload: the content locale negotiated from
/// the Accept-Language header (echoed as Content-Language) plus the featured
/// catalog and latest blog slices.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing content", body = LandingResponse))
)]
pub async fn get_landing(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let locale = text::preferred_locale(accept_language);

    let featured_products = state.repo.get_featured_products(LANDING_FEATURED).await;
    let latest_posts = state
        .repo
        .get_latest_posts(LANDING_POSTS)
        .await
        .into_iter()
        .map(PostResponse::from)
        .collect();

    (
        [(header::CONTENT_LANGUAGE, locale)],
        Json(LandingResponse {
            locale: locale.to_string(),
            featured_products,
            latest_posts,
        }),
    )
}

/// get_products
///
/// [Site] Lists the published catalog with optional search.
///
/// *Security*: the repository applies the `published = true` filter
/// unconditionally, so drafts never leak to anonymous clients.
#[utoipa::path(
    get,
    path = "/products",
    params(CatalogFilter),
    responses((status = 200, description = "Published catalog", body = [Product]))
)]
pub async fn get_products(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Json<Vec<models::Product>> {
    let products = state.repo.get_published_products(filter.search).await;
    Json(products)
}

/// get_product_by_slug
///
/// [Site] A single published catalog entry by its slug.
#[utoipa::path(
    get,
    path = "/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses((status = 200, description = "Found", body = Product))
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<models::Product>, StatusCode> {
    match state.repo.get_published_product_by_slug(&slug).await {
        Some(product) => Ok(Json(product)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_posts
///
/// [Site] Lists published blog entries with their read-time estimates.
#[utoipa::path(
    get,
    path = "/posts",
    responses((status = 200, description = "Published posts", body = [PostResponse]))
)]
pub async fn get_posts(State(state): State<AppState>) -> Json<Vec<PostResponse>> {
    let posts = state
        .repo
        .get_published_posts()
        .await
        .into_iter()
        .map(PostResponse::from)
        .collect();
    Json(posts)
}

/// get_post_by_slug
///
/// [Site] A single published blog entry by its slug.
#[utoipa::path(
    get,
    path = "/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses((status = 200, description = "Found", body = PostResponse))
)]
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, StatusCode> {
    match state.repo.get_published_post_by_slug(&slug).await {
        Some(post) => Ok(Json(PostResponse::from(post))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// checkout
///
/// [Site] Creates an order from the submitted cart. Prices are resolved
/// server-side against the published catalog inside one transaction; a stale
/// cart (unknown or unpublished product) rejects the whole submission.
///
/// The confirmation email is attempted only after the order is committed,
/// and a provider failure is logged and swallowed: the customer's order
/// stands regardless.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order created", body = OrderDetail),
        (status = 422, description = "Rejected cart")
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<OrderDetail>, StatusCode> {
    if !payload.customer_email.contains('@') {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let detail = state
        .repo
        .create_order(payload)
        .await
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    let message = EmailMessage {
        to: detail.order.customer_email.clone(),
        subject: format!("Order confirmation #{}", detail.order.id.simple()),
        body: format!(
            "Thanks for your order. We received {} item(s) for a total of {:.2} {}.",
            detail.items.len(),
            detail.order.total_cents as f64 / 100.0,
            detail.order.currency.to_uppercase()
        ),
    };
    if let Err(e) = state.mailer.send(message).await {
        tracing::warn!(order_id = %detail.order.id, "order confirmation email failed: {}", e);
    }

    Ok(Json(detail))
}

/// contact
///
/// [Site] Forwards a contact-form submission to the support inbox. Always
/// answers 202: a mail-provider failure is logged, never surfaced.
#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses((status = 202, description = "Accepted"))
)]
pub async fn contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> StatusCode {
    let message = EmailMessage {
        to: state.config.support_email.clone(),
        subject: format!("Contact form: {}", payload.name),
        body: format!("From: {} <{}>\n\n{}", payload.name, payload.email, payload.message),
    };
    if let Err(e) = state.mailer.send(message).await {
        tracing::warn!("contact form email failed: {}", e);
    }
    StatusCode::ACCEPTED
}

// --- Admin Console Pages (public allow-list) ---

/// admin_login_page
///
/// [Admin, public] The sign-in page. The `redirect` query parameter set by
/// the edge middleware is consumed by the page script after a successful
/// sign-in; the server only serves the shell.
pub async fn admin_login_page() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Console sign-in</title>\
         <link rel=\"stylesheet\" href=\"/assets/console.css\">\
         </head><body><div id=\"login-root\"></div>\
         <script src=\"/assets/login.js\"></script></body></html>",
    )
}

/// admin_access_denied_page
///
/// [Admin, public] Shown to signed-in users without an admin role.
pub async fn admin_access_denied_page() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Access denied</title></head>\
         <body><h1>Access denied</h1>\
         <p>Your account is not provisioned for the console. \
         Contact an administrator if you believe this is a mistake.</p>\
         </body></html>",
    )
}

// --- Admin Console Handlers ---

/// get_admin_stats
///
/// [Admin] Dashboard counters.
pub async fn get_admin_stats(State(state): State<AppState>) -> Json<AdminDashboardStats> {
    Json(state.repo.get_stats().await)
}

/// get_admin_products
///
/// [Admin] Every catalog entry regardless of published status.
pub async fn get_admin_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.repo.get_all_products().await)
}

/// get_admin_product
pub async fn get_admin_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, StatusCode> {
    match state.repo.get_product(id).await {
        Some(product) => Ok(Json(product)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// create_product
///
/// [Admin] Adds a catalog entry (created unpublished). The slug is derived
/// from the title here; an unusable title (no slug material) is rejected
/// before touching the database.
///
/// *Authorization*: re-verified in place; the write never starts for a
/// request that fails the check.
pub async fn create_product(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<Product>, StatusCode> {
    let admin = require_admin(&state, &jar).await?;

    let slug = text::slugify(&payload.title);
    if slug.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    match state.repo.create_product(slug, payload).await {
        Some(product) => {
            tracing::info!(admin = %admin.email, product_id = %product.id, "product created");
            Ok(Json(product))
        }
        // Insert failures here are slug collisions in practice.
        None => Err(StatusCode::CONFLICT),
    }
}

/// update_product
///
/// [Admin] Partial update of a catalog entry.
pub async fn update_product(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, StatusCode> {
    require_admin(&state, &jar).await?;

    match state.repo.update_product(id, payload).await {
        Some(product) => Ok(Json(product)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// set_product_published
///
/// [Admin] Publishes or hides a catalog entry on the storefront.
pub async fn set_product_published(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(published): Json<bool>,
) -> Result<Json<Product>, StatusCode> {
    require_admin(&state, &jar).await?;

    match state.repo.set_product_published(id, published).await {
        Some(product) => Ok(Json(product)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_product
pub async fn delete_product(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let admin = require_admin(&state, &jar).await?;

    if state.repo.delete_product(id).await {
        tracing::info!(admin = %admin.email, product_id = %id, "product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// get_admin_orders
pub async fn get_admin_orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    Json(state.repo.get_orders().await)
}

/// get_admin_order
///
/// [Admin] Order header plus line items.
pub async fn get_admin_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, StatusCode> {
    match state.repo.get_order(id).await {
        Some(detail) => Ok(Json(detail)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// update_order_status
///
/// [Admin] Moves an order to a new status. Unknown status values are
/// rejected before the write.
pub async fn update_order_status(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, StatusCode> {
    require_admin(&state, &jar).await?;

    if !ORDER_STATUSES.contains(&payload.status.as_str()) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    match state.repo.set_order_status(id, payload.status).await {
        Some(order) => Ok(Json(order)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_admin_posts
pub async fn get_admin_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    Json(state.repo.get_all_posts().await)
}

/// create_post
///
/// [Admin] Adds a blog entry (created as a draft), slug derived from the
/// title.
pub async fn create_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<Post>, StatusCode> {
    require_admin(&state, &jar).await?;

    let slug = text::slugify(&payload.title);
    if slug.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    match state.repo.create_post(slug, payload).await {
        Some(post) => Ok(Json(post)),
        None => Err(StatusCode::CONFLICT),
    }
}

/// update_post
pub async fn update_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, StatusCode> {
    require_admin(&state, &jar).await?;

    match state.repo.update_post(id, payload).await {
        Some(post) => Ok(Json(post)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_post
pub async fn delete_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    require_admin(&state, &jar).await?;

    if state.repo.delete_post(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// presign_product_image
///
/// [Admin] Generates a short-lived direct-to-storage upload URL for product
/// imagery. The object key is generated server-side under the `products/`
/// prefix; the client stores the returned key on the product record.
pub async fn presign_product_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<PresignedUploadRequest>,
) -> Result<Json<PresignedUploadResponse>, StatusCode> {
    require_admin(&state, &jar).await?;

    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let image_key = format!("products/{}.{}", Uuid::new_v4(), extension);

    match state
        .media
        .presign_upload(&image_key, &payload.content_type)
        .await
    {
        Ok(upload_url) => Ok(Json(PresignedUploadResponse {
            upload_url,
            image_key,
        })),
        Err(e) => {
            // Log the storage error for debugging; the client gets a generic
            // failure.
            tracing::error!("presign failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
