use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// AdminRole
///
/// Authorization record from the `admin_roles` table, keyed by the identity
/// of the external auth provider. A row existing for a user is what grants
/// access to the admin console; the `role` classification (`admin` or
/// `super_admin`) is carried through for display and auditing but no code
/// path branches on it. Rows are provisioned out of band and never written
/// by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AdminRole {
    // FK to the auth provider's user id.
    pub user_id: Uuid,
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Product
///
/// A catalog entry from the `products` table. The storefront only ever sees
/// rows with `published = true`; the admin console sees everything.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    /// URL-safe identifier derived from the title at creation time.
    pub slug: String,
    pub title: String,
    pub description: String,
    // Prices are stored in minor units to avoid float arithmetic.
    pub price_cents: i64,
    pub currency: String,
    // Object key of the product image in the media bucket.
    pub image_key: Option<String>,
    // Controls storefront visibility (enforced at the repository layer).
    pub published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Order
///
/// An order header from the `orders` table. Line items live in `order_items`.
/// `status` walks through the text states `pending`, `paid`, `shipped`,
/// `cancelled` under admin control.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Order {
    pub id: Uuid,
    pub customer_email: String,
    pub status: String,
    pub total_cents: i64,
    pub currency: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// OrderItem
///
/// A line row from `order_items`. Title and unit price are denormalized at
/// checkout time so later catalog edits never rewrite past orders.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct OrderItem {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
}

/// OrderDetail
///
/// An order header joined with its line items (admin order view).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Post
///
/// A marketing blog entry from the `posts` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// PostResponse
///
/// A blog entry as served to the frontends, augmented with the estimated
/// reading time computed from the body's word count.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub published: bool,
    pub reading_time_minutes: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let reading_time_minutes = crate::text::reading_time_minutes(&post.body);
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            body: post.body,
            published: post.published,
            reading_time_minutes,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateProductRequest
///
/// Input payload for adding a catalog entry (POST /products on the admin
/// console). The slug is derived from the title server-side; the image key
/// is the object key returned by the presigned upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,
    pub image_key: Option<String>,
}

/// UpdateProductRequest
///
/// Partial update payload for a catalog entry. Every field is optional; only
/// provided fields are written (COALESCE semantics in the repository).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
}

/// CheckoutItem
///
/// One cart line in a checkout submission.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// CheckoutRequest
///
/// Input payload for the storefront checkout (POST /checkout). Prices are
/// never taken from the client; the repository resolves them from the
/// published catalog when the order is created.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CheckoutRequest {
    pub customer_email: String,
    pub items: Vec<CheckoutItem>,
}

/// UpdateOrderStatusRequest
///
/// Admin payload moving an order to a new status.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// CreatePostRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
}

/// UpdatePostRequest
///
/// Partial update payload for a blog entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// ContactRequest
///
/// Input payload for the marketing site contact form. Forwarded to the
/// support inbox via the mailer; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// PresignedUploadRequest
///
/// Admin payload requesting a short-lived direct-to-storage upload URL for
/// product imagery.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "sneaker-white.jpg")]
    pub filename: String,
    /// The MIME type the upload will be constrained to.
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

/// PresignedUploadResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUploadResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to store on the product record.
    pub image_key: String,
}

// --- Dashboard & Landing Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for the admin console dashboard (GET /stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_products: i64,
    pub published_products: i64,
    pub total_orders: i64,
    /// Orders still in the `pending` state.
    pub pending_orders: i64,
    pub total_posts: i64,
}

/// LandingResponse
///
/// Output schema for the marketing landing endpoint: the negotiated content
/// locale plus the featured slices of catalog and blog.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LandingResponse {
    /// Locale selected from the request's Accept-Language header.
    pub locale: String,
    pub featured_products: Vec<Product>,
    pub latest_posts: Vec<PostResponse>,
}
