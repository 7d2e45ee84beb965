use crate::models::{
    AdminDashboardStats, AdminRole, CheckoutRequest, CreatePostRequest, CreateProductRequest,
    Order, OrderDetail, OrderItem, Post, Product, UpdatePostRequest, UpdateProductRequest,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// RoleChannel
///
/// Selects which database channel an admin-role lookup runs on.
///
/// The `admin_roles` table sits behind row-level restrictions on the
/// application channel, so a session-scoped query there cannot see the very
/// row that would authorize it. The elevated channel (service role) bypasses
/// those restrictions and is what both admission checks use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChannel {
    /// The application pool, subject to row-level restrictions.
    Restricted,
    /// The service pool, bypassing row-level restrictions.
    Elevated,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, so handlers
/// and the admission checks interact with the data layer without knowing the
/// concrete implementation (Postgres in production, mocks in tests).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Catalog (storefront) ---
    // Storefront listing. Must enforce published=true.
    async fn get_published_products(&self, search: Option<String>) -> Vec<Product>;
    async fn get_published_product_by_slug(&self, slug: &str) -> Option<Product>;
    // Most recent published entries for the landing page.
    async fn get_featured_products(&self, limit: i64) -> Vec<Product>;

    // --- Catalog (admin console) ---
    // Admin access: every row regardless of published status.
    async fn get_all_products(&self) -> Vec<Product>;
    async fn get_product(&self, id: Uuid) -> Option<Product>;
    async fn create_product(&self, slug: String, req: CreateProductRequest) -> Option<Product>;
    // Partial update. Uses COALESCE so only provided fields are written.
    async fn update_product(&self, id: Uuid, req: UpdateProductRequest) -> Option<Product>;
    async fn set_product_published(&self, id: Uuid, published: bool) -> Option<Product>;
    async fn delete_product(&self, id: Uuid) -> bool;

    // --- Orders ---
    // Transactional checkout: resolves prices from the published catalog and
    // writes the header plus line rows atomically. Returns None if any cart
    // line references an unknown/unpublished product or the write fails.
    async fn create_order(&self, req: CheckoutRequest) -> Option<OrderDetail>;
    async fn get_orders(&self) -> Vec<Order>;
    async fn get_order(&self, id: Uuid) -> Option<OrderDetail>;
    async fn set_order_status(&self, id: Uuid, status: String) -> Option<Order>;

    // --- Blog ---
    async fn get_published_posts(&self) -> Vec<Post>;
    async fn get_published_post_by_slug(&self, slug: &str) -> Option<Post>;
    async fn get_latest_posts(&self, limit: i64) -> Vec<Post>;
    async fn get_all_posts(&self) -> Vec<Post>;
    async fn create_post(&self, slug: String, req: CreatePostRequest) -> Option<Post>;
    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> Option<Post>;
    async fn delete_post(&self, id: Uuid) -> bool;

    // --- Authorization ---
    /// Looks up the admin-role row for an identity on the given channel.
    ///
    /// Unlike the list queries above, lookup errors are surfaced to the
    /// caller: the admission checks must be able to distinguish "no row"
    /// from "lookup failed" so a failure can be classified as a reject
    /// (fail-closed) rather than silently treated as data.
    async fn find_admin_role(
        &self,
        user_id: Uuid,
        channel: RoleChannel,
    ) -> Result<Option<AdminRole>, sqlx::Error>;

    // --- Dashboard ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by two
/// PostgreSQL pools: the application channel and the service-role channel.
pub struct PostgresRepository {
    app_pool: PgPool,
    service_pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository over the two initialized connection pools.
    pub fn new(app_pool: PgPool, service_pool: PgPool) -> Self {
        Self {
            app_pool,
            service_pool,
        }
    }

    fn role_pool(&self, channel: RoleChannel) -> &PgPool {
        match channel {
            RoleChannel::Restricted => &self.app_pool,
            RoleChannel::Elevated => &self.service_pool,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, slug, title, description, price_cents, currency, image_key, published, created_at, updated_at";

const POST_COLUMNS: &str = "id, slug, title, excerpt, body, published, created_at, updated_at";

const ORDER_COLUMNS: &str =
    "id, customer_email, status, total_cents, currency, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// get_published_products
    ///
    /// Storefront listing with optional case-insensitive search over title
    /// and description, built with QueryBuilder for safe parameterization.
    /// **Security**: strictly enforces `WHERE published = true` in the base
    /// query so hidden catalog entries never leak to anonymous clients.
    async fn get_published_products(&self, search: Option<String>) -> Vec<Product> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE published = true"
        ));

        if let Some(s) = search {
            let pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        match builder
            .build_query_as::<Product>()
            .fetch_all(&self.app_pool)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_published_products error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_published_product_by_slug
    ///
    /// Retrieves a catalog entry *only* if it is published. Used by the
    /// storefront detail endpoint.
    async fn get_published_product_by_slug(&self, slug: &str) -> Option<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1 AND published = true"
        ))
        .bind(slug)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_published_product_by_slug error: {:?}", e);
            None
        })
    }

    /// get_featured_products
    ///
    /// The most recently published entries, for the landing page.
    async fn get_featured_products(&self, limit: i64) -> Vec<Product> {
        match sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE published = true ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.app_pool)
        .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_featured_products error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_all_products
    ///
    /// Admin console listing. **Note**: does *not* include the
    /// `published = true` restriction; drafts sort first for review.
    async fn get_all_products(&self) -> Vec<Product> {
        match sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY published ASC, created_at DESC"
        ))
        .fetch_all(&self.app_pool)
        .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_all_products error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_product(&self, id: Uuid) -> Option<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_product error: {:?}", e);
            None
        })
    }

    /// create_product
    ///
    /// Inserts a new catalog entry. New products start unpublished and become
    /// visible on the storefront only after an explicit publish.
    async fn create_product(&self, slug: String, req: CreateProductRequest) -> Option<Product> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (id, slug, title, description, price_cents, currency, image_key, published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, false, NOW(), NOW()) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(new_id)
        .bind(slug)
        .bind(req.title)
        .bind(req.description)
        .bind(req.price_cents)
        .bind(req.currency)
        .bind(req.image_key)
        .fetch_one(&self.app_pool)
        .await
        .map_err(|e| {
            // Slug collisions land here as a unique-constraint violation.
            tracing::error!("create_product error: {:?}", e);
            e
        })
        .ok()
    }

    /// update_product
    ///
    /// Partial update using PostgreSQL `COALESCE`, so a column is only
    /// rewritten when the corresponding request field is `Some`.
    async fn update_product(&self, id: Uuid, req: UpdateProductRequest) -> Option<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 price_cents = COALESCE($4, price_cents), \
                 image_key = COALESCE($5, image_key), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.price_cents)
        .bind(req.image_key)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_product error: {:?}", e);
            None
        })
    }

    /// set_product_published
    ///
    /// Flips storefront visibility. This is the admin publish/hide control.
    async fn set_product_published(&self, id: Uuid, published: bool) -> Option<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET published = $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(published)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_product_published error: {:?}", e);
            None
        })
    }

    async fn delete_product(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.app_pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_product error: {:?}", e);
                false
            }
        }
    }

    /// create_order
    ///
    /// Checkout. Resolves every cart line against the *published* catalog,
    /// denormalizes title and unit price into the line rows, and writes the
    /// header plus lines in one transaction. Any unknown or unpublished
    /// product, a non-positive quantity, or a write failure rolls the whole
    /// order back.
    async fn create_order(&self, req: CheckoutRequest) -> Option<OrderDetail> {
        if req.items.is_empty() {
            return None;
        }

        let mut tx = match self.app_pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::error!("create_order begin error: {:?}", e);
                return None;
            }
        };

        let order_id = Uuid::new_v4();
        let mut items: Vec<OrderItem> = Vec::with_capacity(req.items.len());
        let mut total_cents: i64 = 0;
        let mut currency: Option<String> = None;

        for line in &req.items {
            if line.quantity <= 0 {
                return None;
            }
            let product = match sqlx::query_as::<_, Product>(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND published = true"
            ))
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await
            {
                Ok(Some(p)) => p,
                // Unknown or unpublished product: the cart is stale, reject.
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!("create_order product lookup error: {:?}", e);
                    return None;
                }
            };

            // A single order carries one currency.
            match &currency {
                None => currency = Some(product.currency.clone()),
                Some(c) if *c != product.currency => return None,
                Some(_) => {}
            }

            total_cents += product.price_cents * i64::from(line.quantity);
            items.push(OrderItem {
                order_id,
                product_id: product.id,
                title: product.title,
                unit_price_cents: product.price_cents,
                quantity: line.quantity,
            });
        }

        let currency = currency?;

        let order = match sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (id, customer_email, status, total_cents, currency, created_at, updated_at) \
             VALUES ($1, $2, 'pending', $3, $4, NOW(), NOW()) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id)
        .bind(&req.customer_email)
        .bind(total_cents)
        .bind(&currency)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(o) => o,
            Err(e) => {
                tracing::error!("create_order insert error: {:?}", e);
                return None;
            }
        };

        for item in &items {
            if let Err(e) = sqlx::query(
                "INSERT INTO order_items (order_id, product_id, title, unit_price_cents, quantity) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(&item.title)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await
            {
                tracing::error!("create_order item insert error: {:?}", e);
                return None;
            }
        }

        if let Err(e) = tx.commit().await {
            tracing::error!("create_order commit error: {:?}", e);
            return None;
        }

        Some(OrderDetail { order, items })
    }

    async fn get_orders(&self) -> Vec<Order> {
        match sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.app_pool)
        .await
        {
            Ok(o) => o,
            Err(e) => {
                tracing::error!("get_orders error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_order
    ///
    /// Order header plus its line rows (admin detail view).
    async fn get_order(&self, id: Uuid) -> Option<OrderDetail> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_order error: {:?}", e);
            None
        })?;

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT order_id, product_id, title, unit_price_cents, quantity \
             FROM order_items WHERE order_id = $1",
        )
        .bind(id)
        .fetch_all(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_order items error: {:?}", e);
            vec![]
        });

        Some(OrderDetail { order, items })
    }

    async fn set_order_status(&self, id: Uuid, status: String) -> Option<Order> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_order_status error: {:?}", e);
            None
        })
    }

    /// get_published_posts
    ///
    /// Marketing blog listing. Enforces `published = true`.
    async fn get_published_posts(&self) -> Vec<Post> {
        match sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE published = true ORDER BY created_at DESC"
        ))
        .fetch_all(&self.app_pool)
        .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_published_posts error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_published_post_by_slug(&self, slug: &str) -> Option<Post> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = $1 AND published = true"
        ))
        .bind(slug)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_published_post_by_slug error: {:?}", e);
            None
        })
    }

    async fn get_latest_posts(&self, limit: i64) -> Vec<Post> {
        match sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE published = true ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.app_pool)
        .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_latest_posts error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_all_posts(&self) -> Vec<Post> {
        match sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY published ASC, created_at DESC"
        ))
        .fetch_all(&self.app_pool)
        .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_all_posts error: {:?}", e);
                vec![]
            }
        }
    }

    /// create_post
    ///
    /// Inserts a new blog entry as a draft.
    async fn create_post(&self, slug: String, req: CreatePostRequest) -> Option<Post> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (id, slug, title, excerpt, body, published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, false, NOW(), NOW()) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(new_id)
        .bind(slug)
        .bind(req.title)
        .bind(req.excerpt)
        .bind(req.body)
        .fetch_one(&self.app_pool)
        .await
        .map_err(|e| {
            tracing::error!("create_post error: {:?}", e);
            e
        })
        .ok()
    }

    async fn update_post(&self, id: Uuid, req: UpdatePostRequest) -> Option<Post> {
        sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts \
             SET title = COALESCE($2, title), \
                 excerpt = COALESCE($3, excerpt), \
                 body = COALESCE($4, body), \
                 published = COALESCE($5, published), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.excerpt)
        .bind(req.body)
        .bind(req.published)
        .fetch_optional(&self.app_pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_post error: {:?}", e);
            None
        })
    }

    async fn delete_post(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.app_pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_post error: {:?}", e);
                false
            }
        }
    }

    /// find_admin_role
    ///
    /// The authorization lookup. Runs on the pool selected by `channel`;
    /// the admission checks always pass the elevated channel so the lookup
    /// is not subject to the restriction it is checking. Errors propagate to
    /// the caller, which classifies them as a reject.
    async fn find_admin_role(
        &self,
        user_id: Uuid,
        channel: RoleChannel,
    ) -> Result<Option<AdminRole>, sqlx::Error> {
        sqlx::query_as::<_, AdminRole>(
            "SELECT user_id, role, created_at FROM admin_roles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.role_pool(channel))
        .await
    }

    /// get_stats
    ///
    /// Compiles the counters for the admin dashboard in a single call.
    async fn get_stats(&self) -> AdminDashboardStats {
        async fn count(pool: &PgPool, sql: &str) -> i64 {
            sqlx::query_scalar::<_, i64>(sql)
                .fetch_one(pool)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("get_stats error: {:?}", e);
                    0
                })
        }

        AdminDashboardStats {
            total_products: count(&self.app_pool, "SELECT COUNT(*) FROM products").await,
            published_products: count(
                &self.app_pool,
                "SELECT COUNT(*) FROM products WHERE published = true",
            )
            .await,
            total_orders: count(&self.app_pool, "SELECT COUNT(*) FROM orders").await,
            pending_orders: count(
                &self.app_pool,
                "SELECT COUNT(*) FROM orders WHERE status = 'pending'",
            )
            .await,
            total_posts: count(&self.app_pool, "SELECT COUNT(*) FROM posts").await,
        }
    }
}
