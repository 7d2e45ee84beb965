#![allow(dead_code)]

//! Shared test doubles: a scriptable repository and identity provider with
//! call counters, plus helpers for assembling application state around them.

use async_trait::async_trait;
use chrono::Utc;
use commerce_portal::{
    AppState,
    auth::{IdentityProvider, ProviderError, ResolvedIdentity, SessionCredentials},
    config::AppConfig,
    mailer::MockMailer,
    models::{
        AdminDashboardStats, AdminRole, CheckoutRequest, CreatePostRequest, CreateProductRequest,
        Order, OrderDetail, OrderItem, Post, Product, UpdatePostRequest, UpdateProductRequest,
    },
    repository::{Repository, RoleChannel},
    storage::MockMediaStore,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use uuid::Uuid;

// --- Mock Repository ---

/// Scriptable `Repository` double. Pre-canned outputs are set on the fields;
/// the role-lookup path additionally records how often it ran and on which
/// channel, which the admission-check tests assert on.
#[derive(Default)]
pub struct MockRepo {
    pub products: Vec<Product>,
    pub product: Option<Product>,
    pub orders: Vec<Order>,
    pub order_detail: Option<OrderDetail>,
    pub posts: Vec<Post>,
    pub post: Option<Post>,
    pub stats: AdminDashboardStats,

    /// The admin-role row returned for a matching user id.
    pub admin_role: Option<AdminRole>,
    /// When true, the role lookup errors instead of answering.
    pub role_lookup_fails: bool,
    pub role_lookups: AtomicUsize,
    pub last_role_channel: Mutex<Option<RoleChannel>>,

    /// When true, checkout rejects (stale cart simulation).
    pub checkout_fails: bool,
    /// The last checkout submission, for input verification.
    pub last_checkout: Mutex<Option<CheckoutRequest>>,
}

impl MockRepo {
    pub fn with_admin_role(user_id: Uuid, role: &str) -> Self {
        Self {
            admin_role: Some(AdminRole {
                user_id,
                role: role.to_string(),
                created_at: Utc::now(),
            }),
            ..Self::default()
        }
    }

    pub fn role_lookup_count(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_published_products(&self, _search: Option<String>) -> Vec<Product> {
        self.products.clone()
    }
    async fn get_published_product_by_slug(&self, _slug: &str) -> Option<Product> {
        self.product.clone()
    }
    async fn get_featured_products(&self, _limit: i64) -> Vec<Product> {
        self.products.clone()
    }
    async fn get_all_products(&self) -> Vec<Product> {
        self.products.clone()
    }
    async fn get_product(&self, _id: Uuid) -> Option<Product> {
        self.product.clone()
    }
    async fn create_product(&self, slug: String, req: CreateProductRequest) -> Option<Product> {
        Some(Product {
            id: Uuid::new_v4(),
            slug,
            title: req.title,
            description: req.description,
            price_cents: req.price_cents,
            currency: req.currency,
            image_key: req.image_key,
            published: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }
    async fn update_product(&self, _id: Uuid, _req: UpdateProductRequest) -> Option<Product> {
        self.product.clone()
    }
    async fn set_product_published(&self, _id: Uuid, published: bool) -> Option<Product> {
        self.product.clone().map(|mut p| {
            p.published = published;
            p
        })
    }
    async fn delete_product(&self, _id: Uuid) -> bool {
        self.product.is_some()
    }

    async fn create_order(&self, req: CheckoutRequest) -> Option<OrderDetail> {
        if let Ok(mut last) = self.last_checkout.lock() {
            *last = Some(req.clone());
        }
        if self.checkout_fails {
            return None;
        }
        // A deterministic order: every line costs 1000 cents.
        let order_id = Uuid::new_v4();
        let items: Vec<OrderItem> = req
            .items
            .iter()
            .map(|line| OrderItem {
                order_id,
                product_id: line.product_id,
                title: "Test Product".to_string(),
                unit_price_cents: 1000,
                quantity: line.quantity,
            })
            .collect();
        let total_cents = items
            .iter()
            .map(|i| i.unit_price_cents * i64::from(i.quantity))
            .sum();
        Some(OrderDetail {
            order: Order {
                id: order_id,
                customer_email: req.customer_email,
                status: "pending".to_string(),
                total_cents,
                currency: "eur".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            items,
        })
    }
    async fn get_orders(&self) -> Vec<Order> {
        self.orders.clone()
    }
    async fn get_order(&self, _id: Uuid) -> Option<OrderDetail> {
        self.order_detail.clone()
    }
    async fn set_order_status(&self, _id: Uuid, status: String) -> Option<Order> {
        self.orders.first().cloned().map(|mut o| {
            o.status = status;
            o
        })
    }

    async fn get_published_posts(&self) -> Vec<Post> {
        self.posts.clone()
    }
    async fn get_published_post_by_slug(&self, _slug: &str) -> Option<Post> {
        self.post.clone()
    }
    async fn get_latest_posts(&self, _limit: i64) -> Vec<Post> {
        self.posts.clone()
    }
    async fn get_all_posts(&self) -> Vec<Post> {
        self.posts.clone()
    }
    async fn create_post(&self, slug: String, req: CreatePostRequest) -> Option<Post> {
        Some(Post {
            id: Uuid::new_v4(),
            slug,
            title: req.title,
            excerpt: req.excerpt,
            body: req.body,
            published: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }
    async fn update_post(&self, _id: Uuid, _req: UpdatePostRequest) -> Option<Post> {
        self.post.clone()
    }
    async fn delete_post(&self, _id: Uuid) -> bool {
        self.post.is_some()
    }

    async fn find_admin_role(
        &self,
        user_id: Uuid,
        channel: RoleChannel,
    ) -> Result<Option<AdminRole>, sqlx::Error> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_role_channel.lock() {
            *last = Some(channel);
        }
        if self.role_lookup_fails {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.admin_role.clone().filter(|r| r.user_id == user_id))
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        self.stats.clone()
    }
}

// --- Mock Identity Provider ---

/// Scriptable `IdentityProvider` double. Resolves every credential pair to
/// the configured identity (or failure) and counts invocations, so tests can
/// verify when resolution is skipped entirely.
#[derive(Default)]
pub struct MockIdentity {
    pub identity: Option<ResolvedIdentity>,
    pub fail: bool,
    pub resolutions: AtomicUsize,
}

impl MockIdentity {
    pub fn resolving(user_id: Uuid, email: &str) -> Self {
        Self {
            identity: Some(ResolvedIdentity {
                user_id,
                email: email.to_string(),
                rotated: None,
            }),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn resolve(
        &self,
        _credentials: &SessionCredentials,
    ) -> Result<Option<ResolvedIdentity>, ProviderError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError("mock identity outage".to_string()));
        }
        Ok(self.identity.clone())
    }
}

// --- State Assembly ---

/// Assembles application state around the given doubles, with a mock mailer
/// and media store and the default test configuration.
pub fn test_state(repo: Arc<MockRepo>, identity: Arc<MockIdentity>) -> AppState {
    test_state_with_mailer(repo, identity, Arc::new(MockMailer::new()))
}

pub fn test_state_with_mailer(
    repo: Arc<MockRepo>,
    identity: Arc<MockIdentity>,
    mailer: Arc<MockMailer>,
) -> AppState {
    AppState {
        repo,
        identity,
        mailer,
        media: Arc::new(MockMediaStore::new()),
        config: AppConfig::default(),
    }
}
