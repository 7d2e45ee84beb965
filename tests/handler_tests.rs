//! Handler-level behavior over mocked collaborators: slug derivation, the
//! in-place authorization re-check on mutations, checkout email semantics,
//! locale negotiation, and upload presigning.

mod common;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use commerce_portal::{
    AppState, handlers,
    mailer::MockMailer,
    models::{
        CheckoutItem, CheckoutRequest, ContactRequest, CreateProductRequest, Order, Post,
        PresignedUploadRequest, UpdateOrderStatusRequest,
    },
};
use common::{MockIdentity, MockRepo, test_state, test_state_with_mailer};
use std::sync::Arc;
use uuid::Uuid;

fn session_jar() -> CookieJar {
    CookieJar::new().add(Cookie::new("sb-access-token", "tok"))
}

/// State where the session resolves to a provisioned admin.
fn admin_state() -> AppState {
    let user_id = Uuid::new_v4();
    let repo = Arc::new(MockRepo::with_admin_role(user_id, "admin"));
    let identity = Arc::new(MockIdentity::resolving(user_id, "admin@shop.test"));
    test_state(repo, identity)
}

/// State where the session resolves but carries no admin role.
fn non_admin_state() -> AppState {
    let user_id = Uuid::new_v4();
    let repo = Arc::new(MockRepo::default());
    let identity = Arc::new(MockIdentity::resolving(user_id, "user@shop.test"));
    test_state(repo, identity)
}

fn cart() -> CheckoutRequest {
    CheckoutRequest {
        customer_email: "buyer@example.com".to_string(),
        items: vec![CheckoutItem {
            product_id: Uuid::new_v4(),
            quantity: 2,
        }],
    }
}

// --- Catalog management ---

#[tokio::test]
async fn create_product_derives_the_slug_from_the_title() {
    let payload = CreateProductRequest {
        title: "Spring Sneaker 2: The Sequel!".to_string(),
        description: "Lighter than last year.".to_string(),
        price_cents: 12900,
        currency: "eur".to_string(),
        image_key: None,
    };

    let Json(product) =
        handlers::create_product(State(admin_state()), session_jar(), Json(payload))
            .await
            .unwrap();

    assert_eq!(product.slug, "spring-sneaker-2-the-sequel");
    // New entries always start hidden from the storefront.
    assert!(!product.published);
}

#[tokio::test]
async fn create_product_rejects_an_unsluggable_title() {
    let payload = CreateProductRequest {
        title: "!!!".to_string(),
        ..CreateProductRequest::default()
    };

    let result = handlers::create_product(State(admin_state()), session_jar(), Json(payload)).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_product_requires_a_session() {
    let result = handlers::create_product(
        State(admin_state()),
        CookieJar::new(),
        Json(CreateProductRequest::default()),
    )
    .await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_product_requires_an_admin_role() {
    let result = handlers::create_product(
        State(non_admin_state()),
        session_jar(),
        Json(CreateProductRequest::default()),
    )
    .await;

    assert_eq!(result.unwrap_err(), StatusCode::FORBIDDEN);
}

// --- Order management ---

#[tokio::test]
async fn update_order_status_rejects_unknown_states() {
    let result = handlers::update_order_status(
        State(admin_state()),
        session_jar(),
        Path(Uuid::new_v4()),
        Json(UpdateOrderStatusRequest {
            status: "teleported".to_string(),
        }),
    )
    .await;

    assert_eq!(result.unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn update_order_status_moves_the_order() {
    let user_id = Uuid::new_v4();
    let mut repo = MockRepo::with_admin_role(user_id, "admin");
    repo.orders = vec![Order {
        id: Uuid::new_v4(),
        customer_email: "buyer@example.com".to_string(),
        status: "pending".to_string(),
        total_cents: 2000,
        currency: "eur".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }];
    let state = test_state(
        Arc::new(repo),
        Arc::new(MockIdentity::resolving(user_id, "admin@shop.test")),
    );

    let Json(order) = handlers::update_order_status(
        State(state),
        session_jar(),
        Path(Uuid::new_v4()),
        Json(UpdateOrderStatusRequest {
            status: "shipped".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(order.status, "shipped");
}

// --- Checkout & contact ---

#[tokio::test]
async fn checkout_sends_the_confirmation_email() {
    let mailer = Arc::new(MockMailer::new());
    let state = test_state_with_mailer(
        Arc::new(MockRepo::default()),
        Arc::new(MockIdentity::default()),
        mailer.clone(),
    );

    let Json(detail) = handlers::checkout(State(state), Json(cart())).await.unwrap();

    assert_eq!(detail.order.customer_email, "buyer@example.com");
    assert_eq!(mailer.sent_count(), 1);
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent[0].to, "buyer@example.com");
    assert!(sent[0].subject.starts_with("Order confirmation"));
}

#[tokio::test]
async fn checkout_survives_a_mail_provider_failure() {
    let state = test_state_with_mailer(
        Arc::new(MockRepo::default()),
        Arc::new(MockIdentity::default()),
        Arc::new(MockMailer::new_failing()),
    );

    // The order is committed before the send; a failed email must not
    // surface to the customer.
    let result = handlers::checkout(State(state), Json(cart())).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn checkout_rejects_an_invalid_email_before_ordering() {
    let repo = Arc::new(MockRepo::default());
    let state = test_state(repo.clone(), Arc::new(MockIdentity::default()));

    let mut payload = cart();
    payload.customer_email = "not-an-email".to_string();
    let result = handlers::checkout(State(state), Json(payload)).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(repo.last_checkout.lock().unwrap().is_none());
}

#[tokio::test]
async fn checkout_rejects_a_stale_cart() {
    let mut repo = MockRepo::default();
    repo.checkout_fails = true;
    let state = test_state(Arc::new(repo), Arc::new(MockIdentity::default()));

    let result = handlers::checkout(State(state), Json(cart())).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn contact_always_answers_accepted() {
    let payload = ContactRequest {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        message: "Where is my order?".to_string(),
    };

    let mailer = Arc::new(MockMailer::new());
    let state = test_state_with_mailer(
        Arc::new(MockRepo::default()),
        Arc::new(MockIdentity::default()),
        mailer.clone(),
    );
    let status = handlers::contact(State(state), Json(payload.clone())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    // The message goes to the configured support inbox.
    assert_eq!(mailer.sent.lock().unwrap()[0].to, "support@shop.test");

    // A provider failure changes nothing for the caller.
    let failing_state = test_state_with_mailer(
        Arc::new(MockRepo::default()),
        Arc::new(MockIdentity::default()),
        Arc::new(MockMailer::new_failing()),
    );
    let status = handlers::contact(State(failing_state), Json(payload)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

// --- Marketing ---

#[tokio::test]
async fn landing_negotiates_the_content_locale() {
    let state = test_state(
        Arc::new(MockRepo::default()),
        Arc::new(MockIdentity::default()),
    );
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_LANGUAGE, "fr-CA,en;q=0.8".parse().unwrap());

    let response = handlers::get_landing(State(state), headers)
        .await
        .into_response();

    assert_eq!(
        response.headers().get(header::CONTENT_LANGUAGE).unwrap(),
        "fr"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["locale"], "fr");
}

#[tokio::test]
async fn posts_carry_a_reading_time_estimate() {
    let mut repo = MockRepo::default();
    repo.post = Some(Post {
        id: Uuid::new_v4(),
        slug: "slow-fashion".to_string(),
        title: "Slow Fashion".to_string(),
        excerpt: None,
        body: "word ".repeat(450),
        published: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });
    let state = test_state(Arc::new(repo), Arc::new(MockIdentity::default()));

    let Json(post) = handlers::get_post_by_slug(State(state), Path("slow-fashion".to_string()))
        .await
        .unwrap();

    // 450 words at 200 wpm rounds up to 3 minutes.
    assert_eq!(post.reading_time_minutes, 3);
}

// --- Media uploads ---

#[tokio::test]
async fn presign_generates_a_key_under_the_products_prefix() {
    let payload = PresignedUploadRequest {
        filename: "hero.png".to_string(),
        content_type: "image/png".to_string(),
    };

    let Json(response) =
        handlers::presign_product_image(State(admin_state()), session_jar(), Json(payload))
            .await
            .unwrap();

    assert!(response.image_key.starts_with("products/"));
    assert!(response.image_key.ends_with(".png"));
    assert!(response.upload_url.contains(&response.image_key));
}

#[tokio::test]
async fn presign_requires_an_admin_role() {
    let result = handlers::presign_product_image(
        State(non_admin_state()),
        session_jar(),
        Json(PresignedUploadRequest::default()),
    )
    .await;

    assert_eq!(result.unwrap_err(), StatusCode::FORBIDDEN);
}
