use commerce_portal::{
    AppState,
    auth::{GoTrueClient, IdentityState},
    config::{AppConfig, Env},
    create_admin_router, create_site_router,
    mailer::{HttpMailer, MailerState},
    repository::{PostgresRepository, RepositoryState},
    storage::{MediaState, S3MediaStore},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point, responsible for initializing configuration,
/// logging, the two database channels, the external-service clients, and the
/// two HTTP applications (public site and admin console).
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter: RUST_LOG wins, with sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "commerce_portal=debug,tower_http=info,axum=trace".into());

    // 3. Logging format switched by environment: pretty output for humans
    // locally, JSON for the log aggregator in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database channels. The application pool carries all regular
    // queries; the smaller service pool exists solely for the elevated
    // admin-role lookups.
    let app_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    let service_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.service_db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check SERVICE_DATABASE_URL.");

    let repo = Arc::new(PostgresRepository::new(app_pool, service_pool)) as RepositoryState;

    // 5. External-service clients: auth provider, mailer, media storage.
    let identity = Arc::new(GoTrueClient::new(&config)) as IdentityState;
    let mailer = Arc::new(HttpMailer::new(&config)) as MailerState;

    let media_store = S3MediaStore::new(&config).await;
    // LOCAL-ONLY: provision the MinIO bucket for the Dockerized setup.
    if config.env == Env::Local {
        use commerce_portal::storage::MediaStore;
        media_store.ensure_bucket().await;
    }
    let media = Arc::new(media_store) as MediaState;

    // 6. Unified state assembly.
    let state = AppState {
        repo,
        identity,
        mailer,
        media,
        config: config.clone(),
    };

    // 7. The two applications and their listeners.
    let site_app = create_site_router(state.clone());
    let admin_app = create_admin_router(state);

    let site_listener = TcpListener::bind(&config.site_addr)
        .await
        .expect("FATAL: could not bind site listener");
    let admin_listener = TcpListener::bind(&config.admin_addr)
        .await
        .expect("FATAL: could not bind admin listener");

    tracing::info!("Site listening on {}", config.site_addr);
    tracing::info!("Admin console listening on {}", config.admin_addr);
    tracing::info!("API docs (Swagger UI) at http://{}/swagger-ui", config.site_addr);

    // Both servers run until one fails.
    let site_server = async { axum::serve(site_listener, site_app).await };
    let admin_server = async { axum::serve(admin_listener, admin_app).await };
    tokio::try_join!(site_server, admin_server).expect("FATAL: server error");
}
