use library_ledger::{
    adapters::memory::catalog_service::CatalogService as MemoryCatalogService,
    adapters::postgres::ledger_store::LedgerStore as PostgresLedgerStore,
    api::{handlers::AppState, router::create_router},
    application::ledger::ServiceDependencies,
    domain::AccessPolicy,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_ledger=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection URL
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/library_ledger".into());

    tracing::info!("Database URL: {}", database_url);

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Apply pending migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize adapters
    // The catalog context has no remote adapter yet; author and category
    // existence checks run against the in-memory implementation.
    let ledger_store = Arc::new(PostgresLedgerStore::new(pool.clone()));
    let catalog_service = Arc::new(MemoryCatalogService::new());

    // Create service dependencies
    let service_deps = ServiceDependencies {
        ledger_store,
        catalog_service,
        access_policy: Arc::new(AccessPolicy::standard()),
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
