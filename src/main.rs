use std::net::SocketAddr;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking_backend::{
    config::Config,
    db,
    handlers::admin::seed_admin,
    middleware::rate_limit::create_global_governor,
    routes, AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinema_booking_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    // Seed the dashboard account when credentials are configured
    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => seed_admin(&db, email, password)
            .await
            .expect("Failed to seed admin account"),
        _ => tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin seed"),
    }

    if config.s3.is_none() {
        tracing::warn!("Object storage not configured, uploads are disabled");
    }
    if config.mailchimp.is_none() {
        tracing::warn!("Mailchimp not configured, newsletter signup is disabled");
    }

    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");

    // Create app state
    let state = AppState::new(db, config);

    // Create router with middleware
    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor());

    // Start server with socket address for rate limiting
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
