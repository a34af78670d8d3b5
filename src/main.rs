use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notesync_core::{
    app::AppState,
    app_config,
    db::{create_pool, DatabaseConfig},
    handlers::{auth_routes, health, notes_routes, protected_auth_routes, sync_routes, todos_routes},
    migrations,
    services::{rate_limit::spawn_sweeper, JwtService, RateLimitConfig, RateLimitService},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notesync_core=debug,axum=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv::dotenv().ok();

    let config = app_config::config();
    info!("starting notesync server on {}", config.bind_address);

    info!("initializing database pool...");
    let db_config = DatabaseConfig::default();
    let pool = create_pool(&db_config)?;

    if migrations::should_run_migrations() {
        info!("running embedded migrations...");
        let applied = migrations::run_all_migrations(&pool).await?;
        info!(applied, "migrations up to date");
    }

    let jwt_service = Arc::new(JwtService::from_key_file(
        &config.private_key_path,
        config.access_token_expiry_secs,
        config.refresh_token_expiry_secs,
    )?);

    let rate_limiter = Arc::new(RateLimitService::new(RateLimitConfig::from_config()));
    spawn_sweeper(
        rate_limiter.clone(),
        Duration::from_secs(config.rate_limit_sweep_interval_seconds),
    );

    let app_state = AppState {
        config: Arc::new(config.clone()),
        pool,
        jwt_service,
        rate_limiter,
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION]);

    let api_routes = Router::new()
        .route("/health", axum::routing::get(health::health))
        .merge(auth_routes(app_state.clone()))
        .merge(protected_auth_routes(app_state.clone()))
        .merge(notes_routes(app_state.clone()))
        .merge(todos_routes(app_state.clone()))
        .merge(sync_routes(app_state.clone()));

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new())
                .layer(cors)
                .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes as usize))
                .layer(TimeoutLayer::new(Duration::from_secs(config.write_timeout_secs))),
        )
        .with_state(app_state);

    health::mark_start();

    let addr: SocketAddr = config.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(Duration::from_secs(config.shutdown_grace_secs)))
        .await?;

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining for {:?}", grace);
    tokio::time::sleep(grace).await;
}
