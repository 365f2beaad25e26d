//! Hotel service entry point.

use std::time::Duration;

use hotel::{ExpirationSweeper, HotelStore, InMemoryHotelStore, PostgresHotelStore};
use hotel_api::config::Config;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: HotelStore + Clone + Send + Sync + 'static>(store: S, config: Config) {
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let state = hotel_api::create_state(store.clone(), &config);
    let app = hotel_api::create_app(state, metrics_handle);

    let sweeper = ExpirationSweeper::new(
        store,
        Duration::from_secs(config.sweep_interval_seconds),
        chrono::Duration::days(config.lock_retention_days),
    );
    let sweeper_handle = sweeper.spawn();

    let addr = config.addr();
    tracing::info!(%addr, "starting hotel service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    sweeper_handle.abort();
    tracing::info!("hotel service shut down gracefully");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    match config.database_url.clone() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresHotelStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            serve(store, config).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            serve(InMemoryHotelStore::new(), config).await;
        }
    }
}
