use bnpl::Config;
use bnpl::db::ConnectionDescriptor;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let cfg = Config::load().inspect_err(|e| error!("refusing to start: {}", e))?;
    info!(
        database = %ConnectionDescriptor::from(&cfg),
        time_zone = %cfg.time_zone,
        server_port = %cfg.server_port,
        app_port = %cfg.app_port,
        "configuration loaded"
    );

    let pool = bnpl::db::connect(&cfg)
        .await
        .inspect_err(|e| error!("database bootstrap failed: {}", e))?;

    let app = bnpl::router::bnpl_router(pool.clone());

    let addr = format!("0.0.0.0:{}", cfg.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("database pool closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
