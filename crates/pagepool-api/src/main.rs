use pagepool_api::state::AppState;
use pagepool_api::build_router;
use pagepool_driver::MemoryDriver;
use pagepool_pool::PoolAdmin;
use pagepool_types::ServiceConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServiceConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        max_pools = config.max_pools,
        "starting pagepool-api"
    );

    let driver = Arc::new(MemoryDriver::default());
    let admin = Arc::new(PoolAdmin::new(driver, config.clone()));

    spawn_background_tasks(admin.clone(), &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(admin, config);
    let app = build_router(state);

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_background_tasks(admin: Arc<PoolAdmin>, config: &ServiceConfig) {
    spawn_reaper(admin.clone(), config.idle_pool_deletion_interval);
    spawn_scaling_manager(admin.clone(), config.pools_scaling_check_interval);
    spawn_cache_cleanup(admin, config.cache_cleanup_interval);
}

fn spawn_reaper(admin: Arc<PoolAdmin>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            admin.reap_deletion_candidates().await;
        }
    });
}

fn spawn_scaling_manager(admin: Arc<PoolAdmin>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            admin.manage_scaling().await;
        }
    });
}

fn spawn_cache_cleanup(admin: Arc<PoolAdmin>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            admin.expire_caches().await;
        }
    });
}
