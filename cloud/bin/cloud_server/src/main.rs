use anyhow::Context as _;
use fogseal_cloud_api::AppState;
use fogseal_cloud_dal::CloudConnectionPool;
use fogseal_config::{CloudApiConfig, FromEnv};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = CloudApiConfig::from_env().context("cloud API config")?;
    let pool = CloudConnectionPool::connect(&config.database_url)
        .await
        .context("failed to open the cloud store")?;
    let router = fogseal_cloud_api::router(AppState::new(pool.clone(), &config)?);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;
    tracing::info!("Cloud API listening on {}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for the shutdown signal");
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("cloud server failed")?;

    pool.close().await;
    tracing::info!("Cloud service stopped");
    Ok(())
}
