use anyhow::{Context, Result};
use axum::serve;
use osn_order_webhook::{WebhookConfig, build_pipeline, build_router};
use osn_telemetry::{install as init_telemetry, shutdown_telemetry};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_telemetry("order-webhook", env!("CARGO_PKG_VERSION"))?;

    let config = WebhookConfig::from_env().context("loading order webhook config")?;
    info!(
        shop = %config.shop,
        channel = %config.channel_id,
        history_limit = config.history_limit,
        reaction = config.reaction_enabled,
        "order webhook configured"
    );

    let router = build_router(build_pipeline(&config)?);
    let listener = TcpListener::bind(config.addr).await?;
    info!("order-webhook listening on {}", config.addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    shutdown_telemetry();
    Ok(())
}
