use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use yatra_api::{app, metrics::Metrics, AppState};
use yatra_order::{OrderService, SignatureVerifier, VerificationService, WebhookProcessor};
use yatra_store::{app_config::Config, CashfreeGateway, OrderStatusStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatra_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Starting Yatra API on port {} ({:?} gateway)",
        config.server.port,
        config.gateway.environment
    );

    let gateway = Arc::new(CashfreeGateway::new(&config.gateway).context("Failed to build gateway client")?);

    let orders = OrderService::from_config(gateway.clone(), &config).context("Invalid callback URL")?;
    let verification = VerificationService::from_config(gateway, &config.gateway);
    let webhooks = WebhookProcessor::new(
        SignatureVerifier::new(
            config.gateway.client_secret.clone(),
            config.gateway.webhook_tolerance_seconds,
        ),
        Arc::new(OrderStatusStore::new()),
    );

    let app_state = AppState {
        orders: Arc::new(orders),
        verification: Arc::new(verification),
        webhooks: Arc::new(webhooks),
        metrics: Arc::new(Metrics::new()?),
        qr_service: Url::parse(&config.urls.qr_service_url).context("Invalid QR service URL")?,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
