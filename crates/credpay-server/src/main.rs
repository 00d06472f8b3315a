use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use credpay::HostedSettlementClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credpay_server::{config::CredpayConfig, cors::build_cors, routes, state::AppState};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CredpayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    config.warn_missing();

    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;

    let settlement = HostedSettlementClient::builder()
        .api_base(config.settlement_api_url.clone())
        .maybe_secret_key(config.secret_key.clone())
        .wait_until(config.wait_until)
        .build()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    tracing::info!("Starting credpay-server on port {}", port);
    tracing::info!("Settlement API: {}", config.settlement_api_url);
    tracing::info!(
        "Network: {} (chain {}, price {})",
        config.network.name,
        config.network.chain_id,
        config.premium_price
    );
    if let Some(ref pay_to) = config.pay_to {
        tracing::info!("Pay-to address: {:#x}", pay_to);
    }
    if let Some(ref payer) = config.payer_wallet {
        tracing::info!("Delegated payer: {:#x}", payer);
    }

    let state_data = web::Data::new(AppState::new(config, settlement));

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .ok_or_else(|| std::io::Error::other("invalid rate limiter config"))?;

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(Logger::default())
            .wrap(build_cors(&allowed_origins))
            .wrap(Governor::new(&governor_conf))
            .configure(routes::configure::<HostedSettlementClient>)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
