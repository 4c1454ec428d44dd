use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use farmstay::config::AppConfig;
use farmstay::handlers;
use farmstay::services::crm::zoho::ZohoCrm;
use farmstay::services::documents::{LogEmailSender, StubDocumentGenerator};
use farmstay::services::payments::stripe::StripeGateway;
use farmstay::services::pms::beds::Beds25Client;
use farmstay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY not set; payment calls will fail");
    }
    if config.beds_api_key.is_empty() {
        tracing::info!("BEDS25_API_KEY not set; property manager running on fixture data");
    }

    let crm = ZohoCrm::new(
        config.zoho_client_id.clone(),
        config.zoho_client_secret.clone(),
        config.zoho_refresh_token.clone(),
        config.zoho_accounts_url.clone(),
    );
    let payments = StripeGateway::new(config.stripe_secret_key.clone());
    let pms = Beds25Client::new(config.beds_base_url.clone(), config.beds_api_key.clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        crm: Box::new(crm),
        payments: Box::new(payments),
        pms: Box::new(pms),
        documents: Box::new(StubDocumentGenerator),
        mailer: Box::new(LogEmailSender),
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
