#![warn(clippy::pedantic)]
mod error;
mod fix_source;
mod notifier;
mod server;

use crate::error::MainError;
use crate::fix_source::IntervalFixSource;
use crate::notifier::{LogNotifier, WebhookNotifier};
use alert_engine::{Collaborators, Engine, EngineConfig, Notifier};
use shared::error::InitializationError;
use shared::fema::FemaClient;
use shared::nominatim::NominatimClient;
use shared::{Config, init_tracing, load_config, shutdown_listener};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), MainError> {
    let config = load_config().map_err(InitializationError::Config)?;
    init_tracing(&config.logging)?;

    let engine = build_engine(&config)?;
    info!(name: "agent.initialized", radius_miles = config.places.radius_miles, "initialized alert agent");

    let shutdown_token = CancellationToken::new();
    let signal_handle = tokio::spawn(shutdown_listener(Some(shutdown_token.clone())));

    let server_handle = tokio::spawn(server::run_server(
        engine.clone(),
        config.server.bind_addr.clone(),
        shutdown_token.clone(),
    ));

    let source = IntervalFixSource::from_settings(&config.fixes);
    let engine_token = shutdown_token.clone();
    let engine_handle = tokio::spawn(async move { engine.run(&source, engine_token).await });

    tokio::select! {
        res = server_handle => {
            shutdown_token.cancel();
            res??;
        }
        res = engine_handle => {
            shutdown_token.cancel();
            res?;
        }
        res = signal_handle => {
            shutdown_token.cancel();
            res?;
        }
    }

    info!(name: "agent.stopped", "alert agent stopped");
    Ok(())
}

fn build_engine(config: &Config) -> Result<Engine, InitializationError> {
    if !(config.places.radius_miles.is_finite() && config.places.radius_miles >= 0.0) {
        return Err(InitializationError::InvalidSetting {
            key: "places.radius_miles",
            reason: format!("{} is not a usable radius", config.places.radius_miles),
        });
    }

    let http_client = reqwest::Client::builder()
        .user_agent(&config.geocoder.user_agent)
        .build()?;

    let nominatim = Arc::new(NominatimClient::new_with_client(
        http_client.clone(),
        &config.geocoder.base_url,
    ));
    let places = Arc::new(
        NominatimClient::new_with_client(http_client.clone(), &config.places.base_url)
            .with_results_per_query(config.places.results_per_category),
    );
    let alerts = Arc::new(FemaClient::new_with_client(
        http_client.clone(),
        &config.alerts.base_url,
    ));

    let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(http_client, url)),
        None => Arc::new(LogNotifier),
    };

    Ok(Engine::new(
        Collaborators {
            geocoder: nominatim,
            alerts,
            places,
            notifier,
        },
        EngineConfig::from_settings(config),
    ))
}
