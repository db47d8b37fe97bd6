pub mod fema;
pub mod nominatim;

use crate::error::{ConfigError, InitializationError};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub const ENV_VAR_PREFIX: &str = "AIDALERT__";
pub const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub alerts: AlertsConfig,
    pub geocoder: GeocoderConfig,
    pub places: PlacesConfig,
    pub notifications: NotificationsConfig,
    pub fixes: FixesConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub base_url: String,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            base_url: fema::DISASTER_DECLARATIONS_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: nominatim::NOMINATIM_ENDPOINT.to_string(),
            user_agent: concat!("aidalert/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    pub base_url: String,
    pub radius_miles: f64,
    pub results_per_category: u32,
    /// Unset means a stalled category query stalls the whole round.
    pub query_timeout_seconds: Option<u64>,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: nominatim::NOMINATIM_ENDPOINT.to_string(),
            radius_miles: 5.0,
            results_per_category: 20,
            query_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub delay_seconds: u64,
    pub webhook_url: Option<String>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            delay_seconds: 1,
            webhook_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixesConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub interval_seconds: u64,
}

impl Default for FixesConfig {
    fn default() -> Self {
        Self {
            latitude: 37.7749,
            longitude: -122.4194,
            interval_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            default_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

pub fn figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(SETTINGS_FILE))
        .merge(Env::prefixed(ENV_VAR_PREFIX).split("__"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    Ok(figment().extract::<Config>()?)
}

pub fn init_tracing(config: &LoggingConfig) -> Result<(), InitializationError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let builder = tracing_subscriber::fmt()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(env_filter);

    match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

pub async fn shutdown_listener(token: Option<CancellationToken>) {
    let ctrl_c = signal::ctrl_c();
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(name: "signal.sigterm.unavailable", error = ?e, "could not install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(name: "signal.ctrlc.received", "received Ctrl+C signal, shutting down"),
        () = terminate => info!(name: "signal.sigterm.received", "received SIGTERM signal, shutting down"),
    }

    if let Some(token) = token {
        token.cancel();
    }
}

pub mod error {
    use thiserror::Error;
    use tracing::dispatcher::SetGlobalDefaultError;

    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("failed to load configuration: {0}")]
        Figment(#[from] figment::Error),
    }

    #[derive(Debug, Error)]
    pub enum InitializationError {
        #[error(transparent)]
        Tracing(#[from] SetGlobalDefaultError),
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error("failed to build http client: {0}")]
        HttpClient(#[from] reqwest::Error),
        #[error("invalid configuration value for {key}: {reason}")]
        InvalidSetting { key: &'static str, reason: String },
    }

    #[derive(Debug, Error)]
    pub enum FetchError {
        #[error(transparent)]
        Reqwest(#[from] reqwest::Error),
        #[error(transparent)]
        Deserialize(#[from] serde_json::Error),
        #[error("unable to find or parse {0} field in JSON")]
        MissingField(&'static str),
    }
}
