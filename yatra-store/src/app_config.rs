use serde::Deserialize;
use std::env;
use std::time::Duration;
use yatra_core::pricing::PriceList;
use yatra_core::ticket::DEFAULT_QR_SERVICE_URL;
use yatra_shared::pii::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub urls: UrlConfig,
    #[serde(default)]
    pub pricing: PriceList,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl GatewayEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            GatewayEnvironment::Sandbox => "https://sandbox.cashfree.com/pg",
            GatewayEnvironment::Production => "https://api.cashfree.com/pg",
        }
    }
}

/// Gateway credentials and call policy. Built once at startup and shared
/// read-only by every request.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub client_id: String,
    pub client_secret: Masked<String>,
    #[serde(default)]
    pub environment: GatewayEnvironment,
    /// Overrides the environment's base URL (proxies, local mocks).
    pub base_url: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_verify_retries")]
    pub verify_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_webhook_tolerance_seconds")]
    pub webhook_tolerance_seconds: i64,
}

fn default_api_version() -> String {
    "2023-08-01".to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_verify_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_webhook_tolerance_seconds() -> i64 {
    300
}

impl GatewayConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UrlConfig {
    /// Confirmation page the gateway redirects to after checkout.
    pub return_url: String,
    /// Where the gateway posts payment webhooks.
    pub notify_url: String,
    #[serde(default = "default_qr_service_url")]
    pub qr_service_url: String,
}

fn default_qr_service_url() -> String {
    DEFAULT_QR_SERVICE_URL.to_string()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in; holds local credentials.
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `YATRA__GATEWAY__CLIENT_SECRET=...`
            .add_source(config::Environment::with_prefix("YATRA").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.gateway.client_id.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "gateway.client_id must be set".to_string(),
            ));
        }
        if self.gateway.client_secret.expose().trim().is_empty() {
            return Err(config::ConfigError::Message(
                "gateway.client_secret must be set".to_string(),
            ));
        }
        if !(1..=60).contains(&self.gateway.timeout_seconds) {
            return Err(config::ConfigError::Message(format!(
                "gateway.timeout_seconds must be between 1 and 60, got {}",
                self.gateway.timeout_seconds
            )));
        }

        if self.gateway.verify_retries > 5 {
            return Err(config::ConfigError::Message(format!(
                "gateway.verify_retries must be at most 5, got {}",
                self.gateway.verify_retries
            )));
        }
        if self.gateway.retry_delay_ms > 10_000 {
            return Err(config::ConfigError::Message(format!(
                "gateway.retry_delay_ms must be at most 10000, got {}",
                self.gateway.retry_delay_ms
            )));
        }
        if !(1..=3600).contains(&self.gateway.webhook_tolerance_seconds) {
            return Err(config::ConfigError::Message(format!(
                "gateway.webhook_tolerance_seconds must be between 1 and 3600, got {}",
                self.gateway.webhook_tolerance_seconds
            )));
        }

        for (key, value) in [
            ("urls.return_url", &self.urls.return_url),
            ("urls.notify_url", &self.urls.notify_url),
            ("urls.qr_service_url", &self.urls.qr_service_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                config::ConfigError::Message(format!("{} is not a valid URL: {}", key, e))
            })?;
        }
        if let Some(base) = &self.gateway.base_url {
            url::Url::parse(base).map_err(|e| {
                config::ConfigError::Message(format!("gateway.base_url is not a valid URL: {}", e))
            })?;
        }

        Ok(())
    }
}
