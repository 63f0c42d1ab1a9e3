//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::application::payment_service::PaymentSettings;
use crate::domain::discount::RedemptionPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

/// Credentials and transport settings for the card payment provider.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Bearer token required on admin routes.
    pub admin_token: String,
    /// Budget for the order placement transaction.
    pub order_tx_timeout: Duration,
    pub redemption_policy: RedemptionPolicy,
    pub gateway: GatewayConfig,
    pub payment: PaymentSettings,
    /// Where the 3DS callback sends the shopper afterwards.
    pub storefront_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingRequired(key.to_string()));
        let parsed = |key: &str, default: &str| -> Result<u64, ConfigError> {
            get(key)
                .unwrap_or_else(|| default.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        };

        let port = get("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?;

        let redemption_policy = match get("DISCOUNT_REDEMPTION_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DISCOUNT_REDEMPTION_POLICY".to_string()))?,
            None => RedemptionPolicy::default(),
        };

        let order_tx_timeout = parsed("ORDER_TX_TIMEOUT_SECS", "20")?;
        if order_tx_timeout == 0 {
            return Err(ConfigError::InvalidValue("ORDER_TX_TIMEOUT_SECS".to_string()));
        }

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            admin_token: required("ADMIN_API_TOKEN")?,
            order_tx_timeout: Duration::from_secs(order_tx_timeout),
            redemption_policy,
            gateway: GatewayConfig {
                base_url: required("IYZICO_BASE_URL")?,
                api_key: required("IYZICO_API_KEY")?,
                secret_key: required("IYZICO_SECRET_KEY")?,
                timeout_secs: parsed("IYZICO_TIMEOUT_SECS", "30")?,
            },
            payment: PaymentSettings {
                currency: get("PAYMENT_CURRENCY").unwrap_or_else(|| "TRY".to_string()),
                locale: get("PAYMENT_LOCALE").unwrap_or_else(|| "tr".to_string()),
                callback_url: required("PAYMENT_CALLBACK_URL")?,
            },
            storefront_url: required("STOREFRONT_URL")?
                .trim_end_matches('/')
                .to_string(),
        })
    }
}
