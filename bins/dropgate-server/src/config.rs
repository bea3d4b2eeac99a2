//! Server configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `0.0.0.0:8080`
    pub listen: String,
    /// Protected asset settings
    pub asset: AssetConfig,
    /// Payment provider settings
    pub payment: PaymentConfig,
    /// Capability token settings
    pub token: TokenConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Protected asset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Path of the file to serve after verification
    pub path: String,
    /// Filename offered to the downloading client
    pub download_name: String,
    /// Content-Type of the served file
    pub content_type: String,
}

/// Payment provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Provider base API URL
    pub api_url: String,
    /// Provider API key
    pub api_key: String,
    /// Asking price
    pub price_amount: f64,
    /// Price currency code
    pub price_currency: String,
    /// Page the provider redirects to after payment
    pub success_url: Option<String>,
    /// Webhook for provider payment notifications
    pub ipn_callback_url: Option<String>,
    /// Provider statuses treated as "payment settled"
    pub accepted_statuses: Vec<String>,
}

/// Capability token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Shared signing secret; must be non-empty and kept out of logs
    pub secret: String,
    /// Download window after a successful exchange (seconds)
    pub ttl_seconds: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            asset: AssetConfig {
                path: "public/release.bin".to_string(),
                download_name: "release.bin".to_string(),
                content_type: "application/octet-stream".to_string(),
            },
            payment: PaymentConfig {
                api_url: "https://api.nowpayments.io/v1".to_string(),
                api_key: String::new(),
                price_amount: 14.99,
                price_currency: "usd".to_string(),
                success_url: None,
                ipn_callback_url: None,
                accepted_statuses: vec![
                    "confirmed".to_string(),
                    "finished".to_string(),
                    "paid".to_string(),
                ],
            },
            token: TokenConfig {
                secret: String::new(),
                ttl_seconds: dropgate_token::DEFAULT_TTL_SECS,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from file
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        Ok(())
    }

    /// Validate configuration, failing fast before the server starts
    pub fn validate(&self) -> Result<()> {
        if self.token.secret.is_empty() {
            anyhow::bail!("token.secret must not be empty");
        }

        if self.token.ttl_seconds <= 0 {
            anyhow::bail!("token.ttl_seconds must be positive");
        }

        if self.payment.api_key.is_empty() {
            anyhow::bail!("payment.api_key must not be empty");
        }

        if self.payment.price_amount <= 0.0 {
            anyhow::bail!("payment.price_amount must be positive");
        }

        if self.payment.accepted_statuses.is_empty() {
            anyhow::bail!("payment.accepted_statuses must not be empty");
        }

        if self.asset.path.is_empty() {
            anyhow::bail!("asset.path must not be empty");
        }

        Ok(())
    }
}
