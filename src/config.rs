//! Runtime configuration for providers
//!
//! Each provider accepts an optional `ProviderConfig`. `FeedConfig` bundles
//! the provider order and per-provider settings and can be read from the
//! environment:
//!
//! - `PRICE_FEED_PROVIDERS`: comma-separated order, e.g. `chainlink,coingecko`
//! - `COINGECKO_BASE_URL`, `COINGECKO_API_KEY`
//! - `CHAINLINK_BASE_URL`, `CHAINLINK_API_KEY`

use crate::{
    constants::DEFAULT_PROVIDER_ORDER,
    error::PriceFeedError,
    provider::PriceProvider,
    providers::{ChainlinkProvider, CoinGeckoProvider},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Configuration accepted by every provider
///
/// Unrecognized fields are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Overrides the provider's default endpoint or RPC URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Upstream auth credential
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Reads `{PREFIX}_BASE_URL` and `{PREFIX}_API_KEY`
    pub fn from_env(prefix: &str) -> Self {
        Self {
            base_url: non_empty_var(&format!("{prefix}_BASE_URL")),
            api_key: non_empty_var(&format!("{prefix}_API_KEY")),
        }
    }

    /// Sets the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Built-in provider implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    CoinGecko,
    Chainlink,
}

impl FromStr for ProviderKind {
    type Err = PriceFeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coingecko" => Ok(ProviderKind::CoinGecko),
            "chainlink" => Ok(ProviderKind::Chainlink),
            other => Err(PriceFeedError::config(format!("unknown provider '{other}'"))),
        }
    }
}

/// Provider order and settings for a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Providers in failover order
    pub providers: Vec<ProviderKind>,
    #[serde(default)]
    pub coingecko: ProviderConfig,
    #[serde(default)]
    pub chainlink: ProviderConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            providers: vec![ProviderKind::CoinGecko, ProviderKind::Chainlink],
            coingecko: ProviderConfig::default(),
            chainlink: ProviderConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Reads the feed configuration from environment variables
    pub fn from_env() -> Result<Self, PriceFeedError> {
        let order = std::env::var("PRICE_FEED_PROVIDERS")
            .unwrap_or_else(|_| DEFAULT_PROVIDER_ORDER.to_string());

        Ok(Self {
            providers: parse_provider_order(&order)?,
            coingecko: ProviderConfig::from_env("COINGECKO"),
            chainlink: ProviderConfig::from_env("CHAINLINK"),
        })
    }

    /// Constructs the configured providers, in order
    pub fn build_providers(&self) -> Result<Vec<Arc<dyn PriceProvider>>, PriceFeedError> {
        self.providers
            .iter()
            .map(|kind| -> Result<Arc<dyn PriceProvider>, PriceFeedError> {
                let provider: Arc<dyn PriceProvider> = match kind {
                    ProviderKind::CoinGecko => {
                        Arc::new(CoinGeckoProvider::new(self.coingecko.clone()).map_err(|e| {
                            PriceFeedError::config(format!("failed to build provider: {e}"))
                        })?)
                    }
                    ProviderKind::Chainlink => {
                        Arc::new(ChainlinkProvider::new(self.chainlink.clone()).map_err(|e| {
                            PriceFeedError::config(format!("failed to build provider: {e}"))
                        })?)
                    }
                };
                Ok(provider)
            })
            .collect()
    }
}

/// Parses a comma-separated provider list, skipping blank entries
pub fn parse_provider_order(order: &str) -> Result<Vec<ProviderKind>, PriceFeedError> {
    order
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(ProviderKind::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_ignores_unknown_fields() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{"baseUrl": "http://localhost:8545", "apiKey": "secret", "chainId": 1}"#,
        )
        .unwrap();

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_provider_config_fields_are_optional() {
        let config: ProviderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProviderConfig::default());
    }

    #[test]
    fn test_parse_provider_order() {
        let order = parse_provider_order(" Chainlink, coingecko ,").unwrap();
        assert_eq!(order, vec![ProviderKind::Chainlink, ProviderKind::CoinGecko]);

        assert!(matches!(
            parse_provider_order("coingecko,binance"),
            Err(PriceFeedError::Config(_))
        ));
    }

    #[test]
    fn test_build_providers_keeps_order() {
        let config = FeedConfig {
            providers: vec![ProviderKind::Chainlink, ProviderKind::CoinGecko],
            ..FeedConfig::default()
        };

        let providers = config.build_providers().unwrap();
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Chainlink", "CoinGecko"]);
    }
}
