//! CoinGecko price provider implementation

use crate::{
    config::ProviderConfig,
    constants::{
        COINGECKO_API_KEY_HEADER, COINGECKO_API_URL, COINGECKO_PING_ENDPOINT,
        COINGECKO_SIMPLE_PRICE_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::{ProviderError, ProviderErrorKind},
    provider::PriceProvider,
    types::{PriceQuote, TradingPair},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API response for simple price queries
#[derive(Debug, Deserialize)]
struct CoinGeckoResponse {
    #[serde(flatten)]
    prices: HashMap<String, CoinGeckoPriceData>,
}

/// One coin in a simple price response: a price per quote currency plus the
/// optional `last_updated_at` stamp
#[derive(Debug, Deserialize)]
struct CoinGeckoPriceData {
    last_updated_at: Option<u64>,
    #[serde(flatten)]
    quotes: HashMap<String, serde_json::Value>,
}

/// Maps well-known tickers to CoinGecko coin ids
fn coingecko_id(base: &str) -> String {
    match base.to_uppercase().as_str() {
        "SOL" => "solana".to_string(),
        "BTC" => "bitcoin".to_string(),
        "ETH" => "ethereum".to_string(),
        "USDC" => "usd-coin".to_string(),
        "USDT" => "tether".to_string(),
        "WBTC" => "wrapped-bitcoin".to_string(),
        "WETH" => "weth".to_string(),
        _ => base.to_lowercase(),
    }
}

/// CoinGecko price provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    /// Creates a new CoinGecko provider
    ///
    /// Falls back to the public API when `config.base_url` is not set.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::new("CoinGecko", e))?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| COINGECKO_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    /// Builds the CoinGecko API URL for fetching a pair
    fn build_url(&self, pair: &TradingPair) -> String {
        format!(
            "{}{}?ids={}&vs_currencies={}&include_last_updated_at=true",
            self.base_url,
            COINGECKO_SIMPLE_PRICE_ENDPOINT,
            coingecko_id(&pair.base),
            pair.quote.to_lowercase()
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(COINGECKO_API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Parses the CoinGecko response into a quote for `symbol`
    fn parse_response(
        &self,
        response: CoinGeckoResponse,
        pair: &TradingPair,
        symbol: &str,
    ) -> Result<PriceQuote, ProviderError> {
        let not_found = || {
            self.provider_error(ProviderErrorKind::InvalidResponse(format!(
                "Price not found for {symbol}"
            )))
        };

        let coin = response
            .prices
            .get(&coingecko_id(&pair.base))
            .ok_or_else(not_found)?;
        let price = coin
            .quotes
            .get(&pair.quote.to_lowercase())
            .and_then(|v| v.as_f64())
            .ok_or_else(not_found)?;

        Ok(match coin.last_updated_at {
            Some(ts) => PriceQuote::at(symbol, price, ts),
            None => PriceQuote::new(symbol, price),
        })
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    async fn get_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        let pair = TradingPair::parse(symbol).ok_or_else(|| {
            self.provider_error(ProviderErrorKind::UnsupportedSymbol(format!(
                "{symbol} (expected BASE/QUOTE)"
            )))
        })?;

        let url = self.build_url(&pair);
        tracing::debug!(url = %url, "Fetching price from CoinGecko");

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.provider_error(e))?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(self.provider_error(ProviderErrorKind::RateLimitExceeded));
        }

        // Check for other errors
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read CoinGecko error body");
                    String::new()
                }
            };
            return Err(self.provider_error(ProviderErrorKind::ApiError(format!(
                "HTTP {status}: {body}"
            ))));
        }

        let response_text = response.text().await.map_err(|e| self.provider_error(e))?;

        let coingecko_response: CoinGeckoResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                self.provider_error(ProviderErrorKind::InvalidResponse(format!(
                    "Failed to parse CoinGecko response: {}. Response: {}",
                    e, response_text
                )))
            })?;

        let quote = self.parse_response(coingecko_response, &pair, symbol)?;
        tracing::debug!(symbol, price = quote.price, "Fetched price from CoinGecko");

        Ok(quote)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}{}", self.base_url, COINGECKO_PING_ENDPOINT);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(response) => Ok(response.status().as_u16() == 200),
            Err(e) => {
                tracing::debug!(error = %e, "CoinGecko ping failed");
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
