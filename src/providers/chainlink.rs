//! Chainlink price provider implementation
//!
//! Reads Chainlink aggregator contracts on Ethereum mainnet through an alloy
//! HTTP provider: `eth_chainId` for liveness and `latestRoundData()` for
//! prices.

use crate::{
    config::ProviderConfig,
    constants::{
        CHAINLINK_FEEDS, CHAINLINK_USD_DECIMALS, ETHEREUM_MAINNET_CHAIN_ID, ETHEREUM_RPC_URL,
        REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::{ProviderError, ProviderErrorKind},
    provider::PriceProvider,
    types::PriceQuote,
};
use alloy::{
    contract::Error as ContractError,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    sol,
    transports::{
        http::{reqwest::Url, Http},
        RpcError, TransportError,
    },
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use std::time::Duration;
use AggregatorV3Interface::{latestRoundDataReturn, AggregatorV3InterfaceInstance};

sol! {
    #[sol(rpc)]
    interface AggregatorV3Interface {
        function latestRoundData() external view returns (
            uint80 roundId,
            int256 answer,
            uint256 startedAt,
            uint256 updatedAt,
            uint80 answeredInRound
        );
    }
}

const NAME: &str = "Chainlink";

/// Chainlink price provider
pub struct ChainlinkProvider {
    provider: DynProvider,
    rpc_url: String,
}

impl ChainlinkProvider {
    /// Creates a new Chainlink provider
    ///
    /// `config.base_url` is the RPC endpoint; a public mainnet node is used
    /// when it is not set. `config.api_key` is sent as a bearer token.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let rpc_url = config
            .base_url
            .unwrap_or_else(|| ETHEREUM_RPC_URL.to_string());
        let url = Url::parse(&rpc_url).map_err(|e| {
            ProviderError::new(
                NAME,
                ProviderErrorKind::InvalidConfig(format!("Invalid RPC URL {rpc_url}: {e}")),
            )
        })?;

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                ProviderError::new(
                    NAME,
                    ProviderErrorKind::InvalidConfig("API key is not a valid header value".into()),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ProviderError::new(NAME, e))?;

        let rpc = RpcClient::new(Http::with_client(client, url), false);
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(rpc);

        Ok(Self {
            provider: DynProvider::new(provider),
            rpc_url,
        })
    }

    /// Returns the aggregator address for a symbol, if one is known
    fn feed_address(symbol: &str) -> Option<Address> {
        CHAINLINK_FEEDS
            .iter()
            .find(|(feed_symbol, _)| *feed_symbol == symbol)
            .map(|(_, address)| *address)
    }

    fn rpc_error(&self, err: TransportError) -> ProviderError {
        let kind = match err {
            RpcError::ErrorResp(payload) => ProviderErrorKind::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            },
            RpcError::Transport(e) => ProviderErrorKind::Transport(e.to_string()),
            other => ProviderErrorKind::InvalidResponse(other.to_string()),
        };
        self.provider_error(kind)
    }

    fn contract_error(&self, err: ContractError) -> ProviderError {
        match err {
            ContractError::TransportError(e) => self.rpc_error(e),
            other => self.provider_error(ProviderErrorKind::InvalidResponse(other.to_string())),
        }
    }
}

/// Converts a round into a quote, rejecting non-positive answers
fn quote_from_round(symbol: &str, round: &latestRoundDataReturn) -> Result<PriceQuote, String> {
    if round.answer.is_negative() {
        return Err("negative answer".to_string());
    }
    if round.answer.is_zero() {
        return Err("zero answer".to_string());
    }

    let answer =
        u128::try_from(round.answer.into_raw()).map_err(|_| "answer out of range".to_string())?;
    let updated_at =
        u64::try_from(round.updatedAt).map_err(|_| "updatedAt out of range".to_string())?;
    let price = answer as f64 / 10f64.powi(CHAINLINK_USD_DECIMALS as i32);

    Ok(PriceQuote::at(symbol, price, updated_at))
}

#[async_trait]
impl PriceProvider for ChainlinkProvider {
    async fn get_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        let address = Self::feed_address(symbol).ok_or_else(|| {
            self.provider_error(ProviderErrorKind::UnsupportedSymbol(format!(
                "{symbol} (Chainlink feeds: {})",
                CHAINLINK_FEEDS
                    .iter()
                    .map(|(s, _)| *s)
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        })?;

        tracing::debug!(symbol, %address, "Reading Chainlink latestRoundData");

        let aggregator = AggregatorV3InterfaceInstance::new(address, &self.provider);
        let round = aggregator
            .latestRoundData()
            .call()
            .await
            .map_err(|e| self.contract_error(e))?;

        let quote = quote_from_round(symbol, &round)
            .map_err(|e| self.provider_error(ProviderErrorKind::InvalidResponse(e)))?;
        tracing::debug!(
            symbol,
            price = quote.price,
            updated_at = quote.timestamp_secs,
            "Fetched price from Chainlink"
        );

        Ok(quote)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        match self.provider.get_chain_id().await {
            Ok(ETHEREUM_MAINNET_CHAIN_ID) => Ok(true),
            Ok(other) => Err(self.provider_error(ProviderErrorKind::InvalidConfig(format!(
                "RPC endpoint is on chain {other}, expected {ETHEREUM_MAINNET_CHAIN_ID}"
            )))),
            Err(e) => {
                tracing::debug!(error = %e, "Chainlink RPC probe failed");
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        NAME
    }
}
