//! Constants for the price feed
//!
//! Endpoints, timeouts and oracle addresses are compile-time constants.
//! The only runtime configuration is the per-provider `ProviderConfig`
//! (see the `config` module).

use alloy::primitives::{address, Address};

/// HTTP request timeout when talking to a provider (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "price-feed-sdk/0.1.0";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// CoinGecko liveness endpoint
pub const COINGECKO_PING_ENDPOINT: &str = "/ping";

/// Header carrying the CoinGecko API key
pub const COINGECKO_API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// Public Ethereum mainnet JSON-RPC endpoint
pub const ETHEREUM_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";

/// Ethereum mainnet chain id
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// Chainlink USD pairs report answers with 8 decimals
pub const CHAINLINK_USD_DECIMALS: u32 = 8;

/// Chainlink aggregator proxies on Ethereum mainnet, keyed by symbol
pub const CHAINLINK_FEEDS: &[(&str, Address)] = &[
    ("ETH/USD", address!("5f4ec3df9cbd43714fe2740f5e3616155c5b8419")),
    ("BTC/USD", address!("f4030086522a5beea4988f8ca5b36dbc97bee88c")),
];

/// Provider order used when `PRICE_FEED_PROVIDERS` is not set
pub const DEFAULT_PROVIDER_ORDER: &str = "coingecko,chainlink";
