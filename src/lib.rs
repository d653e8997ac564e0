//! # Price Feed SDK
//!
//! Fetches asset prices from several upstream sources behind one interface,
//! failing over automatically when the active source goes down.
//!
//! Two providers ship with the crate:
//!
//! - `CoinGeckoProvider`: the CoinGecko REST API
//! - `ChainlinkProvider`: Chainlink aggregators on Ethereum mainnet, read
//!   through an alloy provider
//!
//! Any other source can be plugged in by implementing `PriceProvider`.
//!
//! ## Usage
//!
//! ```no_run
//! use price_feed_sdk::{PriceFeed, PriceFeedError};
//!
//! # async fn example() -> Result<(), PriceFeedError> {
//! // Providers and their order come from PRICE_FEED_PROVIDERS,
//! // COINGECKO_BASE_URL, CHAINLINK_BASE_URL, ...
//! let mut feed = PriceFeed::from_env().await?;
//!
//! match feed.get_price("ETH/USD").await {
//!     Ok(quote) => println!("ETH/USD: {:.2} at {}", quote.price, quote.timestamp_secs),
//!     Err(PriceFeedError::FailoverExhausted { failed, .. }) => {
//!         eprintln!("{failed} failed and no other provider is healthy");
//!         feed.recover().await?;
//!     }
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Failover
//!
//! The feed probes providers in order at startup and serves every query from
//! the first healthy one. When that provider fails, the feed probes the
//! others (in order, skipping every provider that already failed the query),
//! switches to the first healthy one and retries the query there. See the `feed` module.

pub mod config;
pub mod constants;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{FeedConfig, ProviderConfig, ProviderKind};
pub use error::{PriceFeedError, ProviderError, ProviderErrorKind};
pub use feed::PriceFeed;
pub use metrics::ProviderMetrics;
pub use provider::PriceProvider;
pub use types::{ComponentHealth, FeedState, HealthStatus, PriceQuote, TradingPair};
