//! Price provider implementations

pub mod chainlink;
pub mod coingecko;

pub use chainlink::ChainlinkProvider;
pub use coingecko::CoinGeckoProvider;
