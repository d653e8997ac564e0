//! Price feed with automatic provider failover
//!
//! `PriceFeed` owns an ordered list of providers and serves every query from a
//! single active one. When the active provider fails, the feed elects the
//! first other provider that passes a health probe and retries the query
//! there.
//!
//! ```text
//! get_price(symbol)
//!     ↓
//! active provider ──ok──→ quote
//!     ↓ err
//! re-election (health probes in list order, providers failed this call skipped)
//!     ↓
//! retry on the new active provider (at most len - 1 failovers)
//! ```
//!
//! Mutating operations take `&mut self`: the feed has no internal lock, so
//! sharing it between tasks means wrapping it in a `tokio::sync::Mutex`.

use crate::{
    config::FeedConfig,
    error::PriceFeedError,
    metrics::{MetricsCollector, ProviderMetrics},
    provider::{same_provider, PriceProvider},
    types::{ComponentHealth, FeedState, HealthStatus, PriceQuote},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Price feed that fails over between providers
pub struct PriceFeed {
    providers: Vec<Arc<dyn PriceProvider>>,
    metrics: Vec<MetricsCollector>,
    active: Option<usize>,
    state: FeedState,
    failover_count: u64,
}

impl PriceFeed {
    /// Creates an uninitialized feed
    ///
    /// Providers are tried in the order given. Fails if the list is empty.
    pub fn new(providers: Vec<Arc<dyn PriceProvider>>) -> Result<Self, PriceFeedError> {
        if providers.is_empty() {
            return Err(PriceFeedError::NoProviders);
        }

        let metrics = providers
            .iter()
            .map(|p| MetricsCollector::new(p.name()))
            .collect();

        Ok(Self {
            providers,
            metrics,
            active: None,
            state: FeedState::Uninitialized,
            failover_count: 0,
        })
    }

    /// Creates a feed and selects its first healthy provider
    ///
    /// # Example
    /// ```no_run
    /// use price_feed_sdk::{PriceFeed, PriceProvider, ProviderConfig};
    /// use price_feed_sdk::providers::{ChainlinkProvider, CoinGeckoProvider};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let coingecko: Arc<dyn PriceProvider> =
    ///     Arc::new(CoinGeckoProvider::new(ProviderConfig::default())?);
    /// let chainlink: Arc<dyn PriceProvider> =
    ///     Arc::new(ChainlinkProvider::new(ProviderConfig::default())?);
    ///
    /// let mut feed = PriceFeed::create(vec![coingecko, chainlink]).await?;
    ///
    /// let quote = feed.get_price("ETH/USD").await?;
    /// println!("{}: {:.2}", quote.symbol, quote.price);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(providers: Vec<Arc<dyn PriceProvider>>) -> Result<Self, PriceFeedError> {
        let mut feed = Self::new(providers)?;
        feed.initialize().await?;
        Ok(feed)
    }

    /// Builds the configured providers and initializes a feed over them
    pub async fn from_config(config: &FeedConfig) -> Result<Self, PriceFeedError> {
        Self::create(config.build_providers()?).await
    }

    /// Like `from_config`, reading the configuration from the environment
    pub async fn from_env() -> Result<Self, PriceFeedError> {
        Self::from_config(&FeedConfig::from_env()?).await
    }

    /// Probes providers in order and activates the first healthy one
    ///
    /// A probe that errors (rather than reporting unhealthy) aborts
    /// initialization. On failure the feed stays unusable; initialization is
    /// never retried.
    pub async fn initialize(&mut self) -> Result<(), PriceFeedError> {
        if self.state != FeedState::Uninitialized {
            return Err(PriceFeedError::AlreadyInitialized);
        }

        for index in 0..self.providers.len() {
            let provider = self.providers[index].clone();
            match provider.health_check().await {
                Ok(true) => {
                    self.activate(index);
                    return Ok(());
                }
                Ok(false) => {
                    debug!(provider = provider.name(), "Provider unhealthy at startup");
                }
                Err(e) => {
                    self.state = FeedState::Failed;
                    return Err(PriceFeedError::ProbeFailed {
                        provider: provider.name().to_string(),
                        source: e,
                    });
                }
            }
        }

        self.state = FeedState::Failed;
        Err(PriceFeedError::NoHealthyProviders)
    }

    /// Gets the current price for a symbol from the active provider
    ///
    /// Any provider failure triggers a re-election and the query is retried on
    /// the replacement, up to `len - 1` times per call. Providers that already
    /// failed during this call are not elected again.
    pub async fn get_price(&mut self, symbol: &str) -> Result<PriceQuote, PriceFeedError> {
        let max_failovers = self.providers.len() - 1;
        let mut failovers = 0;
        let mut tried = Vec::with_capacity(self.providers.len());

        loop {
            let index = self.active.ok_or(PriceFeedError::NoActiveProvider)?;
            let provider = self.providers[index].clone();

            let start = Instant::now();
            let err = match provider.get_price(symbol).await {
                Ok(quote) => {
                    self.metrics[index].record_success(start.elapsed()).await;
                    return Ok(quote);
                }
                Err(e) => e,
            };
            self.metrics[index]
                .record_failure(start.elapsed(), &err)
                .await;

            warn!(
                provider = provider.name(),
                symbol,
                error = %err,
                unsupported_symbol = err.is_unsupported_symbol(),
                "Active provider failed, re-electing"
            );
            tried.push(index);

            // Every provider has had its turn; only move off the last failure
            let exhausted = failovers == max_failovers;
            let last = [index];
            let skip = if exhausted { &last[..] } else { &tried[..] };

            if !self.reelect(skip).await {
                return Err(PriceFeedError::FailoverExhausted {
                    failed: provider.name().to_string(),
                    source: err,
                });
            }

            if exhausted {
                return Err(PriceFeedError::RetriesExhausted {
                    symbol: symbol.to_string(),
                    attempts: failovers + 1,
                    source: err,
                });
            }
            failovers += 1;
        }
    }

    /// Replaces the active provider with the first healthy one not in `skip`
    ///
    /// `skip` holds the providers that failed, most recent last. Candidates
    /// are compared by instance. Probe errors count as unhealthy here. Returns
    /// false, leaving the feed `Failed` with no active provider, when no
    /// candidate is healthy.
    async fn reelect(&mut self, skip: &[usize]) -> bool {
        let skipped: Vec<Arc<dyn PriceProvider>> =
            skip.iter().map(|&i| self.providers[i].clone()).collect();
        let failed_name = skipped.last().map(|p| p.name().to_string()).unwrap_or_default();
        self.active = None;
        self.state = FeedState::Degraded;

        for index in 0..self.providers.len() {
            let candidate = self.providers[index].clone();
            if skipped.iter().any(|p| same_provider(&candidate, p)) {
                continue;
            }

            match candidate.health_check().await {
                Ok(true) => {
                    self.failover_count += 1;
                    info!(
                        from = %failed_name,
                        to = candidate.name(),
                        "Failed over to provider"
                    );
                    self.activate(index);
                    return true;
                }
                Ok(false) => {
                    debug!(provider = candidate.name(), "Failover candidate unhealthy");
                }
                Err(e) => {
                    warn!(
                        provider = candidate.name(),
                        error = %e,
                        "Failover candidate probe errored, skipping"
                    );
                }
            }
        }

        self.state = FeedState::Failed;
        warn!(
            failed = %failed_name,
            "No healthy providers available after failover"
        );
        false
    }

    /// Re-probes every provider in order and activates the first healthy one
    ///
    /// The feed never calls this on its own. Unlike `initialize`, probe errors
    /// count as unhealthy. On an uninitialized feed this is `initialize`.
    pub async fn recover(&mut self) -> Result<(), PriceFeedError> {
        if self.state == FeedState::Uninitialized {
            return self.initialize().await;
        }

        for index in 0..self.providers.len() {
            let provider = self.providers[index].clone();
            match provider.health_check().await {
                Ok(true) => {
                    self.activate(index);
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Probe errored during recovery");
                }
            }
        }

        self.active = None;
        self.state = FeedState::Failed;
        Err(PriceFeedError::NoHealthyProviders)
    }

    fn activate(&mut self, index: usize) {
        self.active = Some(index);
        self.state = FeedState::Ready;
        info!(provider = self.providers[index].name(), "Activated price provider");
    }

    /// Returns the provider currently serving queries
    pub fn active_provider(&self) -> Option<&Arc<dyn PriceProvider>> {
        self.active.map(|index| &self.providers[index])
    }

    /// Returns the current lifecycle state
    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Returns the providers in failover order
    pub fn providers(&self) -> &[Arc<dyn PriceProvider>] {
        &self.providers
    }

    /// Returns how many times a replacement provider has been elected
    pub fn failover_count(&self) -> u64 {
        self.failover_count
    }

    /// Gets request metrics for every provider, in failover order
    pub async fn provider_metrics(&self) -> Vec<ProviderMetrics> {
        let mut result = Vec::with_capacity(self.metrics.len());
        for collector in &self.metrics {
            result.push(collector.get_metrics().await);
        }
        result
    }

    /// Reports the health of the feed
    ///
    /// Serving from the first provider is healthy, serving from a fallback is
    /// degraded, and having no active provider is unhealthy.
    pub fn health(&self) -> ComponentHealth {
        let mut details = HashMap::new();
        details.insert("state".to_string(), serde_json::json!(self.state));
        details.insert(
            "active_provider".to_string(),
            serde_json::json!(self.active_provider().map(|p| p.name())),
        );
        details.insert(
            "failover_count".to_string(),
            serde_json::json!(self.failover_count),
        );
        details.insert(
            "providers".to_string(),
            serde_json::json!(self.providers.iter().map(|p| p.name()).collect::<Vec<_>>()),
        );

        let (status, message) = match (self.state, self.active) {
            (FeedState::Ready, Some(0)) => (
                HealthStatus::Healthy,
                "Price feed is serving from its primary provider".to_string(),
            ),
            (FeedState::Ready, Some(index)) => (
                HealthStatus::Degraded,
                format!(
                    "Price feed is serving from fallback provider {}",
                    self.providers[index].name()
                ),
            ),
            (state, _) => (
                HealthStatus::Unhealthy,
                format!("Price feed has no active provider ({state})"),
            ),
        };

        ComponentHealth {
            name: "price_feed".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}
