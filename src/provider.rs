//! Provider abstraction for fetching prices from upstream sources

use crate::{
    error::{ProviderError, ProviderErrorKind},
    types::PriceQuote,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for price providers
///
/// Implementations wrap one upstream source (a REST API, an on-chain oracle,
/// ...). Providers never retry or fail over on their own; that is the job of
/// `PriceFeed`.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches the latest quote for a symbol
    ///
    /// # Arguments
    /// * `symbol` - Trading pair in the provider's format, usually "BASE/QUOTE"
    ///
    /// # Returns
    /// The quote, or an error if the symbol is unsupported or the fetch fails
    async fn get_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError>;

    /// Performs a lightweight liveness probe
    ///
    /// A source that is down is `Ok(false)`. `Err` is reserved for problems
    /// that are not a plain outage, such as a misconfigured endpoint.
    async fn health_check(&self) -> Result<bool, ProviderError>;

    /// Returns the name of this provider, used in logs and errors
    fn name(&self) -> &str;

    /// Wraps a failure in a `ProviderError` carrying this provider's name
    fn provider_error(&self, kind: impl Into<ProviderErrorKind>) -> ProviderError
    where
        Self: Sized,
    {
        ProviderError::new(self.name(), kind)
    }
}

/// True when both handles point at the same provider instance
///
/// Names are not unique, so failover compares instances instead.
pub fn same_provider(a: &Arc<dyn PriceProvider>, b: &Arc<dyn PriceProvider>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted result of a mock health probe
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockHealth {
        Healthy,
        Unhealthy,
        Error,
    }

    /// Mock provider for testing
    pub struct MockProvider {
        name: String,
        health: Mutex<MockHealth>,
        prices: Mutex<HashMap<String, PriceQuote>>,
        failing: Mutex<bool>,
        price_calls: Mutex<usize>,
        health_calls: Mutex<usize>,
    }

    impl MockProvider {
        pub fn new(name: &str, health: MockHealth) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                health: Mutex::new(health),
                prices: Mutex::new(HashMap::new()),
                failing: Mutex::new(false),
                price_calls: Mutex::new(0),
                health_calls: Mutex::new(0),
            })
        }

        pub fn healthy(name: &str) -> Arc<Self> {
            Self::new(name, MockHealth::Healthy)
        }

        pub fn unhealthy(name: &str) -> Arc<Self> {
            Self::new(name, MockHealth::Unhealthy)
        }

        pub fn set_price(&self, symbol: &str, price: f64, timestamp_secs: u64) {
            self.prices.lock().unwrap().insert(
                symbol.to_string(),
                PriceQuote::at(symbol, price, timestamp_secs),
            );
        }

        pub fn set_health(&self, health: MockHealth) {
            *self.health.lock().unwrap() = health;
        }

        /// Makes every `get_price` call fail with a network-style error
        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }

        pub fn price_calls(&self) -> usize {
            *self.price_calls.lock().unwrap()
        }

        pub fn health_calls(&self) -> usize {
            *self.health_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl PriceProvider for MockProvider {
        async fn get_price(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
            *self.price_calls.lock().unwrap() += 1;
            if *self.failing.lock().unwrap() {
                return Err(self.provider_error(ProviderErrorKind::ApiError(
                    "mock failure".to_string(),
                )));
            }

            self.prices
                .lock()
                .unwrap()
                .get(symbol)
                .cloned()
                .ok_or_else(|| {
                    self.provider_error(ProviderErrorKind::UnsupportedSymbol(symbol.to_string()))
                })
        }

        async fn health_check(&self) -> Result<bool, ProviderError> {
            *self.health_calls.lock().unwrap() += 1;
            match *self.health.lock().unwrap() {
                MockHealth::Healthy => Ok(true),
                MockHealth::Unhealthy => Ok(false),
                MockHealth::Error => Err(self.provider_error(ProviderErrorKind::InvalidConfig(
                    "mock probe error".to_string(),
                ))),
            }
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockProvider;
    use super::*;

    #[test]
    fn test_same_provider_compares_instances_not_names() {
        let a: Arc<dyn PriceProvider> = MockProvider::healthy("twin");
        let b: Arc<dyn PriceProvider> = MockProvider::healthy("twin");
        let a_again = a.clone();

        assert!(same_provider(&a, &a_again));
        assert!(!same_provider(&a, &b));
    }
}
