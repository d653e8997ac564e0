//! Error types for the price feed

use thiserror::Error;

/// What went wrong inside a single provider
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// Network request failed
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// JSON-RPC transport failed before the node answered
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Symbol not supported by this provider
    #[error("Symbol not supported: {0}")]
    UnsupportedSymbol(String),

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// JSON-RPC node returned an error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Provider is pointed at something it cannot use
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for ProviderErrorKind {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

/// A failure raised by a provider, tagged with the provider's name
#[derive(Debug, Error)]
#[error("Error in {provider}: {source}")]
pub struct ProviderError {
    /// Name of the provider that failed
    pub provider: String,
    /// Underlying failure
    #[source]
    pub source: ProviderErrorKind,
}

impl ProviderError {
    /// Wraps a failure of the named provider
    pub fn new(provider: impl Into<String>, source: impl Into<ProviderErrorKind>) -> Self {
        Self {
            provider: provider.into(),
            source: source.into(),
        }
    }

    /// Returns the underlying failure
    pub fn kind(&self) -> &ProviderErrorKind {
        &self.source
    }

    /// True when the provider rejected the symbol itself rather than failing to
    /// reach its upstream
    pub fn is_unsupported_symbol(&self) -> bool {
        matches!(self.source, ProviderErrorKind::UnsupportedSymbol(_))
    }
}

/// Errors surfaced by the price feed manager
#[derive(Debug, Error)]
pub enum PriceFeedError {
    /// The feed was constructed without providers
    #[error("At least one provider must be specified")]
    NoProviders,

    /// A health probe errored during initialization
    #[error("Failed to initialize provider {provider}: {source}")]
    ProbeFailed {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// No provider passed its health probe during initialization
    #[error("No healthy providers available")]
    NoHealthyProviders,

    /// Initialization was attempted twice
    #[error("Price feed is already initialized")]
    AlreadyInitialized,

    /// A query was made without an active provider
    #[error("No active provider available")]
    NoActiveProvider,

    /// Re-election found no healthy replacement
    #[error("No healthy providers available after failover from {failed}")]
    FailoverExhausted {
        failed: String,
        #[source]
        source: ProviderError,
    },

    /// Every failover allowed for one query was used up
    #[error("Price for {symbol} failed after {attempts} attempts")]
    RetriesExhausted {
        symbol: String,
        attempts: usize,
        #[source]
        source: ProviderError,
    },

    /// Runtime configuration could not be turned into providers
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PriceFeedError {
    /// Creates a Config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors raised while setting the feed up
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            Self::ProbeFailed { .. } | Self::NoHealthyProviders | Self::AlreadyInitialized
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_names_provider() {
        let err = ProviderError::new(
            "Chainlink",
            ProviderErrorKind::UnsupportedSymbol("DOGE/USD".to_string()),
        );

        assert_eq!(
            err.to_string(),
            "Error in Chainlink: Symbol not supported: DOGE/USD"
        );
        assert!(err.is_unsupported_symbol());
    }

    #[test]
    fn test_probe_failed_is_initialization_error() {
        let err = PriceFeedError::ProbeFailed {
            provider: "CoinGecko".to_string(),
            source: ProviderError::new("CoinGecko", ProviderErrorKind::Timeout),
        };

        assert!(err.is_initialization());
        assert!(err.to_string().contains("CoinGecko"));
        assert!(!PriceFeedError::NoActiveProvider.is_initialization());
    }
}
