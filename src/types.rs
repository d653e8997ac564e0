//! Types for the price feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single price observation for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// The trading pair symbol as requested (e.g. "BTC/USD")
    pub symbol: String,

    /// Price of the base asset in units of the quote asset
    pub price: f64,

    /// Unix timestamp of the observation, in seconds
    pub timestamp_secs: u64,
}

impl PriceQuote {
    /// Create a quote stamped with the current time
    pub fn new(symbol: impl Into<String>, price: f64) -> Self {
        Self::at(symbol, price, Utc::now().timestamp().max(0) as u64)
    }

    /// Create a quote with an explicit timestamp
    pub fn at(symbol: impl Into<String>, price: f64, timestamp_secs: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp_secs,
        }
    }

    /// Get the age of the quote
    pub fn age(&self) -> std::time::Duration {
        let now = Utc::now().timestamp().max(0) as u64;
        std::time::Duration::from_secs(now.saturating_sub(self.timestamp_secs))
    }
}

/// A "BASE/QUOTE" symbol split into its two legs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    /// Parses a "BASE/QUOTE" symbol
    ///
    /// Returns `None` unless the symbol has exactly one `/` with a non-empty
    /// leg on each side.
    pub fn parse(symbol: &str) -> Option<Self> {
        let (base, quote) = symbol.split_once('/')?;
        let base = base.trim();
        let quote = quote.trim();
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return None;
        }

        Some(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Lifecycle state of a `PriceFeed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    /// Constructed but never probed
    Uninitialized,
    /// An active provider is serving queries
    Ready,
    /// The active provider just failed and a replacement is being elected
    Degraded,
    /// No provider is healthy; queries fail until `recover` succeeds
    Failed,
}

impl fmt::Display for FeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedState::Uninitialized => "uninitialized",
            FeedState::Ready => "ready",
            FeedState::Degraded => "degraded",
            FeedState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Overall health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Component is healthy and operational
    Healthy,
    /// Component is degraded but still functional
    Degraded,
    /// Component is unhealthy and requires attention
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
