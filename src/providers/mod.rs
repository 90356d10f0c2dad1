//! Layered data providers with timeout, fallback and provenance tracking
//!
//! Each data kind (prices, sentiment, news, ETF headlines) is served by a
//! [`ProviderChain`]: an ordered list of upstream [`Provider`]s tried in
//! declaration order, each under its own timeout. The first success wins and
//! later providers are never called. When every provider fails the chain asks
//! its [`SyntheticSource`] for a plausible baseline-plus-jitter value, tagged
//! [`Provenance::Synthetic`], so message production never blocks on the
//! network.
//!
//! ```text
//!   fetch() ──► CoinGecko ──fail──► Binance ──fail──► CoinPaprika ──fail──► synthetic
//!                  │ ok                │ ok               │ ok
//!                  ▼                   ▼                  ▼
//!              Sourced { value.normalized(), Live { provider } }
//! ```
//!
//! [`MarketData`] puts a [`TtlCache`](crate::cache::TtlCache) in front of each
//! chain. Only live values are cached.

pub mod error;
pub mod market;
pub mod news;
pub mod prices;
pub mod sentiment;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use error::FetchError;
pub use market::{CandidateSource, MarketData, MarketFeed, ProbeReport};
pub use news::{CryptoPanicProvider, CuratedNews, EtfInsight, EtfProvider, EtfRotation, NewsItem};
pub use prices::{
    BinanceProvider, CoinGeckoProvider, CoinPaprikaProvider, PriceBaseline, PriceBoard, PriceQuote,
};
pub use sentiment::{FearGreedProvider, Sentiment, SentimentBaseline};

/// Decimal places kept for prices and percentage changes
pub const PRICE_DECIMALS: u32 = 2;

/// A value a chain can serve
///
/// `normalized` runs once at the chain boundary, so providers can hand back
/// upstream precision and the chain presents one uniform contract.
pub trait Payload: Clone + Send + Sync + 'static {
    /// Canonicalize the value (rounding, whitespace cleanup)
    fn normalized(self) -> Self {
        self
    }
}

/// Where a value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provenance {
    /// Returned by a live upstream call
    Live { provider: String },
    /// Produced by the chain's fallback generator
    Synthetic,
}

impl Provenance {
    /// Short label: `"live"` or `"synthetic"`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Live { .. } => "live",
            Self::Synthetic => "synthetic",
        }
    }

    /// Name of the provider that answered, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Live { provider } => Some(provider),
            Self::Synthetic => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live { provider } => write!(f, "live:{provider}"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// A value together with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    /// Wrap a value returned by `provider`
    pub fn live(provider: impl Into<String>, value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Live {
                provider: provider.into(),
            },
        }
    }

    /// Wrap a fallback value
    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Synthetic,
        }
    }

    /// Check whether the value came from the fallback generator
    pub fn is_synthetic(&self) -> bool {
        self.provenance == Provenance::Synthetic
    }

    /// Transform the value, keeping provenance
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: f(self.value),
            provenance: self.provenance,
        }
    }
}

/// An upstream data source
#[async_trait]
pub trait Provider<T>: Send + Sync {
    /// Provider name used in logs and provenance
    fn name(&self) -> &str;

    /// Per-provider timeout; `None` uses the chain default
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Fetch one value from upstream
    async fn fetch(&self) -> Result<T, FetchError>;
}

/// Generator for the value served when every provider has failed
pub trait SyntheticSource<T>: Send + Sync {
    /// Produce a plausible value: a fixed baseline plus bounded jitter
    fn synthesize(&self) -> T;
}

/// Ordered fallback chain of providers for one data kind
pub struct ProviderChain<T> {
    name: String,
    providers: Vec<Arc<dyn Provider<T>>>,
    default_timeout: Duration,
    fallback: Arc<dyn SyntheticSource<T>>,
}

impl<T: Payload> ProviderChain<T> {
    /// Create an empty chain with the given fallback generator
    pub fn new(name: impl Into<String>, fallback: impl SyntheticSource<T> + 'static) -> Self {
        Self {
            name: name.into(),
            providers: Vec::new(),
            default_timeout: Duration::from_secs(10),
            fallback: Arc::new(fallback),
        }
    }

    /// Append a provider; providers are tried in the order they are added
    pub fn with_provider(mut self, provider: impl Provider<T> + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Append an already shared provider
    pub fn with_arc_provider(mut self, provider: Arc<dyn Provider<T>>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Set the timeout for providers that do not declare their own
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Chain name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider names in priority order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Try each provider in order and return the first success
    ///
    /// Returns [`FetchError::AllProvidersFailed`] when none succeeds; never
    /// synthesizes.
    pub async fn fetch_live(&self) -> Result<Sourced<T>, FetchError> {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let timeout = provider.timeout().unwrap_or(self.default_timeout);

            match tokio::time::timeout(timeout, provider.fetch()).await {
                Ok(Ok(value)) => {
                    tracing::debug!(
                        chain = %self.name,
                        provider = %provider.name(),
                        "Provider succeeded"
                    );
                    return Ok(Sourced::live(provider.name(), value.normalized()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        chain = %self.name,
                        provider = %provider.name(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                    attempts.push(format!("{}: {e}", provider.name()));
                }
                Err(_) => {
                    let err = FetchError::Timeout(timeout.as_millis() as u64);
                    tracing::warn!(
                        chain = %self.name,
                        provider = %provider.name(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Provider timed out, trying next"
                    );
                    attempts.push(format!("{}: {err}", provider.name()));
                }
            }
        }

        Err(FetchError::AllProvidersFailed {
            chain: self.name.clone(),
            attempts,
        })
    }

    /// Fetch a value, falling back to synthetic data if every provider fails
    pub async fn fetch(&self) -> Sourced<T> {
        match self.fetch_live().await {
            Ok(sourced) => sourced,
            Err(e) => {
                tracing::warn!(chain = %self.name, error = %e, "Using synthetic fallback");
                self.synthetic()
            }
        }
    }

    /// Produce a synthetic value without contacting any provider
    pub fn synthetic(&self) -> Sourced<T> {
        Sourced::synthetic(self.fallback.synthesize().normalized())
    }
}

/// Build the shared HTTP client used by the HTTP providers
pub fn build_client(user_agent: &str) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}

/// Join a configured base URL and a path without doubling slashes
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a non-success response into a typed error
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}
