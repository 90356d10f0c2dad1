//! Cached market data facade over the provider chains

use super::{
    build_client, BinanceProvider, CoinGeckoProvider, CoinPaprikaProvider, CryptoPanicProvider,
    CuratedNews, EtfInsight, EtfProvider, EtfRotation, FearGreedProvider, FetchError, NewsItem,
    Payload, PriceBaseline, PriceBoard, Provenance, ProviderChain, Sentiment, SentimentBaseline,
    Sourced,
};
use crate::cache::TtlCache;
use crate::config::{CacheConfig, ProvidersConfig};
use async_trait::async_trait;
use chrono::FixedOffset;
use std::time::Duration;

const PRICES_KEY: &str = "prices";
const SENTIMENT_KEY: &str = "sentiment";
const NEWS_KEY: &str = "news";
const ETF_KEY: &str = "etf";

/// Market inputs consumed by the content engine
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn prices(&self) -> Sourced<PriceBoard>;
    async fn sentiment(&self) -> Sourced<Sentiment>;
    async fn news(&self) -> Sourced<Vec<NewsItem>>;
    async fn etf(&self) -> Sourced<EtfInsight>;
}

/// Breaking-news candidates consumed by the background poller
///
/// An `Err` means the fetch step itself failed unexpectedly; the poller then
/// backs off before retrying.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self) -> Result<Sourced<Vec<NewsItem>>, FetchError>;
}

/// Time-to-live per data kind
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub prices: Duration,
    pub sentiment: Duration,
    pub news: Duration,
    pub etf: Duration,
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            prices: Duration::from_secs(config.prices_ttl_secs),
            sentiment: Duration::from_secs(config.sentiment_ttl_secs),
            news: Duration::from_secs(config.news_ttl_secs),
            etf: Duration::from_secs(config.etf_ttl_secs),
        }
    }
}

/// Outcome of probing one chain without the cache
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub chain: String,
    pub providers: Vec<String>,
    pub provenance: Provenance,
}

/// Provider chains for every data kind, each behind its own TTL cache
pub struct MarketData {
    prices: ProviderChain<PriceBoard>,
    sentiment: ProviderChain<Sentiment>,
    news: ProviderChain<Vec<NewsItem>>,
    etf: ProviderChain<EtfInsight>,
    ttls: CacheTtls,
    price_cache: TtlCache<Sourced<PriceBoard>>,
    sentiment_cache: TtlCache<Sourced<Sentiment>>,
    news_cache: TtlCache<Sourced<Vec<NewsItem>>>,
    etf_cache: TtlCache<Sourced<EtfInsight>>,
}

impl MarketData {
    /// Assemble from prebuilt chains
    pub fn new(
        prices: ProviderChain<PriceBoard>,
        sentiment: ProviderChain<Sentiment>,
        news: ProviderChain<Vec<NewsItem>>,
        etf: ProviderChain<EtfInsight>,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            prices,
            sentiment,
            news,
            etf,
            ttls,
            price_cache: TtlCache::new(),
            sentiment_cache: TtlCache::new(),
            news_cache: TtlCache::new(),
            etf_cache: TtlCache::new(),
        }
    }

    /// Build the standard chains from configuration
    pub fn from_config(
        providers: &ProvidersConfig,
        cache: &CacheConfig,
        utc_offset: FixedOffset,
        etf_updates: Vec<String>,
        max_remember: usize,
    ) -> Result<Self, FetchError> {
        let client = build_client(&providers.user_agent)?;
        let token = providers.cryptopanic_token.clone();

        let prices = ProviderChain::new(PRICES_KEY, PriceBaseline::default())
            .with_provider(CoinGeckoProvider::new(
                client.clone(),
                &providers.coingecko.url,
                providers.coingecko.timeout(),
            ))
            .with_provider(BinanceProvider::new(
                client.clone(),
                &providers.binance.url,
                providers.binance.timeout(),
            ))
            .with_provider(CoinPaprikaProvider::new(
                client.clone(),
                &providers.coinpaprika.url,
                providers.coinpaprika.timeout(),
            ));

        let sentiment = ProviderChain::new(SENTIMENT_KEY, SentimentBaseline::new(utc_offset))
            .with_provider(FearGreedProvider::new(
                client.clone(),
                &providers.fear_greed.url,
                providers.fear_greed.timeout(),
            ));

        let news = ProviderChain::new(NEWS_KEY, CuratedNews::default()).with_provider(
            CryptoPanicProvider::new(
                client.clone(),
                &providers.cryptopanic.url,
                providers.cryptopanic.timeout(),
            )
            .with_auth_token(token.clone()),
        );

        let etf = ProviderChain::new(ETF_KEY, EtfRotation::new(etf_updates, max_remember))
            .with_provider(
                EtfProvider::new(client, &providers.cryptopanic.url, providers.cryptopanic.timeout())
                    .with_auth_token(token),
            );

        Ok(Self::new(prices, sentiment, news, etf, CacheTtls::from(cache)))
    }

    /// Call every chain directly, bypassing the caches
    pub async fn probe(&self) -> Vec<ProbeReport> {
        vec![
            probe_chain(&self.prices).await,
            probe_chain(&self.sentiment).await,
            probe_chain(&self.news).await,
            probe_chain(&self.etf).await,
        ]
    }
}

async fn probe_chain<T: Payload>(chain: &ProviderChain<T>) -> ProbeReport {
    let sourced = chain.fetch().await;
    ProbeReport {
        chain: chain.name().to_string(),
        providers: chain.provider_names().into_iter().map(String::from).collect(),
        provenance: sourced.provenance,
    }
}

/// Serve a fresh cached live value, refresh it, or fall back to synthetic
///
/// Synthetic values never enter the cache, so a recovered provider is picked
/// up on the next call.
async fn cached<T: Payload>(
    cache: &TtlCache<Sourced<T>>,
    key: &str,
    ttl: Duration,
    chain: &ProviderChain<T>,
) -> Sourced<T> {
    match cache.get(key, ttl, || chain.fetch_live()).await {
        Ok(sourced) => sourced,
        Err(e) => {
            tracing::warn!(chain = %key, error = %e, "All providers failed, using synthetic data");
            chain.synthetic()
        }
    }
}

#[async_trait]
impl MarketFeed for MarketData {
    async fn prices(&self) -> Sourced<PriceBoard> {
        cached(&self.price_cache, PRICES_KEY, self.ttls.prices, &self.prices).await
    }

    async fn sentiment(&self) -> Sourced<Sentiment> {
        cached(&self.sentiment_cache, SENTIMENT_KEY, self.ttls.sentiment, &self.sentiment).await
    }

    async fn news(&self) -> Sourced<Vec<NewsItem>> {
        cached(&self.news_cache, NEWS_KEY, self.ttls.news, &self.news).await
    }

    async fn etf(&self) -> Sourced<EtfInsight> {
        cached(&self.etf_cache, ETF_KEY, self.ttls.etf, &self.etf).await
    }
}

#[async_trait]
impl CandidateSource for MarketData {
    async fn candidates(&self) -> Result<Sourced<Vec<NewsItem>>, FetchError> {
        Ok(self.news().await)
    }
}
