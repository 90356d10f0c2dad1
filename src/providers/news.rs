//! News and ETF headline providers

use super::{check_status, endpoint, FetchError, Payload, Provider, SyntheticSource};
use crate::content::RotationState;
use crate::utils::normalize_whitespace;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// One news headline with an importance score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Upstream engagement signal (positive votes)
    pub importance: u32,
}

impl NewsItem {
    pub fn new(title: impl Into<String>, source: impl Into<String>, importance: u32) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            url: None,
            importance,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl Payload for Vec<NewsItem> {
    fn normalized(self) -> Self {
        self.into_iter()
            .map(|item| NewsItem {
                title: normalize_whitespace(&item.title),
                source: normalize_whitespace(&item.source),
                ..item
            })
            .filter(|item| !item.title.is_empty())
            .collect()
    }
}

// ============================================================================
// CryptoPanic
// ============================================================================

#[derive(Debug, Deserialize)]
struct PanicResponse {
    #[serde(default)]
    results: Vec<PanicPost>,
}

#[derive(Debug, Deserialize)]
struct PanicPost {
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<PanicSource>,
    #[serde(default)]
    votes: Option<PanicVotes>,
}

#[derive(Debug, Deserialize)]
struct PanicSource {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct PanicVotes {
    #[serde(default)]
    positive: u32,
}

/// CryptoPanic posts endpoint
pub struct CryptoPanicProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
    auth_token: Option<String>,
    filter: String,
    currencies: Option<String>,
    query: Option<String>,
    limit: usize,
}

impl CryptoPanicProvider {
    /// Rising news for BTC and ETH
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
            auth_token: None,
            filter: "rising".to_string(),
            currencies: Some("BTC,ETH".to_string()),
            query: None,
            limit: 5,
        }
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_currencies(mut self, currencies: Option<String>) -> Self {
        self.currencies = currencies;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    async fn posts(&self) -> Result<Vec<NewsItem>, FetchError> {
        let mut params: Vec<(&str, &str)> = vec![
            ("public", "true"),
            ("kind", "news"),
            ("filter", self.filter.as_str()),
        ];
        if let Some(currencies) = &self.currencies {
            params.push(("currencies", currencies.as_str()));
        }
        if let Some(query) = &self.query {
            params.push(("q", query.as_str()));
        }
        if let Some(token) = &self.auth_token {
            params.push(("auth_token", token.as_str()));
        }

        let response = self
            .client
            .get(endpoint(&self.base_url, "api/v1/posts/"))
            .query(&params)
            .send()
            .await?;
        let body: PanicResponse = check_status(response)?.json().await?;

        Ok(body
            .results
            .into_iter()
            .take(self.limit)
            .map(|post| NewsItem {
                title: post.title,
                source: post
                    .source
                    .map(|s| s.title)
                    .unwrap_or_else(|| "CryptoPanic".to_string()),
                url: post.url,
                importance: post.votes.unwrap_or_default().positive,
            })
            .collect())
    }
}

#[async_trait]
impl Provider<Vec<NewsItem>> for CryptoPanicProvider {
    fn name(&self) -> &str {
        "cryptopanic"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn fetch(&self) -> Result<Vec<NewsItem>, FetchError> {
        let items = self.posts().await?;
        if items.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(items)
    }
}

/// Curated headlines served when no news provider answers
#[derive(Debug, Clone)]
pub struct CuratedNews {
    items: Vec<NewsItem>,
}

impl CuratedNews {
    pub fn new(items: Vec<NewsItem>) -> Self {
        Self { items }
    }
}

impl Default for CuratedNews {
    fn default() -> Self {
        Self::new(vec![
            NewsItem::new(
                "Bitcoin maintains strength above $65,000 support level",
                "Market Update",
                25,
            ),
            NewsItem::new(
                "Global crypto adoption continues steady growth trajectory",
                "Adoption Report",
                18,
            ),
            NewsItem::new(
                "Institutional interest in digital assets reaches new highs",
                "Institutional Data",
                32,
            ),
        ])
    }
}

impl SyntheticSource<Vec<NewsItem>> for CuratedNews {
    fn synthesize(&self) -> Vec<NewsItem> {
        self.items.clone()
    }
}

// ============================================================================
// ETF headlines
// ============================================================================

/// A single ETF market insight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtfInsight {
    pub update: String,
    pub source: String,
    pub sentiment: String,
}

impl Payload for EtfInsight {
    fn normalized(self) -> Self {
        Self {
            update: normalize_whitespace(&self.update),
            ..self
        }
    }
}

/// Important CryptoPanic posts that mention ETFs
pub struct EtfProvider {
    inner: CryptoPanicProvider,
}

impl EtfProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            inner: CryptoPanicProvider::new(client, base_url, timeout)
                .with_filter("important")
                .with_currencies(None)
                .with_query("ETF")
                .with_limit(10),
        }
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.inner = self.inner.with_auth_token(token);
        self
    }
}

#[async_trait]
impl Provider<EtfInsight> for EtfProvider {
    fn name(&self) -> &str {
        "cryptopanic-etf"
    }

    fn timeout(&self) -> Option<Duration> {
        self.inner.timeout()
    }

    async fn fetch(&self) -> Result<EtfInsight, FetchError> {
        let item = self
            .inner
            .posts()
            .await?
            .into_iter()
            .find(|item| item.title.to_uppercase().contains("ETF"))
            .ok_or(FetchError::Empty)?;

        Ok(EtfInsight {
            update: item.title,
            source: "ETF Market".to_string(),
            sentiment: "Positive".to_string(),
        })
    }
}

/// Synthetic ETF insight rotated through a curated list
pub struct EtfRotation {
    updates: Vec<String>,
    state: Mutex<RotationState<String>>,
}

const ETF_SENTIMENTS: &[&str] = &["Positive", "Strong", "Bullish"];

impl EtfRotation {
    pub fn new(updates: Vec<String>, max_remember: usize) -> Self {
        Self {
            updates,
            state: Mutex::new(RotationState::new(max_remember)),
        }
    }
}

impl SyntheticSource<EtfInsight> for EtfRotation {
    fn synthesize(&self) -> EtfInsight {
        let mut rng = rand::thread_rng();
        let update = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state
                .pick(&self.updates, &mut rng)
                .unwrap_or_else(|_| "ETF markets steady as institutional flows continue".to_string())
        };
        let sentiment = ETF_SENTIMENTS.choose(&mut rng).copied().unwrap_or("Positive");

        EtfInsight {
            update,
            source: "ETF Analysis".to_string(),
            sentiment: sentiment.to_string(),
        }
    }
}
