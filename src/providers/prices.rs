//! Spot price providers and the synthetic price baseline

use super::{check_status, endpoint, FetchError, Payload, Provider, SyntheticSource, PRICE_DECIMALS};
use crate::utils::round_to;
use async_trait::async_trait;
use futures::future::join_all;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// An asset the price chain tracks and its identifiers on each upstream
#[derive(Debug, Clone, Copy)]
pub struct Asset {
    pub symbol: &'static str,
    pub coingecko_id: &'static str,
    pub binance_pair: &'static str,
}

/// Assets quoted in market posts, in display order
pub const TRACKED_ASSETS: &[Asset] = &[
    Asset { symbol: "BTC", coingecko_id: "bitcoin", binance_pair: "BTCUSDT" },
    Asset { symbol: "ETH", coingecko_id: "ethereum", binance_pair: "ETHUSDT" },
    Asset { symbol: "SOL", coingecko_id: "solana", binance_pair: "SOLUSDT" },
    Asset { symbol: "BNB", coingecko_id: "binancecoin", binance_pair: "BNBUSDT" },
    Asset { symbol: "XRP", coingecko_id: "ripple", binance_pair: "XRPUSDT" },
    Asset { symbol: "ADA", coingecko_id: "cardano", binance_pair: "ADAUSDT" },
    Asset { symbol: "DOT", coingecko_id: "polkadot", binance_pair: "DOTUSDT" },
    Asset { symbol: "DOGE", coingecko_id: "dogecoin", binance_pair: "DOGEUSDT" },
];

/// USD price and 24h percentage change for one asset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub change_24h: f64,
}

/// Quotes keyed by ticker symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBoard(BTreeMap<String, PriceQuote>);

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, quote: PriceQuote) {
        self.0.insert(symbol.into(), quote);
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceQuote> {
        self.0.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PriceQuote)> {
        self.0.iter()
    }

    /// Quotes in [`TRACKED_ASSETS`] order, skipping missing symbols
    pub fn ordered(&self) -> Vec<(&'static str, PriceQuote)> {
        TRACKED_ASSETS
            .iter()
            .filter_map(|asset| self.get(asset.symbol).map(|q| (asset.symbol, *q)))
            .collect()
    }
}

impl FromIterator<(String, PriceQuote)> for PriceBoard {
    fn from_iter<I: IntoIterator<Item = (String, PriceQuote)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Payload for PriceBoard {
    fn normalized(self) -> Self {
        self.0
            .into_iter()
            .map(|(symbol, quote)| {
                (
                    symbol,
                    PriceQuote {
                        price: round_to(quote.price, PRICE_DECIMALS),
                        change_24h: round_to(quote.change_24h, PRICE_DECIMALS),
                    },
                )
            })
            .collect()
    }
}

// ============================================================================
// CoinGecko
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoinGeckoQuote {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// CoinGecko `simple/price` endpoint
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl CoinGeckoProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Provider<PriceBoard> for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn fetch(&self) -> Result<PriceBoard, FetchError> {
        let ids = TRACKED_ASSETS
            .iter()
            .map(|a| a.coingecko_id)
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .get(endpoint(&self.base_url, "api/v3/simple/price"))
            .query(&[
                ("ids", ids.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ])
            .send()
            .await?;
        let body: HashMap<String, CoinGeckoQuote> = check_status(response)?.json().await?;

        let board: PriceBoard = TRACKED_ASSETS
            .iter()
            .filter_map(|asset| {
                let quote = body.get(asset.coingecko_id)?;
                Some((
                    asset.symbol.to_string(),
                    PriceQuote {
                        price: quote.usd?,
                        change_24h: quote.usd_24h_change.unwrap_or(0.0),
                    },
                ))
            })
            .collect();

        if board.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(board)
    }
}

// ============================================================================
// Binance
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker {
    last_price: String,
    price_change_percent: String,
}

/// Binance 24h ticker, one request per trading pair issued concurrently
pub struct BinanceProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BinanceProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    async fn fetch_pair(&self, asset: &Asset) -> Result<PriceQuote, FetchError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "api/v3/ticker/24hr"))
            .query(&[("symbol", asset.binance_pair)])
            .send()
            .await?;
        let ticker: BinanceTicker = check_status(response)?.json().await?;

        let price = ticker
            .last_price
            .parse::<f64>()
            .map_err(|e| FetchError::Decode(format!("lastPrice: {e}")))?;
        let change_24h = ticker
            .price_change_percent
            .parse::<f64>()
            .map_err(|e| FetchError::Decode(format!("priceChangePercent: {e}")))?;

        Ok(PriceQuote { price, change_24h })
    }
}

#[async_trait]
impl Provider<PriceBoard> for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn fetch(&self) -> Result<PriceBoard, FetchError> {
        let results = join_all(TRACKED_ASSETS.iter().map(|asset| self.fetch_pair(asset))).await;

        let mut board = PriceBoard::new();
        for (asset, result) in TRACKED_ASSETS.iter().zip(results) {
            match result {
                Ok(quote) => board.insert(asset.symbol, quote),
                Err(e) => {
                    tracing::debug!(pair = %asset.binance_pair, error = %e, "Binance pair failed");
                }
            }
        }

        if board.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(board)
    }
}

// ============================================================================
// CoinPaprika
// ============================================================================

#[derive(Debug, Deserialize)]
struct PaprikaTicker {
    symbol: String,
    #[serde(default)]
    quotes: HashMap<String, PaprikaQuote>,
}

#[derive(Debug, Deserialize)]
struct PaprikaQuote {
    price: f64,
    #[serde(default)]
    percent_change_24h: Option<f64>,
}

/// CoinPaprika ticker listing
pub struct CoinPaprikaProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl CoinPaprikaProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Provider<PriceBoard> for CoinPaprikaProvider {
    fn name(&self) -> &str {
        "coinpaprika"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn fetch(&self) -> Result<PriceBoard, FetchError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "v1/tickers"))
            .send()
            .await?;
        let tickers: Vec<PaprikaTicker> = check_status(response)?.json().await?;

        let mut board = PriceBoard::new();
        // Listing is rank ordered; several coins share a symbol, keep the top one
        for ticker in tickers {
            let tracked = TRACKED_ASSETS.iter().any(|a| a.symbol == ticker.symbol);
            if !tracked || board.contains(&ticker.symbol) {
                continue;
            }
            if let Some(usd) = ticker.quotes.get("USD") {
                board.insert(
                    ticker.symbol,
                    PriceQuote {
                        price: usd.price,
                        change_24h: usd.percent_change_24h.unwrap_or(0.0),
                    },
                );
            }
        }

        if board.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(board)
    }
}

// ============================================================================
// Synthetic fallback
// ============================================================================

/// Baseline for one synthetic quote
#[derive(Debug, Clone)]
pub struct BaselineQuote {
    pub symbol: &'static str,
    pub price: f64,
    pub price_jitter: f64,
    pub change_min: f64,
    pub change_max: f64,
}

/// Synthetic price generator: fixed baselines plus bounded jitter
#[derive(Debug, Clone)]
pub struct PriceBaseline {
    quotes: Vec<BaselineQuote>,
}

impl PriceBaseline {
    pub fn new(quotes: Vec<BaselineQuote>) -> Self {
        Self { quotes }
    }

    pub fn quotes(&self) -> &[BaselineQuote] {
        &self.quotes
    }

    /// Draw a board from the given RNG
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PriceBoard {
        self.quotes
            .iter()
            .map(|b| {
                let price = b.price + rng.gen_range(-b.price_jitter..=b.price_jitter);
                let change_24h = rng.gen_range(b.change_min..=b.change_max);
                (b.symbol.to_string(), PriceQuote { price, change_24h })
            })
            .collect()
    }
}

impl Default for PriceBaseline {
    fn default() -> Self {
        Self::new(vec![
            BaselineQuote { symbol: "BTC", price: 65_000.0, price_jitter: 500.0, change_min: -3.0, change_max: 5.0 },
            BaselineQuote { symbol: "ETH", price: 3_500.0, price_jitter: 50.0, change_min: -3.0, change_max: 5.0 },
            BaselineQuote { symbol: "SOL", price: 180.0, price_jitter: 5.0, change_min: -5.0, change_max: 8.0 },
            BaselineQuote { symbol: "BNB", price: 580.0, price_jitter: 10.0, change_min: -2.0, change_max: 4.0 },
        ])
    }
}

impl SyntheticSource<PriceBoard> for PriceBaseline {
    fn synthesize(&self) -> PriceBoard {
        self.sample(&mut rand::thread_rng())
    }
}
