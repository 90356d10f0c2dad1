//! Integration tests for the HTTP providers and chains using wiremock
//!
//! Every provider of a chain points at one mock server; unmocked paths answer
//! 404, which the chain treats as a provider failure.

mod common;

use chrono::FixedOffset;
use pulsecast::config::Config;
use pulsecast::providers::{CandidateSource, MarketData, MarketFeed};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn market(config: &Config) -> MarketData {
    MarketData::from_config(
        &config.providers,
        &config.cache,
        FixedOffset::east_opt(0).unwrap(),
        config.content.catalog().etf_updates,
        config.content.max_remember,
    )
    .unwrap()
}

fn coingecko_body() -> serde_json::Value {
    json!({
        "bitcoin": { "usd": 67123.456, "usd_24h_change": 2.3456 },
        "ethereum": { "usd": 3521.1, "usd_24h_change": -1.2 },
        "solana": { "usd": 171.0 }
    })
}

fn binance_ticker(price: &str, change: &str) -> serde_json::Value {
    json!({ "symbol": "X", "lastPrice": price, "priceChangePercent": change })
}

/// The first provider in the chain answers and its data is normalized
#[tokio::test]
async fn test_coingecko_serves_prices() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(coingecko_body()))
        .mount(&server)
        .await;

    let data = market(&common::config_for(&server.uri()));
    let prices = data.prices().await;

    assert_eq!(prices.provenance.provider(), Some("coingecko"));
    let btc = prices.value.get("BTC").unwrap();
    assert_eq!(btc.price, 67123.46);
    assert_eq!(btc.change_24h, 2.35);
    assert_eq!(prices.value.get("SOL").unwrap().change_24h, 0.0);
    assert!(!prices.value.contains("DOGE"));
}

/// A failing first provider hands over to Binance, whose partial answers count
#[tokio::test]
async fn test_binance_used_after_coingecko_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(binance_ticker("68000.10", "1.50")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .and(query_param("symbol", "ETHUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(binance_ticker("3600.00", "-0.75")))
        .mount(&server)
        .await;

    let data = market(&common::config_for(&server.uri()));
    let prices = data.prices().await;

    assert_eq!(prices.provenance.provider(), Some("binance"));
    assert_eq!(prices.value.len(), 2);
    assert_eq!(prices.value.get("ETH").unwrap().change_24h, -0.75);
}

/// A provider slower than its timeout is skipped
#[tokio::test]
async fn test_slow_provider_times_out_to_paprika() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(coingecko_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    // Rank ordered listing; the second BTC is an unrelated token
    Mock::given(method("GET"))
        .and(path("/v1/tickers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "symbol": "BTC", "quotes": { "USD": { "price": 69000.0, "percent_change_24h": 0.5 } } },
            { "symbol": "ETH", "quotes": { "USD": { "price": 3400.0 } } },
            { "symbol": "BTC", "quotes": { "USD": { "price": 0.01, "percent_change_24h": 90.0 } } },
            { "symbol": "SHIB", "quotes": { "USD": { "price": 0.00002 } } }
        ])))
        .mount(&server)
        .await;

    let mut config = common::config_for(&server.uri());
    config.providers.coingecko.timeout_secs = 1;
    let data = market(&config);

    let prices = data.prices().await;
    assert_eq!(prices.provenance.provider(), Some("coinpaprika"));
    assert_eq!(prices.value.get("BTC").unwrap().price, 69000.0);
    assert_eq!(prices.value.len(), 2);
}

/// With every provider down the post still gets plausible synthetic data
#[tokio::test]
async fn test_everything_down_falls_back_to_synthetic() {
    let server = MockServer::start().await;
    let data = market(&common::config_for(&server.uri()));

    let prices = data.prices().await;
    assert!(prices.is_synthetic());
    for symbol in ["BTC", "ETH", "SOL", "BNB"] {
        assert!(prices.value.get(symbol).unwrap().price > 0.0, "{symbol} missing");
    }

    let sentiment = data.sentiment().await;
    assert!(sentiment.is_synthetic());
    assert!((45..=70).contains(&sentiment.value.value));

    let news = data.news().await;
    assert!(news.is_synthetic());
    assert!(!news.value.is_empty());

    let etf = data.etf().await;
    assert!(etf.is_synthetic());
    assert!(!etf.value.update.is_empty());

    let candidates = data.candidates().await.unwrap();
    assert!(candidates.is_synthetic());
}

/// A live answer is served from cache within its TTL
#[tokio::test]
async fn test_live_prices_cached_between_calls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(coingecko_body()))
        .expect(1)
        .mount(&server)
        .await;

    let data = market(&common::config_for(&server.uri()));
    let first = data.prices().await;
    let second = data.prices().await;

    assert_eq!(first, second);
}

/// Synthetic answers are not cached, so a recovered provider is used at once
#[tokio::test]
async fn test_recovered_provider_picked_up_immediately() {
    let server = MockServer::start().await;
    let data = market(&common::config_for(&server.uri()));

    assert!(data.sentiment().await.is_synthetic());

    Mock::given(method("GET"))
        .and(path("/fng/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "value": "72", "value_classification": "Greed" }]
        })))
        .mount(&server)
        .await;

    let sentiment = data.sentiment().await;
    assert_eq!(sentiment.provenance.provider(), Some("alternative.me"));
    assert_eq!(sentiment.value.value, 72);
    assert_eq!(sentiment.value.classification, "Greed");
}

/// Malformed payloads count as provider failures
#[tokio::test]
async fn test_malformed_fear_greed_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fng/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "value": "lots", "value_classification": "Greed" }]
        })))
        .mount(&server)
        .await;

    let data = market(&common::config_for(&server.uri()));
    assert!(data.sentiment().await.is_synthetic());
}

/// CryptoPanic feeds both the headline chain and the ETF chain
#[tokio::test]
async fn test_cryptopanic_news_and_etf() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/posts/"))
        .and(query_param("filter", "rising"))
        .and(query_param("currencies", "BTC,ETH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "title": "  Bitcoin   tops $70K  ",
                    "url": "https://example.com/btc",
                    "source": { "title": "CoinDesk" },
                    "votes": { "positive": 34 }
                },
                { "title": "Ether upgrade date set" }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/posts/"))
        .and(query_param("filter", "important"))
        .and(query_param("q", "ETF"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "title": "Exchange listing news" },
                { "title": "Spot ETF sees record inflows" }
            ]
        })))
        .mount(&server)
        .await;

    let mut config = common::config_for(&server.uri());
    config.providers.cryptopanic_token = None;
    let data = market(&config);

    let news = data.news().await;
    assert_eq!(news.provenance.provider(), Some("cryptopanic"));
    assert_eq!(news.value[0].title, "Bitcoin tops $70K");
    assert_eq!(news.value[0].source, "CoinDesk");
    assert_eq!(news.value[0].importance, 34);
    assert_eq!(news.value[1].source, "CryptoPanic");
    assert_eq!(news.value[1].importance, 0);

    let etf = data.etf().await;
    assert_eq!(etf.provenance.provider(), Some("cryptopanic-etf"));
    assert_eq!(etf.value.update, "Spot ETF sees record inflows");
}

/// The auth token is passed along when configured
#[tokio::test]
async fn test_cryptopanic_token_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/posts/"))
        .and(query_param("auth_token", "secret"))
        .and(query_param("filter", "rising"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "title": "Token-gated headline" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = common::config_for(&server.uri());
    config.providers.cryptopanic_token = Some("secret".to_string());
    let data = market(&config);

    assert_eq!(data.news().await.value[0].title, "Token-gated headline");
}

/// The probe bypasses caches and reports each chain's provenance
#[tokio::test]
async fn test_probe_reports_provenance() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(coingecko_body()))
        .expect(2)
        .mount(&server)
        .await;

    let data = market(&common::config_for(&server.uri()));
    data.prices().await;

    let reports = data.probe().await;
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[0].chain, "prices");
    assert_eq!(reports[0].providers, vec!["coingecko", "binance", "coinpaprika"]);
    assert_eq!(reports[0].provenance.provider(), Some("coingecko"));
    assert!(reports[1].provenance.is_synthetic());
}
