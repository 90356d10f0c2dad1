//! pulsecast - Scheduled crypto market broadcaster
//!
//! Publishes a fixed daily schedule of posts to a Telegram channel and, in
//! parallel, watches for breaking news. Upstream data comes from free public
//! APIs that fail often, so every data kind sits behind a provider chain with
//! a synthetic fallback: a post always goes out, and the provenance of its
//! data is tracked internally.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`cache`] - TTL cache keyed by data kind
//! - [`providers`] - Upstream providers, provider chains and synthetic fallbacks
//! - [`content`] - Catalog rotation and lesson series cursors
//! - [`breaking`] - Fingerprint deduplication for breaking news
//! - [`scheduler`] - Jittered daily job table and its polling loop
//! - [`poller`] - Background breaking-news monitor
//! - [`render`] - Handlebars message templates
//! - [`delivery`] - Delivery channels (Telegram, log)
//! - [`engine`] - Content engine wiring the above into scheduled posts
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use pulsecast::config::Config;
//! use pulsecast::providers::{MarketData, MarketFeed};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let catalog = config.content.catalog();
//!     let market = MarketData::from_config(
//!         &config.providers,
//!         &config.cache,
//!         config.utc_offset()?,
//!         catalog.etf_updates,
//!         config.content.max_remember,
//!     )?;
//!     let prices = market.prices().await;
//!     println!("{} assets ({})", prices.value.len(), prices.provenance);
//!     Ok(())
//! }
//! ```

pub mod breaking;
pub mod cache;
pub mod config;
pub mod content;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod poller;
pub mod providers;
pub mod render;
pub mod scheduler;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::breaking::{Decision, FingerprintGate, Severity};
    pub use crate::cache::TtlCache;
    pub use crate::config::Config;
    pub use crate::content::{ContentRotator, RotationState, SeriesCursor};
    pub use crate::delivery::{Channel, DeliveryStatus, LogChannel, TelegramChannel};
    pub use crate::engine::ContentEngine;
    pub use crate::error::{Error, Result};
    pub use crate::poller::BackgroundPoller;
    pub use crate::providers::{MarketData, MarketFeed, Provenance, ProviderChain, Sourced};
    pub use crate::render::Composer;
    pub use crate::scheduler::{JitteredScheduler, PostKind};
}
