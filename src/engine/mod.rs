//! Content engine: turns a due job into a published post
//!
//! The engine owns all per-job selection state (one rotation history per
//! catalog, one cursor per lesson series, and the RNG), pulls market data
//! through a [`MarketFeed`], renders with the [`Composer`] and publishes
//! through a [`Channel`].

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

use crate::content::{Catalog, ContentError, ContentResult, RotationState, SeriesCursor};
use crate::delivery::{deliver, Channel, DeliveryStatus};
use crate::error::Result;
use crate::providers::MarketFeed;
use crate::render::Composer;
use crate::scheduler::{Category, JobHandler, JobOutcome, PostKind, ScheduledJob};

/// Tunables for content selection
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// How many recent picks each rotating catalog avoids
    pub max_remember: usize,
    /// First day of the learning series
    pub learning_start_day: usize,
    /// First day of the technical series
    pub technical_start_day: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_remember: 3,
            learning_start_day: 1,
            technical_start_day: 1,
        }
    }
}

/// Scheduled-post producer
pub struct ContentEngine {
    feed: Arc<dyn MarketFeed>,
    composer: Arc<Composer>,
    channel: Arc<dyn Channel>,
    catalog: Catalog,
    rng: ChaCha8Rng,
    greetings: RotationState<String>,
    quotes: RotationState<String>,
    night_messages: RotationState<String>,
    reflections: RotationState<String>,
    india_updates: RotationState<String>,
    learning: SeriesCursor,
    technical: SeriesCursor,
}

impl ContentEngine {
    /// Create an engine; fails if any catalog is empty
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        composer: Arc<Composer>,
        channel: Arc<dyn Channel>,
        catalog: Catalog,
        options: EngineOptions,
    ) -> ContentResult<Self> {
        catalog.validate()?;

        let learning = SeriesCursor::new(catalog.learning.len(), options.learning_start_day)?;
        let technical = SeriesCursor::new(catalog.technical.len(), options.technical_start_day)?;

        Ok(Self {
            feed,
            composer,
            channel,
            catalog,
            rng: ChaCha8Rng::from_entropy(),
            greetings: RotationState::new(options.max_remember),
            quotes: RotationState::new(options.max_remember),
            night_messages: RotationState::new(options.max_remember),
            reflections: RotationState::new(options.max_remember),
            india_updates: RotationState::new(options.max_remember),
            learning,
            technical,
        })
    }

    /// Replace the RNG, for reproducible selection
    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Day the learning series will show next
    pub fn learning_day(&self) -> usize {
        self.learning.day_index()
    }

    /// Day the technical series will show next
    pub fn technical_day(&self) -> usize {
        self.technical.day_index()
    }

    /// Render the startup announcement
    pub fn welcome(&self) -> Result<String> {
        Ok(self.composer.welcome()?)
    }

    /// Render the post for `kind`, advancing rotation and series state
    pub async fn compose(&mut self, kind: PostKind) -> Result<String> {
        let text = match kind {
            PostKind::GoodMorning => {
                let greeting = self.greetings.pick(&self.catalog.greetings, &mut self.rng)?;
                let quote = self.quotes.pick(&self.catalog.quotes, &mut self.rng)?;
                self.composer.good_morning(&greeting, &quote)?
            }
            PostKind::MarketOpen => {
                let prices = self.feed.prices().await;
                let sentiment = self.feed.sentiment().await;
                tracing::info!(
                    prices = %prices.provenance,
                    sentiment = %sentiment.provenance,
                    "Market data for market_open"
                );
                self.composer.market_open(&prices.value, &sentiment.value)?
            }
            PostKind::GlobalNews => {
                let news = self.feed.news().await;
                let etf = self.feed.etf().await;
                tracing::info!(
                    news = %news.provenance,
                    etf = %etf.provenance,
                    "Market data for global_news"
                );
                let headline = news
                    .value
                    .first()
                    .ok_or_else(|| ContentError::EmptyCatalog("news".to_string()))?;
                self.composer.global_news(headline, &etf.value)?
            }
            PostKind::IndiaUpdate => {
                let update = self.india_updates.pick(&self.catalog.india_updates, &mut self.rng)?;
                self.composer.india_update(&update)?
            }
            PostKind::LearningSeries => {
                let lesson = self.learning.next(&self.catalog.learning)?;
                self.composer.learning(lesson)?
            }
            PostKind::TechnicalSeries => {
                let lesson = self.technical.next(&self.catalog.technical)?;
                self.composer.technical(lesson)?
            }
            PostKind::GoodNight => {
                let message = self
                    .night_messages
                    .pick(&self.catalog.night_messages, &mut self.rng)?;
                let reflection = self.reflections.pick(&self.catalog.reflections, &mut self.rng)?;
                let prices = self.feed.prices().await;
                self.composer
                    .good_night(&message, Some(&prices.value), &reflection)?
            }
        };

        Ok(text)
    }

    /// Publish `text` under `category`'s notification policy
    pub async fn publish(&self, text: &str, category: Category) -> DeliveryStatus {
        deliver(self.channel.as_ref(), text, category).await
    }
}

#[async_trait]
impl JobHandler for ContentEngine {
    async fn fire(&mut self, job: &ScheduledJob) -> JobOutcome {
        let text = match self.compose(job.kind).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(job = %job.name, error = %e, "Failed to compose post");
                return JobOutcome::Skipped(e.to_string());
            }
        };

        let status = self.publish(&text, job.category).await;
        if status.success {
            JobOutcome::Delivered
        } else {
            JobOutcome::DeliveryFailed(status.message.unwrap_or_else(|| "unknown".to_string()))
        }
    }
}
