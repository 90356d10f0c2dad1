//! Background breaking-news poller
//!
//! Runs alongside the scheduler. Each tick fetches news candidates, passes the
//! top live candidate through the [`FingerprintGate`] and, when the gate
//! emits, renders and publishes an alert. The next sleep depends on what
//! happened:
//!
//! | outcome                    | next sleep      |
//! |----------------------------|-----------------|
//! | alert emitted              | cooldown (2 h)  |
//! | suppressed / no candidate  | interval (30 m) |
//! | fetch failed               | backoff (5 m)   |

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::breaking::{BreakingNews, Decision, FingerprintGate, SuppressReason};
use crate::delivery::{deliver, Channel};
use crate::providers::CandidateSource;
use crate::render::Composer;
use crate::scheduler::Category;

/// Poller timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub cooldown: Duration,
    pub error_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            cooldown: Duration::from_secs(2 * 60 * 60),
            error_backoff: Duration::from_secs(5 * 60),
        }
    }
}

/// What one poll did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The gate emitted; `delivered` reports the channel result
    Emitted { news: BreakingNews, delivered: bool },
    /// The gate suppressed the top candidate
    Suppressed(SuppressReason),
    /// Nothing live to consider
    NoCandidate,
    /// Fetching or rendering failed
    Failed(String),
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emitted { news, delivered } => {
                write!(f, "emitted {} (delivered: {delivered})", news.severity)
            }
            Self::Suppressed(reason) => write!(f, "suppressed: {reason}"),
            Self::NoCandidate => write!(f, "no candidate"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Periodic breaking-news check
pub struct BackgroundPoller {
    source: Arc<dyn CandidateSource>,
    gate: Arc<FingerprintGate>,
    composer: Arc<Composer>,
    channel: Arc<dyn Channel>,
    config: PollerConfig,
}

impl BackgroundPoller {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        gate: Arc<FingerprintGate>,
        composer: Arc<Composer>,
        channel: Arc<dyn Channel>,
        config: PollerConfig,
    ) -> Self {
        Self {
            source,
            gate,
            composer,
            channel,
            config,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Run one poll
    pub async fn tick(&self) -> PollOutcome {
        let sourced = match self.source.candidates().await {
            Ok(sourced) => sourced,
            Err(e) => {
                tracing::warn!(error = %e, "Breaking news fetch failed");
                return PollOutcome::Failed(e.to_string());
            }
        };

        if sourced.is_synthetic() {
            tracing::debug!("Only synthetic news available, nothing to announce");
            return PollOutcome::NoCandidate;
        }

        let Some(candidate) = sourced.value.first() else {
            return PollOutcome::NoCandidate;
        };

        let news = match self.gate.admit(candidate) {
            Decision::Suppressed(reason) => {
                tracing::debug!(reason = %reason, title = %candidate.title, "Candidate suppressed");
                return PollOutcome::Suppressed(reason);
            }
            Decision::Emitted(news) => news,
        };

        let text = match self.composer.breaking(&news) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render breaking news");
                return PollOutcome::Failed(e.to_string());
            }
        };

        let status = deliver(self.channel.as_ref(), &text, Category::Breaking).await;
        if status.success {
            tracing::info!(severity = %news.severity, title = %news.title, "Breaking news posted");
        } else {
            tracing::warn!(status = %status, "Breaking news delivery failed");
        }

        PollOutcome::Emitted {
            news,
            delivered: status.success,
        }
    }

    /// Sleep to take after `outcome`
    ///
    /// An emission starts the cooldown even when delivery failed, since the
    /// gate has already recorded the fingerprint.
    pub fn delay_after(&self, outcome: &PollOutcome) -> Duration {
        match outcome {
            PollOutcome::Emitted { .. } => self.config.cooldown,
            PollOutcome::Suppressed(_) | PollOutcome::NoCandidate => self.config.interval,
            PollOutcome::Failed(_) => self.config.error_backoff,
        }
    }

    /// Poll until `shutdown` flips
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            cooldown_secs = self.config.cooldown.as_secs(),
            "Breaking news monitor started"
        );

        loop {
            let outcome = self.tick().await;
            let delay = self.delay_after(&outcome);
            tracing::debug!(outcome = %outcome, next_secs = delay.as_secs(), "Poll complete");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Breaking news monitor stopping");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaking::GateConfig;
    use crate::delivery::{ChannelResult, DeliveryStatus, PublishOptions};
    use crate::providers::{FetchError, NewsItem, Sourced};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Feed {
        Live(Vec<NewsItem>),
        Synthetic(Vec<NewsItem>),
        Broken,
        /// One live batch per poll, in order
        Sequence(Mutex<VecDeque<Vec<NewsItem>>>),
    }

    #[async_trait]
    impl CandidateSource for Feed {
        async fn candidates(&self) -> Result<Sourced<Vec<NewsItem>>, FetchError> {
            match self {
                Feed::Live(items) => Ok(Sourced::live("stub", items.clone())),
                Feed::Synthetic(items) => Ok(Sourced::synthetic(items.clone())),
                Feed::Broken => Err(FetchError::Decode("bad json".to_string())),
                Feed::Sequence(batches) => {
                    let batch = batches.lock().unwrap().pop_front().unwrap_or_default();
                    Ok(Sourced::live("stub", batch))
                }
            }
        }
    }

    #[derive(Default)]
    struct Captured {
        posts: Mutex<Vec<(String, bool)>>,
    }

    #[async_trait]
    impl Channel for Captured {
        fn name(&self) -> &str {
            "captured"
        }

        async fn publish(&self, text: &str, options: PublishOptions) -> ChannelResult<DeliveryStatus> {
            self.posts.lock().unwrap().push((text.to_string(), options.silent));
            Ok(DeliveryStatus::success("captured"))
        }
    }

    fn poller(feed: Feed, channel: Arc<Captured>) -> BackgroundPoller {
        BackgroundPoller::new(
            Arc::new(feed),
            Arc::new(FingerprintGate::new(GateConfig::default())),
            Arc::new(Composer::new("TEST").unwrap()),
            channel,
            PollerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_emission_publishes_loudly_and_cools_down() {
        let channel = Arc::new(Captured::default());
        let poller = poller(
            Feed::Live(vec![NewsItem::new("Urgent: exchange paused", "Wire", 40)]),
            Arc::clone(&channel),
        );

        let outcome = poller.tick().await;
        assert!(matches!(outcome, PollOutcome::Emitted { delivered: true, .. }));
        assert_eq!(poller.delay_after(&outcome), Duration::from_secs(7200));

        let posts = channel.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].0.starts_with("🚨 BREAKING NEWS"));
        assert!(!posts[0].1, "breaking news rings");
    }

    #[tokio::test]
    async fn test_repeat_poll_is_suppressed() {
        let channel = Arc::new(Captured::default());
        let poller = poller(
            Feed::Live(vec![NewsItem::new("ETF approved", "Wire", 60)]),
            Arc::clone(&channel),
        );

        poller.tick().await;
        let second = poller.tick().await;

        assert_eq!(second, PollOutcome::Suppressed(SuppressReason::Duplicate));
        assert_eq!(poller.delay_after(&second), Duration::from_secs(1800));
        assert_eq!(channel.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_synthetic_news_never_announced() {
        let channel = Arc::new(Captured::default());
        let poller = poller(
            Feed::Synthetic(vec![NewsItem::new("Curated headline", "Desk", 99)]),
            Arc::clone(&channel),
        );

        let outcome = poller.tick().await;
        assert_eq!(outcome, PollOutcome::NoCandidate);
        assert!(poller.gate.last_fingerprint().is_none());
        assert!(channel.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_backs_off() {
        let poller = poller(Feed::Broken, Arc::new(Captured::default()));
        let outcome = poller.tick().await;
        assert!(matches!(outcome, PollOutcome::Failed(_)));
        assert_eq!(poller.delay_after(&outcome), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_empty_live_feed_is_no_candidate() {
        let poller = poller(Feed::Live(Vec::new()), Arc::new(Captured::default()));
        assert_eq!(poller.tick().await, PollOutcome::NoCandidate);
    }

    #[tokio::test]
    async fn test_low_score_is_suppressed() {
        let poller = poller(
            Feed::Live(vec![NewsItem::new("Quiet day", "Wire", 3)]),
            Arc::new(Captured::default()),
        );
        assert_eq!(
            poller.tick().await,
            PollOutcome::Suppressed(SuppressReason::BelowThreshold)
        );
    }

    #[tokio::test]
    async fn test_repeated_quiet_headline_waits_for_a_loud_one() {
        let quiet = NewsItem::new("Testnet fork scheduled", "Wire", 8);
        let loud = NewsItem::new("Regulator sues top exchange", "Wire", 65);

        let mut batches: VecDeque<Vec<NewsItem>> = (0..5).map(|_| vec![quiet.clone()]).collect();
        batches.push_back(vec![loud.clone()]);

        let channel = Arc::new(Captured::default());
        let poller = poller(Feed::Sequence(Mutex::new(batches)), Arc::clone(&channel));

        for _ in 0..5 {
            let outcome = poller.tick().await;
            assert_eq!(outcome, PollOutcome::Suppressed(SuppressReason::BelowThreshold));
            assert_eq!(poller.delay_after(&outcome), Duration::from_secs(1800));
            assert!(poller.gate.last_fingerprint().is_none());
        }
        assert!(channel.posts.lock().unwrap().is_empty());

        let outcome = poller.tick().await;
        match &outcome {
            PollOutcome::Emitted { news, delivered } => {
                assert!(delivered);
                assert_eq!(news.title, loud.title);
            }
            other => panic!("expected emission, got {other:?}"),
        }
        assert_eq!(channel.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let poller = poller(Feed::Broken, Arc::new(Captured::default()));
        let (tx, rx) = watch::channel(false);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            tx.send(true).unwrap();
        });

        poller.run(rx).await;
        stopper.await.unwrap();
    }
}
