//! Polling loop that fires due jobs through a [`JobHandler`]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::job::ScheduledJob;
use super::timetable::JitteredScheduler;

/// Default period between timetable checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Result of firing one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Post rendered and accepted by the channel
    Delivered,
    /// Post rendered but the channel rejected it
    DeliveryFailed(String),
    /// Nothing was published
    Skipped(String),
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::DeliveryFailed(reason) => write!(f, "delivery failed: {reason}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Produces and publishes the post for a due job
#[async_trait]
pub trait JobHandler: Send {
    async fn fire(&mut self, job: &ScheduledJob) -> JobOutcome;
}

impl JitteredScheduler {
    /// Poll the timetable against the wall clock until `shutdown` flips
    pub async fn run<H>(
        &mut self,
        handler: &mut H,
        poll_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) where
        H: JobHandler + ?Sized,
    {
        let offset = self.offset();
        self.run_with_clock(
            handler,
            poll_interval,
            shutdown,
            move || Utc::now().with_timezone(&offset),
        )
        .await;
    }

    /// Same as [`run`](Self::run) with an injected clock
    ///
    /// Jobs fire sequentially; a failing job is logged and never stops the loop.
    pub async fn run_with_clock<H, C>(
        &mut self,
        handler: &mut H,
        poll_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
        mut clock: C,
    ) where
        H: JobHandler + ?Sized,
        C: FnMut() -> DateTime<FixedOffset> + Send,
    {
        self.arm(clock());
        for entry in self.timetable() {
            tracing::info!(job = %entry.name, "Scheduled: {}", entry);
        }

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Scheduler stopping");
                        break;
                    }
                    continue;
                }
            }

            let now = clock();
            let due: Vec<ScheduledJob> = self.tick(now).into_iter().cloned().collect();

            for job in due {
                tracing::info!(job = %job.name, kind = %job.kind, "Firing job");
                match handler.fire(&job).await {
                    JobOutcome::Delivered => {
                        tracing::info!(job = %job.name, "Job delivered");
                    }
                    outcome => {
                        tracing::warn!(job = %job.name, outcome = %outcome, "Job did not deliver");
                    }
                }
            }
        }
    }
}
