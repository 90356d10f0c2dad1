//! Job definitions: post kinds, categories and the schedule table

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::error::{SchedulerError, SchedulerResult};

// ============================================================================
// Post kinds
// ============================================================================

/// The content a scheduled job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    GoodMorning,
    MarketOpen,
    GlobalNews,
    IndiaUpdate,
    LearningSeries,
    TechnicalSeries,
    GoodNight,
}

impl PostKind {
    /// Every kind, each of which must be scheduled
    pub const ALL: [PostKind; 7] = [
        Self::GoodMorning,
        Self::MarketOpen,
        Self::GlobalNews,
        Self::IndiaUpdate,
        Self::LearningSeries,
        Self::TechnicalSeries,
        Self::GoodNight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoodMorning => "good_morning",
            Self::MarketOpen => "market_open",
            Self::GlobalNews => "global_news",
            Self::IndiaUpdate => "india_update",
            Self::LearningSeries => "learning_series",
            Self::TechnicalSeries => "technical_series",
            Self::GoodNight => "good_night",
        }
    }

    /// Category used when a job does not name one
    pub fn default_category(&self) -> Category {
        match self {
            Self::GoodMorning => Category::Community,
            Self::MarketOpen => Category::Prices,
            Self::GlobalNews => Category::News,
            Self::IndiaUpdate => Category::Local,
            Self::LearningSeries => Category::Education,
            Self::TechnicalSeries => Category::Analysis,
            Self::GoodNight => Category::Wrap,
        }
    }

    /// Default time of day, `HH:MM`
    pub fn default_time(&self) -> &'static str {
        match self {
            Self::GoodMorning => "07:00",
            Self::MarketOpen => "09:00",
            Self::GlobalNews => "11:00",
            Self::IndiaUpdate => "13:00",
            Self::LearningSeries => "15:00",
            Self::TechnicalSeries => "17:00",
            Self::GoodNight => "21:00",
        }
    }

    /// Parse a kind from its snake_case name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message category; drives the notification policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Community,
    Prices,
    News,
    Local,
    Education,
    Analysis,
    Wrap,
    Breaking,
    System,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Prices => "prices",
            Self::News => "news",
            Self::Local => "local",
            Self::Education => "education",
            Self::Analysis => "analysis",
            Self::Wrap => "wrap",
            Self::Breaking => "breaking",
            Self::System => "system",
        }
    }

    /// Whether posts in this category should ring
    pub fn notifies(&self) -> bool {
        matches!(self, Self::Breaking | Self::Prices)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Job specs
// ============================================================================

fn default_jitter() -> u32 {
    5
}

/// A job as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    /// Time of day, `HH:MM`
    pub time: String,
    #[serde(default = "default_jitter")]
    pub jitter_minutes: u32,
    pub kind: PostKind,
    #[serde(default)]
    pub category: Option<Category>,
}

impl JobSpec {
    /// The standard job for `kind`
    pub fn for_kind(kind: PostKind) -> Self {
        Self {
            name: kind.as_str().to_string(),
            time: kind.default_time().to_string(),
            jitter_minutes: default_jitter(),
            kind,
            category: None,
        }
    }

    /// Standard daily schedule, one job per post kind
    pub fn defaults() -> Vec<Self> {
        PostKind::ALL.into_iter().map(Self::for_kind).collect()
    }

    /// Parse into an immutable table row
    pub fn parse(&self) -> SchedulerResult<ScheduledJob> {
        let base_time = NaiveTime::parse_from_str(&self.time, "%H:%M")
            .map_err(|_| SchedulerError::invalid_time(&self.name, &self.time))?;

        if self.jitter_minutes >= 720 {
            return Err(SchedulerError::InvalidJitter {
                job: self.name.clone(),
                minutes: self.jitter_minutes,
            });
        }

        Ok(ScheduledJob {
            name: self.name.clone(),
            base_time,
            jitter_minutes: self.jitter_minutes,
            kind: self.kind,
            category: self.category.unwrap_or_else(|| self.kind.default_category()),
        })
    }
}

/// One row of the schedule table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub name: String,
    pub base_time: NaiveTime,
    pub jitter_minutes: u32,
    pub kind: PostKind,
    pub category: Category,
}

/// Parse and check a full job table
///
/// Rejects malformed times, duplicate names and any post kind without a job.
pub fn parse_jobs(specs: &[JobSpec]) -> SchedulerResult<Vec<ScheduledJob>> {
    let mut names = HashSet::new();
    let mut jobs = Vec::with_capacity(specs.len());

    for spec in specs {
        if !names.insert(spec.name.as_str()) {
            return Err(SchedulerError::duplicate_job(&spec.name));
        }
        jobs.push(spec.parse()?);
    }

    for kind in PostKind::ALL {
        if !jobs.iter().any(|job| job.kind == kind) {
            return Err(SchedulerError::missing_job(kind.as_str()));
        }
    }

    Ok(jobs)
}
