//! Configuration management for pulsecast
//!
//! Configuration comes from a TOML file with built-in defaults for every
//! section; a handful of environment variables override the file so secrets
//! can stay out of it.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::breaking::{GateConfig, DEFAULT_KEYWORDS};
use crate::content::{Catalog, Lesson};
use crate::delivery::TelegramConfig;
use crate::engine::EngineOptions;
use crate::poller::PollerConfig;
use crate::scheduler::{parse_jobs, parse_utc_offset, JobSpec};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Job table and clock
    pub schedule: ScheduleConfig,

    /// Market data cache lifetimes
    pub cache: CacheConfig,

    /// Breaking news monitor
    pub breaking: BreakingConfig,

    /// Upstream data providers
    pub providers: ProvidersConfig,

    /// Delivery channel
    pub channel: ChannelConfig,

    /// Content rotation and catalogs
    pub content: ContentConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Offset all job times are read in, `+HH:MM`
    pub utc_offset: String,

    /// Seconds between scheduler ticks
    pub poll_interval_secs: u64,

    /// Scheduled jobs, one per post kind
    pub jobs: Vec<JobSpec>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset: String::from("+05:30"),
            poll_interval_secs: 30,
            jobs: JobSpec::defaults(),
        }
    }
}

/// Cache lifetimes in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub prices_ttl_secs: u64,
    pub sentiment_ttl_secs: u64,
    pub news_ttl_secs: u64,
    pub etf_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prices_ttl_secs: 60,
            sentiment_ttl_secs: 300,
            news_ttl_secs: 120,
            etf_ttl_secs: 600,
        }
    }
}

/// Breaking news monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakingConfig {
    /// Set to false to run the scheduler alone
    pub enabled: bool,

    /// Minimum importance for an alert
    pub importance_threshold: u32,

    /// Importance at which an alert is labelled important
    pub urgent_threshold: u32,

    /// Quiet period after an alert
    pub cooldown_secs: u64,

    /// Normal gap between polls
    pub poll_interval_secs: u64,

    /// Gap after a failed fetch
    pub error_backoff_secs: u64,

    /// Title keywords that mark an item as breaking
    pub keywords: Vec<String>,
}

impl Default for BreakingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            importance_threshold: 21,
            urgent_threshold: 51,
            cooldown_secs: 2 * 60 * 60,
            poll_interval_secs: 30 * 60,
            error_backoff_secs: 5 * 60,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl BreakingConfig {
    /// Gate thresholds
    pub fn gate(&self) -> GateConfig {
        GateConfig {
            threshold: self.importance_threshold,
            urgent_threshold: self.urgent_threshold,
            keywords: self.keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Poller timing
    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
        }
    }
}

/// One upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Base URL, without the API path
    pub url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Endpoint {
    fn new(url: &str, timeout_secs: u64) -> Self {
        Self {
            url: url.to_string(),
            timeout_secs,
        }
    }

    /// Get timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Upstream data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// User agent sent to every provider
    pub user_agent: String,

    pub coingecko: Endpoint,
    pub binance: Endpoint,
    pub coinpaprika: Endpoint,
    pub fear_greed: Endpoint,
    pub cryptopanic: Endpoint,

    /// CryptoPanic auth token; the public feed is used without one
    pub cryptopanic_token: Option<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("pulsecast/{}", env!("CARGO_PKG_VERSION")),
            coingecko: Endpoint::new("https://api.coingecko.com", 15),
            binance: Endpoint::new("https://api.binance.com", 5),
            coinpaprika: Endpoint::new("https://api.coinpaprika.com", 10),
            fear_greed: Endpoint::new("https://api.alternative.me", 5),
            cryptopanic: Endpoint::new("https://cryptopanic.com", 10),
            cryptopanic_token: None,
        }
    }
}

impl ProvidersConfig {
    fn endpoints(&self) -> [(&'static str, &Endpoint); 5] {
        [
            ("coingecko", &self.coingecko),
            ("binance", &self.binance),
            ("coinpaprika", &self.coinpaprika),
            ("fear_greed", &self.fear_greed),
            ("cryptopanic", &self.cryptopanic),
        ]
    }
}

/// Delivery channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Telegram bot token
    pub bot_token: String,

    /// Target channel, `@name` or numeric id
    pub channel_id: String,

    /// Telegram API root
    pub api_base: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Random pause before each send
    pub min_send_delay_ms: u64,
    pub max_send_delay_ms: u64,

    /// Post the welcome message on startup
    pub send_welcome: bool,

    /// Display name used in the welcome and night posts
    pub channel_name: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            api_base: String::from("https://api.telegram.org"),
            timeout_secs: 10,
            min_send_delay_ms: 1000,
            max_send_delay_ms: 3000,
            send_welcome: true,
            channel_name: String::from("PULSECAST"),
        }
    }
}

impl ChannelConfig {
    /// Whether both credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.channel_id.trim().is_empty()
    }

    /// Telegram channel settings
    pub fn telegram(&self) -> TelegramConfig {
        TelegramConfig::new(&self.bot_token, &self.channel_id)
            .with_api_base(&self.api_base)
            .with_timeout(self.timeout_secs)
            .with_send_delay(self.min_send_delay_ms, self.max_send_delay_ms)
    }
}

/// Content selection configuration
///
/// Catalog lists left out of the file fall back to the built-in ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Recent picks each rotating catalog avoids
    pub max_remember: usize,

    /// First day of the learning series
    pub learning_start_day: usize,

    /// First day of the technical series
    pub technical_start_day: usize,

    pub greetings: Option<Vec<String>>,
    pub quotes: Option<Vec<String>>,
    pub night_messages: Option<Vec<String>>,
    pub reflections: Option<Vec<String>>,
    pub india_updates: Option<Vec<String>>,
    pub etf_updates: Option<Vec<String>>,
    pub learning: Option<Vec<Lesson>>,
    pub technical: Option<Vec<Lesson>>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_remember: 3,
            learning_start_day: 1,
            technical_start_day: 1,
            greetings: None,
            quotes: None,
            night_messages: None,
            reflections: None,
            india_updates: None,
            etf_updates: None,
            learning: None,
            technical: None,
        }
    }
}

impl ContentConfig {
    /// Built-in catalog with configured lists swapped in
    pub fn catalog(&self) -> Catalog {
        let builtin = Catalog::builtin();
        Catalog {
            greetings: self.greetings.clone().unwrap_or(builtin.greetings),
            quotes: self.quotes.clone().unwrap_or(builtin.quotes),
            night_messages: self.night_messages.clone().unwrap_or(builtin.night_messages),
            reflections: self.reflections.clone().unwrap_or(builtin.reflections),
            india_updates: self.india_updates.clone().unwrap_or(builtin.india_updates),
            etf_updates: self.etf_updates.clone().unwrap_or(builtin.etf_updates),
            learning: self.learning.clone().unwrap_or(builtin.learning),
            technical: self.technical.clone().unwrap_or(builtin.technical),
        }
    }

    /// Engine tunables
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_remember: self.max_remember,
            learning_start_day: self.learning_start_day,
            technical_start_day: self.technical_start_day,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` (or defaults) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Some(token) = env_var(&["PULSECAST_BOT_TOKEN", "BOT_TOKEN"]) {
            self.channel.bot_token = token;
        }

        if let Some(channel) = env_var(&["PULSECAST_CHANNEL_ID", "CHANNEL_ID"]) {
            self.channel.channel_id = channel;
        }

        if let Some(offset) = env_var(&["PULSECAST_UTC_OFFSET"]) {
            self.schedule.utc_offset = offset;
        }

        if let Some(level) = env_var(&["PULSECAST_LOG_LEVEL"]) {
            self.logging.level = level;
        }

        if let Some(format) = env_var(&["PULSECAST_LOG_FORMAT"]) {
            self.logging.format = format;
        }

        if let Some(token) = env_var(&["CRYPTOPANIC_TOKEN"]) {
            self.providers.cryptopanic_token = Some(token);
        }
    }

    /// Validate configuration values
    ///
    /// Credentials are only required when posts will really be sent.
    pub fn validate(&self, require_credentials: bool) -> Result<()> {
        self.utc_offset()?;
        parse_jobs(&self.schedule.jobs).context("Invalid job table")?;

        if self.schedule.poll_interval_secs == 0 {
            anyhow::bail!("schedule.poll_interval_secs must be greater than 0");
        }

        for (name, endpoint) in self.providers.endpoints() {
            url::Url::parse(&endpoint.url)
                .with_context(|| format!("providers.{name}.url is not a valid URL"))?;
            if endpoint.timeout_secs == 0 {
                anyhow::bail!("providers.{name}.timeout_secs must be greater than 0");
            }
        }

        if self.breaking.importance_threshold > self.breaking.urgent_threshold {
            anyhow::bail!("breaking.importance_threshold exceeds breaking.urgent_threshold");
        }

        if self.breaking.poll_interval_secs == 0
            || self.breaking.cooldown_secs == 0
            || self.breaking.error_backoff_secs == 0
        {
            anyhow::bail!("breaking intervals must be greater than 0");
        }

        if self.content.max_remember == 0 {
            anyhow::bail!("content.max_remember must be greater than 0");
        }

        if self.content.learning_start_day == 0 || self.content.technical_start_day == 0 {
            anyhow::bail!("series start days are 1-based");
        }

        self.content
            .catalog()
            .validate()
            .context("Invalid content catalog")?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        if require_credentials {
            if !self.channel.has_credentials() {
                anyhow::bail!("Bot token and channel id are required (set PULSECAST_BOT_TOKEN and PULSECAST_CHANNEL_ID)");
            }
            self.channel
                .telegram()
                .validate()
                .map_err(anyhow::Error::msg)
                .context("Invalid channel configuration")?;
        }

        Ok(())
    }

    /// Parsed schedule offset
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.schedule.utc_offset).context("Invalid schedule.utc_offset")
    }

    /// Get scheduler tick interval as Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.poll_interval_secs)
    }
}
