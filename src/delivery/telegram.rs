//! Telegram Bot API channel
//!
//! Posts go to `sendMessage` with HTML parse mode and link previews off.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus, PublishOptions};
use crate::utils::truncate_text;

/// Telegram rejects longer messages
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub bot_token: String,
    /// Target chat: `@channelname` or a numeric id
    pub chat_id: String,
    /// API root, overridable for tests
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Lower bound of the random pause before each send
    #[serde(default = "default_min_delay")]
    pub min_send_delay_ms: u64,
    /// Upper bound of the random pause before each send
    #[serde(default = "default_max_delay")]
    pub max_send_delay_ms: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_min_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    3000
}

impl TelegramConfig {
    /// Create a new Telegram configuration
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: default_api_base(),
            timeout_secs: default_timeout(),
            min_send_delay_ms: default_min_delay(),
            max_send_delay_ms: default_max_delay(),
        }
    }

    /// Set the API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the pre-send pause range; `(0, 0)` disables it
    pub fn with_send_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.min_send_delay_ms = min_ms;
        self.max_send_delay_ms = max_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bot_token.trim().is_empty() {
            return Err("Bot token cannot be empty".to_string());
        }

        if self.chat_id.trim().is_empty() {
            return Err("Chat id cannot be empty".to_string());
        }

        url::Url::parse(&self.api_base).map_err(|e| format!("Invalid API base URL: {e}"))?;

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.min_send_delay_ms > self.max_send_delay_ms {
            return Err("Minimum send delay exceeds maximum".to_string());
        }

        Ok(())
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    disable_notification: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API channel
///
/// ```rust,ignore
/// use pulsecast::delivery::{Channel, PublishOptions, TelegramChannel, TelegramConfig};
///
/// let channel = TelegramChannel::new(TelegramConfig::new(token, "@mychannel"))?;
/// channel.publish("<b>Hello</b>", PublishOptions { silent: true }).await?;
/// ```
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel
    pub fn new(config: TelegramConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Get the target chat
    pub fn chat_id(&self) -> &str {
        &self.config.chat_id
    }

    fn send_delay(&self) -> Duration {
        let (min, max) = (self.config.min_send_delay_ms, self.config.max_send_delay_ms);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn publish(&self, text: &str, options: PublishOptions) -> ChannelResult<DeliveryStatus> {
        let delay = self.send_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let text = truncate_text(text, MAX_MESSAGE_CHARS);
        let body = SendMessage {
            chat_id: &self.config.chat_id,
            text: &text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            disable_notification: options.silent,
        };

        let response = self
            .client
            .post(self.config.send_message_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let parsed: Option<ApiResponse> = response.json().await.ok();

        match parsed {
            Some(api) if status.is_success() && api.ok => {
                tracing::debug!(chat = %self.config.chat_id, silent = options.silent, "Message sent");
                Ok(DeliveryStatus::success(self.name()))
            }
            Some(api) => {
                let reason = api
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                tracing::warn!(status = status.as_u16(), reason = %reason, "Telegram rejected message");
                Ok(DeliveryStatus::failure(self.name(), reason))
            }
            None => {
                tracing::warn!(status = status.as_u16(), "Telegram returned an unreadable response");
                Ok(DeliveryStatus::failure(
                    self.name(),
                    format!("HTTP {}", status.as_u16()),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TelegramConfig::new("123:abc", "@channel");
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!((config.min_send_delay_ms, config.max_send_delay_ms), (1000, 3000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(TelegramConfig::new("", "@c").validate().is_err());
        assert!(TelegramConfig::new("t", " ").validate().is_err());
        assert!(TelegramConfig::new("t", "@c")
            .with_api_base("not a url")
            .validate()
            .is_err());
        assert!(TelegramConfig::new("t", "@c").with_timeout(0).validate().is_err());
        assert!(TelegramConfig::new("t", "@c")
            .with_send_delay(5, 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_send_message_url() {
        let config = TelegramConfig::new("123:abc", "@c").with_api_base("http://localhost:9000/");
        assert_eq!(
            config.send_message_url(),
            "http://localhost:9000/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_payload_shape() {
        let body = SendMessage {
            chat_id: "@c",
            text: "<b>hi</b>",
            parse_mode: "HTML",
            disable_web_page_preview: true,
            disable_notification: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["disable_web_page_preview"], true);
        assert_eq!(json["disable_notification"], false);
    }

    #[test]
    fn test_zero_delay_disables_pause() {
        let channel =
            TelegramChannel::new(TelegramConfig::new("t", "@c").with_send_delay(0, 0)).unwrap();
        assert_eq!(channel.send_delay(), Duration::ZERO);
    }
}
