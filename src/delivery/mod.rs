//! Delivery channels for publishing rendered posts
//!
//! A [`Channel`] takes finished message text and reports the outcome as a
//! [`DeliveryStatus`]. Channels never retry: a failed post is logged by the
//! caller and the next scheduled post goes out as usual.

pub mod log;
pub mod telegram;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use self::log::LogChannel;
pub use telegram::{TelegramChannel, TelegramConfig};

use crate::scheduler::Category;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

/// Per-message delivery options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Deliver without a notification sound
    pub silent: bool,
}

impl PublishOptions {
    /// Options following the notification policy for `category`
    pub fn for_category(category: Category) -> Self {
        Self {
            silent: !category.notifies(),
        }
    }
}

/// Response from publishing a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the message was accepted
    pub success: bool,
    /// Channel that delivered (or failed to deliver) the message
    pub channel: String,
    /// Optional detail about the delivery
    pub message: Option<String>,
    /// Timestamp of delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a successful delivery status with a message
    pub fn success_with_message(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(channel)
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// A destination for rendered posts
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Publish one message
    ///
    /// Upstream rejections come back as `Ok` with a failure status; `Err` is
    /// reserved for problems building or sending the request.
    async fn publish(&self, text: &str, options: PublishOptions) -> ChannelResult<DeliveryStatus>;
}

/// Publish and fold any error into a failure status
pub async fn deliver(channel: &dyn Channel, text: &str, category: Category) -> DeliveryStatus {
    match channel.publish(text, PublishOptions::for_category(category)).await {
        Ok(status) => status,
        Err(e) => DeliveryStatus::failure(channel.name(), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl Channel for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn publish(&self, _text: &str, _options: PublishOptions) -> ChannelResult<DeliveryStatus> {
            Err(ChannelError::Other("socket closed".to_string()))
        }
    }

    #[test]
    fn test_delivery_status_success() {
        let status = DeliveryStatus::success("telegram");
        assert!(status.success);
        assert_eq!(status.channel, "telegram");
        assert!(status.message.is_none());
    }

    #[test]
    fn test_delivery_status_failure() {
        let status = DeliveryStatus::failure("telegram", "Bad Request: chat not found");
        assert!(!status.success);
        assert_eq!(status.message.as_deref(), Some("Bad Request: chat not found"));
    }

    #[test]
    fn test_delivery_status_display() {
        let success = DeliveryStatus::success_with_message("log", "123 chars");
        assert!(success.to_string().contains("SUCCESS"));
        assert!(success.to_string().contains("log"));

        let failure = DeliveryStatus::failure("telegram", "timeout");
        assert!(failure.to_string().contains("FAILED"));
        assert!(failure.to_string().contains("timeout"));
    }

    #[test]
    fn test_publish_options_follow_category() {
        assert!(!PublishOptions::for_category(Category::Breaking).silent);
        assert!(!PublishOptions::for_category(Category::Prices).silent);
        assert!(PublishOptions::for_category(Category::Education).silent);
        assert!(PublishOptions::for_category(Category::System).silent);
    }

    #[tokio::test]
    async fn test_deliver_folds_errors_into_failure() {
        let status = deliver(&Broken, "hello", Category::News).await;
        assert!(!status.success);
        assert_eq!(status.channel, "broken");
        assert!(status.message.unwrap().contains("socket closed"));
    }
}
