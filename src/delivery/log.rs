//! Dry-run channel that logs posts instead of sending them

use async_trait::async_trait;

use super::{Channel, ChannelResult, DeliveryStatus, PublishOptions};

/// Writes every post to the tracing log
#[derive(Debug, Default, Clone)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn publish(&self, text: &str, options: PublishOptions) -> ChannelResult<DeliveryStatus> {
        tracing::info!(silent = options.silent, chars = text.chars().count(), "Dry run post:\n{text}");
        Ok(DeliveryStatus::success_with_message(
            self.name(),
            format!("{} chars logged", text.chars().count()),
        ))
    }
}
