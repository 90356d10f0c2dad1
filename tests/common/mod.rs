//! Common test utilities

use async_trait::async_trait;
use pulsecast::config::Config;
use pulsecast::delivery::{Channel, ChannelResult, DeliveryStatus, PublishOptions};
use std::sync::Mutex;

/// Config whose every provider points at `base_url`, with short timeouts
#[allow(dead_code)]
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    for endpoint in [
        &mut config.providers.coingecko,
        &mut config.providers.binance,
        &mut config.providers.coinpaprika,
        &mut config.providers.fear_greed,
        &mut config.providers.cryptopanic,
    ] {
        endpoint.url = base_url.to_string();
        endpoint.timeout_secs = 2;
    }
    config
}

/// Channel that records every post
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingChannel {
    pub posts: Mutex<Vec<(String, bool)>>,
}

#[allow(dead_code)]
impl RecordingChannel {
    pub fn texts(&self) -> Vec<String> {
        self.posts.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn publish(&self, text: &str, options: PublishOptions) -> ChannelResult<DeliveryStatus> {
        self.posts.lock().unwrap().push((text.to_string(), options.silent));
        Ok(DeliveryStatus::success(self.name()))
    }
}
