//! Fear & Greed index provider

use super::{check_status, endpoint, FetchError, Payload, Provider, SyntheticSource};
use async_trait::async_trait;
use chrono::{FixedOffset, Timelike, Utc};
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Market sentiment reading on a 0-100 scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub value: u8,
    pub classification: String,
}

impl Sentiment {
    /// Build a reading, deriving the label from the value
    pub fn from_value(value: u8) -> Self {
        Self {
            value,
            classification: classify(value).to_string(),
        }
    }
}

impl Payload for Sentiment {
    fn normalized(self) -> Self {
        Self {
            value: self.value.min(100),
            classification: self.classification.trim().to_string(),
        }
    }
}

/// Label used for synthetic readings
pub fn classify(value: u8) -> &'static str {
    match value {
        v if v > 65 => "Greed",
        v if v < 40 => "Fear",
        _ => "Neutral",
    }
}

/// Plausible synthetic range for a local hour of day
pub fn synthetic_range(hour: u32) -> RangeInclusive<u8> {
    match hour {
        6..=11 => 55..=70,
        12..=17 => 50..=65,
        _ => 45..=60,
    }
}

#[derive(Debug, Deserialize)]
struct FearGreedResponse {
    data: Vec<FearGreedEntry>,
}

#[derive(Debug, Deserialize)]
struct FearGreedEntry {
    value: String,
    value_classification: String,
}

/// alternative.me Fear & Greed index
pub struct FearGreedProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl FearGreedProvider {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Provider<Sentiment> for FearGreedProvider {
    fn name(&self) -> &str {
        "alternative.me"
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn fetch(&self) -> Result<Sentiment, FetchError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "fng/"))
            .query(&[("limit", "1")])
            .send()
            .await?;
        let body: FearGreedResponse = check_status(response)?.json().await?;

        let entry = body.data.into_iter().next().ok_or(FetchError::Empty)?;
        let value = entry
            .value
            .parse::<u8>()
            .map_err(|e| FetchError::Decode(format!("fear & greed value: {e}")))?;

        Ok(Sentiment {
            value,
            classification: entry.value_classification,
        })
    }
}

/// Synthetic sentiment drawn from a range that depends on the local hour
#[derive(Debug, Clone)]
pub struct SentimentBaseline {
    utc_offset: FixedOffset,
}

impl SentimentBaseline {
    pub fn new(utc_offset: FixedOffset) -> Self {
        Self { utc_offset }
    }

    /// Draw a reading for the given local hour
    pub fn sample<R: Rng + ?Sized>(&self, hour: u32, rng: &mut R) -> Sentiment {
        Sentiment::from_value(rng.gen_range(synthetic_range(hour)))
    }
}

impl SyntheticSource<Sentiment> for SentimentBaseline {
    fn synthesize(&self) -> Sentiment {
        let hour = Utc::now().with_timezone(&self.utc_offset).hour();
        self.sample(hour, &mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(66), "Greed");
        assert_eq!(classify(65), "Neutral");
        assert_eq!(classify(40), "Neutral");
        assert_eq!(classify(39), "Fear");
    }

    #[test]
    fn test_synthetic_range_by_hour() {
        assert_eq!(synthetic_range(6), 55..=70);
        assert_eq!(synthetic_range(11), 55..=70);
        assert_eq!(synthetic_range(12), 50..=65);
        assert_eq!(synthetic_range(17), 50..=65);
        assert_eq!(synthetic_range(18), 45..=60);
        assert_eq!(synthetic_range(3), 45..=60);
    }

    #[test]
    fn test_sample_respects_hour_range() {
        let baseline = SentimentBaseline::new(FixedOffset::east_opt(0).unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for hour in 0..24 {
            let range = synthetic_range(hour);
            let reading = baseline.sample(hour, &mut rng);
            assert!(range.contains(&reading.value), "hour {hour}: {}", reading.value);
            assert_eq!(reading.classification, classify(reading.value));
        }
    }
}
