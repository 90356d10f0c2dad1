//! Breaking-news deduplication and severity classification
//!
//! [`FingerprintGate`] decides whether a news candidate is new and important
//! enough to announce. It remembers exactly one fingerprint, the SHA-256 of
//! the last emitted title after lowercasing and whitespace collapsing, so the
//! same headline polled twice is announced once.

use crate::providers::NewsItem;
use crate::utils::normalize_whitespace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Keywords that mark a headline as breaking regardless of score
pub const DEFAULT_KEYWORDS: &[&str] = &["breaking", "urgent", "alert", "emergency"];

/// Gate thresholds
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Candidates scoring below this are suppressed
    pub threshold: u32,
    /// Candidates scoring at or above this are `Important`
    pub urgent_threshold: u32,
    /// Lowercase keywords that make a title `Breaking`
    pub keywords: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: 21,
            urgent_threshold: 51,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Urgency label attached to an emitted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Breaking,
    Important,
    Update,
}

impl Severity {
    /// Banner shown at the top of the post
    pub fn banner(&self) -> &'static str {
        match self {
            Self::Breaking => "🚨 BREAKING NEWS",
            Self::Important => "📢 IMPORTANT UPDATE",
            Self::Update => "📰 MARKET UPDATE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breaking => write!(f, "breaking"),
            Self::Important => write!(f, "important"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Why a candidate was not announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Duplicate,
    BelowThreshold,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::BelowThreshold => write!(f, "below threshold"),
        }
    }
}

/// An item cleared for announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakingNews {
    pub title: String,
    pub source: String,
    pub url: Option<String>,
    pub importance: u32,
    pub severity: Severity,
}

/// Gate decision for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Suppressed(SuppressReason),
    Emitted(BreakingNews),
}

/// The last emitted fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsFingerprint {
    pub hash: String,
    pub last_seen_at: DateTime<Utc>,
}

/// Lowercase and collapse whitespace
pub fn normalize_title(title: &str) -> String {
    normalize_whitespace(&title.to_lowercase())
}

/// SHA-256 hex digest of the normalized title
pub fn fingerprint(title: &str) -> String {
    format!("{:x}", Sha256::digest(normalize_title(title).as_bytes()))
}

/// Classify a headline by keyword, then by score
pub fn classify(title: &str, score: u32, config: &GateConfig) -> Severity {
    let lowered = title.to_lowercase();
    if config.keywords.iter().any(|k| lowered.contains(k.as_str())) {
        Severity::Breaking
    } else if score >= config.urgent_threshold {
        Severity::Important
    } else {
        Severity::Update
    }
}

/// Single-slot duplicate and threshold filter
pub struct FingerprintGate {
    config: GateConfig,
    last: Mutex<Option<NewsFingerprint>>,
}

impl FingerprintGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            last: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide on `candidate` at the current wall-clock time
    pub fn admit(&self, candidate: &NewsItem) -> Decision {
        self.admit_at(candidate, Utc::now())
    }

    /// Decide on `candidate`, stamping an emission with `now`
    ///
    /// Duplicate detection runs before the threshold check, and only an
    /// emission replaces the stored fingerprint.
    pub fn admit_at(&self, candidate: &NewsItem, now: DateTime<Utc>) -> Decision {
        let hash = fingerprint(&candidate.title);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        if last.as_ref().is_some_and(|fp| fp.hash == hash) {
            return Decision::Suppressed(SuppressReason::Duplicate);
        }

        if candidate.importance < self.config.threshold {
            return Decision::Suppressed(SuppressReason::BelowThreshold);
        }

        *last = Some(NewsFingerprint {
            hash,
            last_seen_at: now,
        });

        Decision::Emitted(BreakingNews {
            title: candidate.title.clone(),
            source: candidate.source.clone(),
            url: candidate.url.clone(),
            importance: candidate.importance,
            severity: classify(&candidate.title, candidate.importance, &self.config),
        })
    }

    /// The fingerprint of the last emitted item, if any
    pub fn last_fingerprint(&self) -> Option<NewsFingerprint> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for FingerprintGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> FingerprintGate {
        FingerprintGate::new(GateConfig {
            threshold: 21,
            urgent_threshold: 51,
            ..GateConfig::default()
        })
    }

    #[test]
    fn test_fingerprint_ignores_case_and_spacing() {
        assert_eq!(
            fingerprint("Bitcoin  Breaks $100K"),
            fingerprint(" bitcoin breaks\n$100k ")
        );
        assert_ne!(fingerprint("Bitcoin up"), fingerprint("Bitcoin down"));
        assert_eq!(fingerprint("x").len(), 64);
    }

    #[test]
    fn test_fingerprint_is_lowercase_hex_digest() {
        assert_eq!(
            fingerprint("   "),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_same_title_twice_emits_once() {
        let gate = gate();
        let item = NewsItem::new("SEC approves spot ETF", "Desk", 80);

        assert!(matches!(gate.admit(&item), Decision::Emitted(_)));
        assert_eq!(
            gate.admit(&item),
            Decision::Suppressed(SuppressReason::Duplicate)
        );
    }

    #[test]
    fn test_below_threshold_leaves_fingerprint_untouched() {
        let gate = gate();
        let first = NewsItem::new("Exchange lists new token", "Desk", 30);
        assert!(matches!(gate.admit(&first), Decision::Emitted(_)));
        let before = gate.last_fingerprint();

        let quiet = NewsItem::new("Minor protocol upgrade", "Desk", 20);
        assert_eq!(
            gate.admit(&quiet),
            Decision::Suppressed(SuppressReason::BelowThreshold)
        );
        assert_eq!(gate.last_fingerprint(), before);

        // The quiet item can still be emitted later once it scores enough
        let louder = NewsItem::new("Minor protocol upgrade", "Desk", 25);
        assert!(matches!(gate.admit(&louder), Decision::Emitted(_)));
    }

    #[test]
    fn test_repeated_quiet_item_never_emits() {
        let gate = gate();
        let quiet = NewsItem::new("Validator count ticks up", "Desk", 12);

        for _ in 0..10 {
            assert_eq!(
                gate.admit(&quiet),
                Decision::Suppressed(SuppressReason::BelowThreshold)
            );
            assert_eq!(gate.last_fingerprint(), None);
        }

        let loud = NewsItem::new("Major exchange halts withdrawals", "Desk", 70);
        assert!(matches!(gate.admit(&loud), Decision::Emitted(_)));
        assert_eq!(gate.last_fingerprint().map(|fp| fp.hash), Some(fingerprint(&loud.title)));
    }

    #[test]
    fn test_duplicate_checked_before_threshold() {
        let gate = gate();
        let item = NewsItem::new("Whale moves 10k BTC", "Desk", 40);
        gate.admit(&item);

        let weaker = NewsItem::new("Whale moves 10k BTC", "Desk", 1);
        assert_eq!(
            gate.admit(&weaker),
            Decision::Suppressed(SuppressReason::Duplicate)
        );
    }

    #[test]
    fn test_only_one_fingerprint_is_remembered() {
        let gate = gate();
        let a = NewsItem::new("Story A", "Desk", 30);
        let b = NewsItem::new("Story B", "Desk", 30);

        gate.admit(&a);
        gate.admit(&b);
        assert!(matches!(gate.admit(&a), Decision::Emitted(_)));
    }

    #[test]
    fn test_emission_records_timestamp() {
        let gate = gate();
        let now = Utc::now();
        gate.admit_at(&NewsItem::new("Story", "Desk", 30), now);

        let fp = gate.last_fingerprint().unwrap();
        assert_eq!(fp.last_seen_at, now);
        assert_eq!(fp.hash, fingerprint("story"));
    }

    #[test]
    fn test_classify() {
        let config = GateConfig::default();
        assert_eq!(classify("URGENT: exchange halts withdrawals", 5, &config), Severity::Breaking);
        assert_eq!(classify("Market alert issued", 100, &config), Severity::Breaking);
        assert_eq!(classify("ETF sees inflows", 51, &config), Severity::Important);
        assert_eq!(classify("ETF sees inflows", 50, &config), Severity::Update);
    }

    #[test]
    fn test_emitted_payload_carries_severity() {
        let gate = gate();
        match gate.admit(&NewsItem::new("Breaking: hack reported", "Desk", 22)) {
            Decision::Emitted(news) => {
                assert_eq!(news.severity, Severity::Breaking);
                assert_eq!(news.severity.banner(), "🚨 BREAKING NEWS");
            }
            other => panic!("Unexpected decision: {other:?}"),
        }
    }
}
