//! Message rendering with Handlebars templates
//!
//! Every post kind has a template under `templates/`, compiled into the
//! binary. Views carry pre-formatted strings (prices with separators, signed
//! percentages, bullet lists), so templates only arrange text. Interpolated
//! values are escaped for Telegram's HTML parse mode.
//!
//! Text from upstream feeds (headlines, sources) is clipped before rendering
//! so the escaped post stays under Telegram's message limit. Cutting the
//! rendered HTML instead could split a tag or an entity.

use handlebars::Handlebars;
use serde::Serialize;
use std::borrow::Cow;

use crate::breaking::BreakingNews;
use crate::content::Lesson;
use crate::providers::{EtfInsight, NewsItem, PriceBoard, Sentiment};
use crate::utils::{format_signed_pct, format_usd};

/// Escaped length allowed for a headline or update from a feed
const MAX_TEXT_CHARS: usize = 700;

/// Escaped length allowed for a source label
const MAX_SOURCE_CHARS: usize = 80;

/// Template names and sources
const TEMPLATES: &[(&str, &str)] = &[
    ("welcome", include_str!("../../templates/welcome.hbs")),
    ("good_morning", include_str!("../../templates/good_morning.hbs")),
    ("market_open", include_str!("../../templates/market_open.hbs")),
    ("global_news", include_str!("../../templates/global_news.hbs")),
    ("india_update", include_str!("../../templates/india_update.hbs")),
    ("learning", include_str!("../../templates/learning.hbs")),
    ("technical", include_str!("../../templates/technical.hbs")),
    ("good_night", include_str!("../../templates/good_night.hbs")),
    ("breaking", include_str!("../../templates/breaking.hbs")),
];

/// Agenda printed in the morning post
const AGENDA: &[&str] = &[
    "9 AM: Real-time market prices",
    "11 AM: Global crypto news",
    "1 PM: India market updates",
    "3 PM: Learning series",
    "5 PM: Technical analysis",
    "9 PM: Evening wrap-up",
];

/// Symbols shown in the market-open post
const MARKET_OPEN_SYMBOLS: &[(&str, &str)] = &[("₿", "BTC"), ("Ξ", "ETH"), ("◎", "SOL")];

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A built-in template failed to compile
    #[error("Template '{name}' is invalid: {reason}")]
    Template { name: String, reason: String },

    /// Data did not fit the template
    #[error("Rendering '{name}' failed: {reason}")]
    Render { name: String, reason: String },
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

fn escaped_len(text: &str) -> usize {
    escape_html(text).chars().count()
}

/// Clip `text` so its escaped form is at most `max_chars` long
///
/// Cuts fall between source characters, never inside an entity.
pub fn clip(text: &str, max_chars: usize) -> Cow<'_, str> {
    if escaped_len(text) <= max_chars {
        return Cow::Borrowed(text);
    }

    let budget = max_chars.saturating_sub(3);
    let mut used = 0;
    let mut clipped = String::new();
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let width = escaped_len(ch.encode_utf8(&mut buf));
        if used + width > budget {
            break;
        }
        used += width;
        clipped.push(ch);
    }
    clipped.push_str("...");
    Cow::Owned(clipped)
}

fn bullets<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Serialize)]
struct WelcomeView<'a> {
    channel_name: &'a str,
}

#[derive(Debug, Serialize)]
struct GoodMorningView<'a> {
    greeting: &'a str,
    quote: &'a str,
    agenda: String,
}

#[derive(Debug, Serialize)]
struct MarketOpenView {
    quotes: String,
    sentiment_value: u8,
    sentiment_label: String,
    key_level: String,
}

#[derive(Debug, Serialize)]
struct GlobalNewsView<'a> {
    headline: Cow<'a, str>,
    headline_source: Cow<'a, str>,
    etf_update: Cow<'a, str>,
    etf_source: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct IndiaUpdateView<'a> {
    update: Cow<'a, str>,
    source: &'a str,
}

#[derive(Debug, Serialize)]
struct LessonView<'a> {
    day: u32,
    title: &'a str,
    points: String,
    takeaway: &'a str,
}

#[derive(Debug, Serialize)]
struct GoodNightView<'a> {
    message: &'a str,
    btc_price: Option<String>,
    reflection: &'a str,
}

#[derive(Debug, Serialize)]
struct BreakingView<'a> {
    banner: &'a str,
    title: Cow<'a, str>,
    source: Cow<'a, str>,
}

// ============================================================================
// Composer
// ============================================================================

/// Renders every post kind from typed inputs
pub struct Composer {
    handlebars: Handlebars<'static>,
    channel_name: String,
}

impl Composer {
    /// Compile the built-in templates
    pub fn new(channel_name: impl Into<String>) -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(|s| escape_html(s).into_owned());

        for (name, source) in TEMPLATES {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| RenderError::Template {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
        }

        Ok(Self {
            handlebars,
            channel_name: channel_name.into(),
        })
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        self.handlebars
            .render(name, data)
            .map(|text| text.trim().to_string())
            .map_err(|e| RenderError::Render {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Startup announcement
    pub fn welcome(&self) -> Result<String, RenderError> {
        self.render(
            "welcome",
            &WelcomeView {
                channel_name: &self.channel_name,
            },
        )
    }

    pub fn good_morning(&self, greeting: &str, quote: &str) -> Result<String, RenderError> {
        self.render(
            "good_morning",
            &GoodMorningView {
                greeting,
                quote,
                agenda: bullets(AGENDA),
            },
        )
    }

    /// BTC/ETH/SOL quotes, sentiment, and the BTC level to watch
    pub fn market_open(&self, prices: &PriceBoard, sentiment: &Sentiment) -> Result<String, RenderError> {
        let quotes = MARKET_OPEN_SYMBOLS
            .iter()
            .filter_map(|(icon, symbol)| {
                prices.get(symbol).map(|q| {
                    format!(
                        "{icon} {symbol}: {} ({})",
                        format_usd(q.price),
                        format_signed_pct(q.change_24h)
                    )
                })
            })
            .collect::<Vec<_>>()
            .join("\n");

        let key_level = prices
            .get("BTC")
            .map(|q| format!("${:.0}K", q.price / 1000.0))
            .unwrap_or_else(|| "$65K".to_string());

        self.render(
            "market_open",
            &MarketOpenView {
                quotes,
                sentiment_value: sentiment.value,
                sentiment_label: sentiment.classification.clone(),
                key_level,
            },
        )
    }

    pub fn global_news(&self, headline: &NewsItem, etf: &EtfInsight) -> Result<String, RenderError> {
        self.render(
            "global_news",
            &GlobalNewsView {
                headline: clip(&headline.title, MAX_TEXT_CHARS),
                headline_source: clip(&headline.source, MAX_SOURCE_CHARS),
                etf_update: clip(&etf.update, MAX_TEXT_CHARS),
                etf_source: clip(&etf.source, MAX_SOURCE_CHARS),
            },
        )
    }

    pub fn india_update(&self, update: &str) -> Result<String, RenderError> {
        self.render(
            "india_update",
            &IndiaUpdateView {
                update: clip(update, MAX_TEXT_CHARS),
                source: "India Crypto Market",
            },
        )
    }

    pub fn learning(&self, lesson: &Lesson) -> Result<String, RenderError> {
        self.render("learning", &lesson_view(lesson))
    }

    pub fn technical(&self, lesson: &Lesson) -> Result<String, RenderError> {
        self.render("technical", &lesson_view(lesson))
    }

    /// Night message, optional BTC snapshot, and a reflection
    pub fn good_night(
        &self,
        message: &str,
        prices: Option<&PriceBoard>,
        reflection: &str,
    ) -> Result<String, RenderError> {
        let btc_price = prices
            .and_then(|board| board.get("BTC"))
            .map(|q| format_usd(q.price));

        self.render(
            "good_night",
            &GoodNightView {
                message,
                btc_price,
                reflection,
            },
        )
    }

    pub fn breaking(&self, news: &BreakingNews) -> Result<String, RenderError> {
        self.render(
            "breaking",
            &BreakingView {
                banner: news.severity.banner(),
                title: clip(&news.title, MAX_TEXT_CHARS),
                source: clip(&news.source, MAX_SOURCE_CHARS),
            },
        )
    }
}

fn lesson_view(lesson: &Lesson) -> LessonView<'_> {
    LessonView {
        day: lesson.day,
        title: &lesson.title,
        points: bullets(&lesson.points),
        takeaway: &lesson.takeaway,
    }
}
