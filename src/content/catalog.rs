//! Built-in content catalogs and lesson series

use super::{ContentError, ContentResult};
use serde::{Deserialize, Serialize};

/// One day of a lesson series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub day: u32,
    pub title: String,
    pub points: Vec<String>,
    pub takeaway: String,
}

impl Lesson {
    fn new(day: u32, title: &str, points: [&str; 3], takeaway: &str) -> Self {
        Self {
            day,
            title: title.to_string(),
            points: points.iter().map(|p| p.to_string()).collect(),
            takeaway: takeaway.to_string(),
        }
    }
}

/// Every catalog the content engine draws from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub greetings: Vec<String>,
    pub quotes: Vec<String>,
    pub night_messages: Vec<String>,
    pub reflections: Vec<String>,
    pub india_updates: Vec<String>,
    pub etf_updates: Vec<String>,
    pub learning: Vec<Lesson>,
    pub technical: Vec<Lesson>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Catalog {
    /// The catalogs shipped with the bot
    pub fn builtin() -> Self {
        Self {
            greetings: owned(&[
                "🌅 Good morning, crypto learners! Ready for today's insights?",
                "☕ Morning everyone! New day, new opportunities to learn.",
                "🌞 Good morning! Knowledge is the best crypto investment.",
                "👋 Morning team! Let's grow our understanding together.",
            ]),
            quotes: owned(&[
                "The more you learn, the more you earn.",
                "Education is the most powerful weapon for change.",
                "Knowledge has a beginning but no end.",
                "Learning never exhausts the mind.",
            ]),
            night_messages: owned(&[
                "🌙 Good night, crypto community! Today's learning complete.",
                "🌃 Night everyone! Knowledge gained is progress made.",
                "🌌 Good night! Tomorrow brings new learning opportunities.",
                "🌉 Night team! Rest well, learn better tomorrow.",
            ]),
            reflections: owned(&[
                "Wisdom comes from experience. Experience comes from learning.",
                "Small daily improvements lead to stunning results.",
                "Patience is the quiet edge of every long-term investor.",
            ]),
            india_updates: owned(&[
                "Indian crypto exchanges report 40% quarter-over-quarter user growth",
                "RBI exploring digital rupee integration with major crypto platforms",
                "Indian Web3 startups secure record funding in 2024",
                "Local crypto regulations moving towards clearer frameworks",
                "Indian investors increasingly diversifying into global crypto markets",
                "Major Indian banks easing restrictions on crypto-related transactions",
                "India's crypto tax collection shows steady increase this fiscal year",
                "Local crypto education initiatives gaining traction across India",
            ]),
            etf_updates: owned(&[
                "Bitcoin ETF inflows continue positive streak for 15+ consecutive days",
                "Institutional ETF purchases reaching new monthly records",
                "Global crypto ETF assets under management surpass $50 billion",
                "New ETF applications indicate growing institutional demand",
            ]),
            learning: vec![
                Lesson::new(1, "BLOCKCHAIN BASICS", [
                    "Decentralized ledger technology",
                    "How transactions get verified",
                    "Public vs private blockchains",
                ], "Understand the foundation before investing."),
                Lesson::new(2, "CRYPTO WALLETS", [
                    "Hot wallets vs cold wallets",
                    "Private key security",
                    "Multi-signature protection",
                ], "Your keys, your crypto. Not your keys, not your crypto."),
                Lesson::new(3, "TRADING FUNDAMENTALS", [
                    "Market vs limit orders",
                    "Support and resistance",
                    "Risk-reward ratio",
                ], "Never risk more than 2% of your capital per trade."),
                Lesson::new(4, "MARKET ANALYSIS", [
                    "Reading candlestick charts",
                    "Volume confirmation",
                    "Market cycles",
                ], "Price tells you what, volume tells you why."),
                Lesson::new(5, "RISK MANAGEMENT", [
                    "Position sizing strategies",
                    "Stop-loss placement",
                    "Portfolio diversification",
                ], "Protect your capital first, profits will follow."),
                Lesson::new(6, "INVESTMENT STRATEGIES", [
                    "Dollar-cost averaging",
                    "Long-term holding",
                    "Identifying opportunities",
                ], "Time in the market beats timing the market."),
                Lesson::new(7, "SECURITY ESSENTIALS", [
                    "Two-factor authentication",
                    "Phishing awareness",
                    "Exchange security",
                ], "Security is not optional in crypto."),
            ],
            technical: vec![
                Lesson::new(1, "SUPPORT & RESISTANCE", [
                    "Identifying key price levels",
                    "Role reversal principle",
                    "Multiple timeframe analysis",
                ], "Watch how price reacts at these levels"),
                Lesson::new(2, "TREND IDENTIFICATION", [
                    "Higher highs & higher lows",
                    "Trendline drawing",
                    "Trend strength assessment",
                ], "Trade in the direction of the trend"),
                Lesson::new(3, "CHART PATTERNS", [
                    "Head and shoulders",
                    "Double tops/bottoms",
                    "Triangle patterns",
                ], "Patterns suggest future price direction"),
                Lesson::new(4, "MOVING AVERAGES", [
                    "Simple vs exponential MA",
                    "Golden cross & death cross",
                    "Dynamic support/resistance",
                ], "Use MAs to identify trend direction"),
                Lesson::new(5, "VOLUME ANALYSIS", [
                    "Volume confirming price moves",
                    "Volume spikes at key levels",
                    "Relative volume strength",
                ], "Volume validates price action"),
                Lesson::new(6, "MOMENTUM INDICATORS", [
                    "RSI overbought/oversold",
                    "MACD crossovers",
                    "Stochastic oscillator",
                ], "Identify potential reversals"),
                Lesson::new(7, "RISK TOOLS", [
                    "Stop-loss strategies",
                    "Position sizing formulas",
                    "Risk-reward planning",
                ], "Always have an exit strategy"),
            ],
        }
    }

    /// Fail on the first empty catalog or series
    pub fn validate(&self) -> ContentResult<()> {
        let lists = [
            ("greetings", self.greetings.len()),
            ("quotes", self.quotes.len()),
            ("night_messages", self.night_messages.len()),
            ("reflections", self.reflections.len()),
            ("india_updates", self.india_updates.len()),
            ("etf_updates", self.etf_updates.len()),
            ("learning", self.learning.len()),
            ("technical", self.technical.len()),
        ];

        for (name, len) in lists {
            if len == 0 {
                return Err(ContentError::EmptyCatalog(name.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
