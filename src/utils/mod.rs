//! Common utilities and helper functions
//!
//! This module provides shared text and number helpers used by the providers,
//! the breaking-news gate and the message composer.

use regex::Regex;
use std::sync::OnceLock;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Round a value to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Group the integer digits of a number with commas (`65432.7` -> `"65,433"`)
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format a USD price: whole dollars with separators above 1000, cents below
pub fn format_usd(price: f64) -> String {
    if price >= 1000.0 {
        format!("${}", format_thousands(price))
    } else {
        format!("${price:.2}")
    }
}

/// Format a percentage change with an explicit sign (`+1.2%`, `-0.4%`)
pub fn format_signed_pct(change: f64) -> String {
    format!("{change:+.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("hello\n\nworld"), "hello world");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-2.345, 1), -2.3);
        assert_eq!(round_to(65000.0, 2), 65000.0);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(65432.7), "65,433");
        assert_eq!(format_thousands(1_234_567.0), "1,234,567");
        assert_eq!(format_thousands(-3500.0), "-3,500");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(65000.0), "$65,000");
        assert_eq!(format_usd(182.456), "$182.46");
    }

    #[test]
    fn test_format_signed_pct() {
        assert_eq!(format_signed_pct(1.26), "+1.3%");
        assert_eq!(format_signed_pct(-0.44), "-0.4%");
    }
}
