//! # Normalization Module
//!
//! ## Purpose
//! Pure, stateless canonicalization of model fields and dates. Every
//! comparison in the duplicate matcher, the price resolver, and the query
//! builder goes through these functions so the matching criteria cannot
//! drift apart between call sites.
//!
//! ## Input/Output Specification
//! - **Input**: Raw text fields and timestamps as entered by users
//! - **Output**: Canonical comparison keys and storage-form values
//! - **Guarantee**: Deterministic for identical input, side-effect free
//!
//! Normalized keys are for comparison only; stored values keep their own
//! canonical form (title case for names, lowercase for colours).

use chrono::{DateTime, NaiveDate, Utc};
use unicode_normalization::UnicodeNormalization;

/// Comparison key for model and company names: NFC, trimmed, uppercased.
pub fn normalize_name(s: &str) -> String {
    s.nfc().collect::<String>().trim().to_uppercase()
}

/// Comparison key for colours: NFC, trimmed, lowercased. `None` is treated
/// as the empty string.
pub fn normalize_colour(s: Option<&str>) -> String {
    s.unwrap_or("")
        .nfc()
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Truncate an instant to its UTC calendar day. Two instants on the same
/// day normalize to equal keys regardless of time-of-day.
pub fn normalize_date_to_day(d: DateTime<Utc>) -> NaiveDate {
    d.date_naive()
}

/// Convert a string to title case: the first letter of each
/// whitespace-delimited word is uppercased, the rest lowercased. Original
/// separators are preserved.
pub fn to_title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }

    out
}

/// Sanitize a purchase price: negative, NaN, or infinite values coerce to 0.
pub fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        0.0
    }
}
