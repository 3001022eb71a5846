//! Forgiving deserializers for settings users edit by hand.
//!
//! Numbers may arrive as numbers or as strings (environment variables always
//! do), and a bad value should fall back to its default rather than stop the
//! program from starting.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

pub(crate) const DEFAULT_RETRIES: u32 = 3;
pub(crate) const DEFAULT_SLEEP_MS: u64 = 1000;

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Leading integer of a string: optional whitespace, optional sign, digits.
/// Anything after the digits is ignored; no digits at all is `None`.
fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Too many digits for an i64 is still a (huge) number.
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Non-negative integer; negatives clamp to zero, garbage becomes `fallback`.
fn non_negative<'de, D>(deserializer: D, fallback: u64) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Some(n),
        Raw::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Raw::Text(text) => parse_int_prefix(&text),
        Raw::Float(_) | Raw::Bool(_) | Raw::Other(_) => None,
    };
    Ok(value.map_or(fallback, |n| n.max(0).unsigned_abs()))
}

pub(crate) fn retries<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let retries = non_negative(deserializer, u64::from(DEFAULT_RETRIES))?;
    Ok(u32::try_from(retries).unwrap_or(u32::MAX))
}

pub(crate) fn sleep_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    non_negative(deserializer, DEFAULT_SLEEP_MS)
}

/// Requests per second; anything that isn't a positive number is unlimited.
pub(crate) fn rate_limit<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let limit = non_negative(deserializer, 0)?;
    Ok(u32::try_from(limit).unwrap_or(u32::MAX))
}

/// `true` or `"true"` switch the flag on; everything else leaves it off.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(text) => text.trim() == "true",
        _ => false,
    })
}

/// Free text that may have been parsed as a number (e.g. a numeric password
/// set through the environment).
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => Some(text),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(f)) => Some(f.to_string()),
        Some(Raw::Bool(b)) => Some(b.to_string()),
        Some(Raw::Other(_)) | None => None,
    })
}
