//! # Time Normalizer
//!
//! Converts the loosely formatted time strings found in shot tables to
//! seconds. The conversion is total: anything unparseable yields `0.0`.
//! Digits from any Unicode script count, so `"１:４１"` is 101 seconds.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static RE_PLAIN_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("static pattern"));

static RE_FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").expect("static pattern"));

static RE_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d$").expect("static pattern"));

/// Input accepted by [`time_to_seconds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeValue<'a> {
    /// Already in seconds.
    Seconds(f64),
    /// Free-form time text.
    Text(&'a str),
    /// No value at all.
    Missing,
}

impl From<f64> for TimeValue<'_> {
    fn from(value: f64) -> Self {
        Self::Seconds(value)
    }
}

impl From<f32> for TimeValue<'_> {
    fn from(value: f32) -> Self {
        Self::Seconds(f64::from(value))
    }
}

impl From<i64> for TimeValue<'_> {
    fn from(value: i64) -> Self {
        Self::Seconds(value as f64)
    }
}

impl From<u32> for TimeValue<'_> {
    fn from(value: u32) -> Self {
        Self::Seconds(f64::from(value))
    }
}

impl<'a> From<&'a str> for TimeValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for TimeValue<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl<'a, T: Into<TimeValue<'a>>> From<Option<T>> for TimeValue<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// Converts a time value to seconds.
///
/// Supported forms:
/// - numbers, passed through
/// - `"101"` / `"101.5"`: plain seconds
/// - `"0:01:41"` / `"00:01:41.50"`: hours, minutes, seconds
/// - `"1:41"`: minutes, seconds
///
/// Colon segments are not range-checked, so `"75:00"` is 4500 seconds.
/// Anything else falls back to the first number found in the text, or `0.0`.
///
/// # Examples
/// ```
/// use shotseek_core::timeparse::time_to_seconds;
///
/// assert_eq!(time_to_seconds("0:01:41"), 101.0);
/// assert_eq!(time_to_seconds("1:41"), 101.0);
/// assert_eq!(time_to_seconds("garbage45text"), 45.0);
/// assert_eq!(time_to_seconds(12.5), 12.5);
/// ```
pub fn time_to_seconds<'a>(value: impl Into<TimeValue<'a>>) -> f64 {
    match value.into() {
        TimeValue::Seconds(secs) => secs,
        TimeValue::Missing => 0.0,
        TimeValue::Text(text) => parse_text(text),
    }
}

fn parse_text(text: &str) -> f64 {
    let s = ascii_digits(text.trim());
    let s = s.as_ref();
    if s.is_empty() {
        return 0.0;
    }

    if RE_PLAIN_SECONDS.is_match(s) {
        if let Ok(secs) = s.parse::<f64>() {
            return secs;
        }
    }

    if let Some(secs) = parse_colon_form(s) {
        return secs;
    }

    RE_FIRST_NUMBER
        .find(s)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Rewrites every Unicode decimal digit as its ASCII counterpart, since
/// `f64::from_str` only reads ASCII.
fn ascii_digits(s: &str) -> Cow<'_, str> {
    if s.is_ascii() {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .map(|c| digit_value(c).map_or(c, |d| char::from(b'0' + d)))
            .collect(),
    )
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    RE_DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Value of a decimal digit in any script.
///
/// Unicode assigns decimal digits in contiguous runs of ten starting at
/// zero, so the value is the distance to the start of the run, modulo 10.
fn digit_value(c: char) -> Option<u8> {
    if c.is_ascii_digit() {
        return Some(c as u8 - b'0');
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut steps = 0u32;
    let mut code = u32::from(c);
    while let Some(prev) = code.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        steps += 1;
        code -= 1;
    }
    Some((steps % 10) as u8)
}

/// Interprets `H:MM:SS` or `MM:SS` by segment count alone.
fn parse_colon_form(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s
        .split(':')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let num = |p: &str| p.parse::<f64>().ok();
    match parts.as_slice() {
        [h, m, sec] => Some(num(h)? * 3600.0 + num(m)? * 60.0 + num(sec)?),
        [m, sec] => Some(num(m)? * 60.0 + num(sec)?),
        _ => None,
    }
}
