//! Field validation helpers used by the payload schemas.

use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use url::Url;

/// Require `value` to be between `min` and `max` characters (inclusive).
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(Error::validation(
            field,
            format!("length must be between {min} and {max}, got {len}"),
        ));
    }
    Ok(())
}

/// Require an absolute http(s) URL with a host.
///
/// The raw string is also the attachment identity key, so whitespace is
/// rejected rather than trimmed.
pub fn url(field: &str, value: &str) -> Result<()> {
    let invalid = || Error::validation(field, "must be an http(s) URL");
    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(())
}

/// Validate an optional URL, treating the empty string as absent.
pub fn optional_url(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if !v.is_empty() => url(field, v),
        _ => Ok(()),
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("valid email regex")
});

/// Address check: non-empty local part and a dotted hostname.
pub fn email(field: &str, value: &str) -> Result<()> {
    length(field, value, 3, 254)?;
    if !EMAIL_RE.is_match(value) {
        return Err(Error::validation(field, "must be an email address"));
    }
    Ok(())
}

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").expect("valid slug regex"));

/// Public profile handle: lowercase letters, digits and inner hyphens.
pub fn slug(field: &str, value: &str) -> Result<()> {
    length(field, value, 3, 50)?;
    if !SLUG_RE.is_match(value) {
        return Err(Error::validation(
            field,
            "must contain only lowercase letters, digits and hyphens",
        ));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` date.
pub fn date(field: &str, value: &str) -> Result<Date> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::validation(field, "must be a date formatted YYYY-MM-DD"))
}

/// Require a four digit year within `[now - back, now + ahead]`.
pub fn year_in_range(field: &str, value: &str, back: i32, ahead: i32) -> Result<i32> {
    if value.len() != 4 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::validation(field, "must be a four digit year"));
    }
    let year: i32 = value
        .parse()
        .map_err(|_| Error::validation(field, "must be a four digit year"))?;
    let current = OffsetDateTime::now_utc().year();
    if year < current - back || year > current + ahead {
        return Err(Error::validation(
            field,
            format!(
                "must be between {} and {}",
                current - back,
                current + ahead
            ),
        ));
    }
    Ok(year)
}

/// Require a list of `min..=max` entries, each `1..=100` characters.
pub fn string_list(field: &str, values: &[String], min: usize, max: usize) -> Result<()> {
    if values.len() < min || values.len() > max {
        return Err(Error::validation(
            field,
            format!("must contain between {min} and {max} entries"),
        ));
    }
    for value in values {
        length(field, value, 1, 100)?;
    }
    Ok(())
}
