//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a number of seconds as `MM:SS`.
///
/// Usage in templates: `{{ remaining|mmss }}`
#[askama::filter_fn]
pub fn mmss(seconds: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let seconds: u32 = seconds.to_string().parse().unwrap_or(0);
    Ok(pedalhub_core::QrCountdown::from_secs(seconds).to_string())
}
