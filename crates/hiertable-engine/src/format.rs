// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use hiertable_model::{AutomationDriver, ElementId, NumberLocale};
use tracing::debug;

const NAME_ATTRIBUTE: &str = "Name";

/// Normalizes displayed cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFormatter {
    locale: NumberLocale,
    reformat_numbers: bool,
}

impl CellFormatter {
    pub const fn new(locale: NumberLocale, reformat_numbers: bool) -> Self {
        Self {
            locale,
            reformat_numbers,
        }
    }

    /// Trims `raw`; decimal text is re-rendered as `#,##0.00` when number
    /// reformatting is on.
    pub fn format_text(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if self.reformat_numbers
            && let Some(value) = parse_decimal(trimmed, self.locale)
        {
            return format_decimal(value, self.locale);
        }
        trimmed.to_owned()
    }

    /// Reads a cell's text, falling back to its `Name` attribute.
    pub fn read_cell<D>(&self, driver: &mut D, cell: ElementId) -> Result<String>
    where
        D: AutomationDriver + ?Sized,
    {
        let text = match driver.text(cell) {
            Ok(Some(text)) => text,
            Ok(None) => driver.attribute(cell, NAME_ATTRIBUTE)?.unwrap_or_default(),
            Err(error) => {
                debug!(%cell, %error, "cell text unavailable, reading Name attribute");
                driver.attribute(cell, NAME_ATTRIBUTE)?.unwrap_or_default()
            }
        };
        Ok(self.format_text(&text))
    }
}

/// Trims and collapses runs of whitespace to a single space.
pub fn normalize_space(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accepts `-?[digits|group]+<decimal>digits+` and parses it as a float.
fn parse_decimal(text: &str, locale: NumberLocale) -> Option<f64> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = unsigned.split_once(locale.decimal_separator())?;

    let group = locale.group_separator();
    if whole.is_empty()
        || !whole.chars().all(|ch| ch.is_ascii_digit() || ch == group)
        || !whole.chars().any(|ch| ch.is_ascii_digit())
    {
        return None;
    }
    if fraction.is_empty() || !fraction.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let sign = if unsigned.len() < text.len() { "-" } else { "" };
    let digits = whole.chars().filter(char::is_ascii_digit).collect::<String>();
    let value: f64 = format!("{sign}{digits}.{fraction}").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Renders `value` as `#,##0.00`. Ties round to even on the binary value, and
/// a negative value that rounds to zero keeps its sign.
fn format_decimal(value: f64, locale: NumberLocale) -> String {
    let rendered = format!("{value:.2}");
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));
    format!(
        "{sign}{}{}{fraction}",
        group_digits(whole, locale.group_separator()),
        locale.decimal_separator(),
    )
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let mut chars = digits.chars().collect::<Vec<_>>();
    let mut count = 0usize;
    while let Some(ch) = chars.pop() {
        if count == 3 {
            out.push(separator);
            count = 0;
        }
        out.push(ch);
        count += 1;
    }
    out.chars().rev().collect()
}
