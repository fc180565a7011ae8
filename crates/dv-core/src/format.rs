//! Type-dispatched value formatting.
//!
//! A [`FormatterRegistry`] holds an ordered list of [`Formatter`] plug-ins.
//! The first one that matches a value and formats it successfully wins. A
//! formatter that fails is skipped, so a bad format string degrades to the
//! next rule instead of failing the whole page.

use std::fmt::Write as _;

use chrono::{FixedOffset, Offset, Utc};
use dv_common::{html_escape, DisplayValue, Error, Money, Result, SafeHtml, Value};
use tracing::debug;

use crate::config::DisplayConfig;

/// One formatting rule.
pub trait Formatter: Send + Sync {
    /// Stable name, used in logs and errors.
    fn name(&self) -> &str;

    /// Whether this rule applies to `value`.
    fn matches(&self, value: &Value) -> bool;

    /// Format a value for which [`Formatter::matches`] returned true.
    fn format(&self, value: &Value) -> Result<DisplayValue>;
}

/// Date-times, shifted into the display offset.
pub struct DateTimeFormatter {
    offset: FixedOffset,
    pattern: String,
}

impl DateTimeFormatter {
    pub fn new(offset: FixedOffset, pattern: impl Into<String>) -> Self {
        DateTimeFormatter {
            offset,
            pattern: pattern.into(),
        }
    }
}

impl Formatter for DateTimeFormatter {
    fn name(&self) -> &str {
        "datetime"
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::DateTime(_))
    }

    fn format(&self, value: &Value) -> Result<DisplayValue> {
        let Value::DateTime(dt) = value else {
            return Err(mismatch(self, value));
        };
        let local = dt.with_timezone(&self.offset);
        let mut out = String::new();
        write!(out, "{}", local.format(&self.pattern)).map_err(|_| Error::Format {
            formatter: self.name().to_string(),
            reason: format!("invalid pattern '{}'", self.pattern),
        })?;
        Ok(DisplayValue::Text(out))
    }
}

/// Calendar dates.
pub struct DateFormatter {
    pattern: String,
}

impl DateFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        DateFormatter {
            pattern: pattern.into(),
        }
    }
}

impl Formatter for DateFormatter {
    fn name(&self) -> &str {
        "date"
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }

    fn format(&self, value: &Value) -> Result<DisplayValue> {
        let Value::Date(date) = value else {
            return Err(mismatch(self, value));
        };
        let mut out = String::new();
        write!(out, "{}", date.format(&self.pattern)).map_err(|_| Error::Format {
            formatter: self.name().to_string(),
            reason: format!("invalid pattern '{}'", self.pattern),
        })?;
        Ok(DisplayValue::Text(out))
    }
}

/// Money as `$1,234.50 USD`.
#[derive(Default)]
pub struct MoneyFormatter;

impl Formatter for MoneyFormatter {
    fn name(&self) -> &str {
        "money"
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::Money(_))
    }

    fn format(&self, value: &Value) -> Result<DisplayValue> {
        let Value::Money(money) = value else {
            return Err(mismatch(self, value));
        };
        Ok(DisplayValue::Text(humanize_money(money)))
    }
}

/// Currency symbol, thousands separators, two decimals, ISO code.
pub fn humanize_money(money: &Money) -> String {
    let sign = if money.minor_units < 0 { "-" } else { "" };
    let abs = money.minor_units.unsigned_abs();
    let whole = group_thousands(abs / 100);
    let symbol = currency_symbol(money.currency.code());
    format!(
        "{sign}{symbol}{whole}.{:02} {}",
        abs % 100,
        money.currency.code()
    )
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn currency_symbol(code: &str) -> &'static str {
    match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "SGD" => "S$",
        "AUD" => "A$",
        "HKD" => "HK$",
        "IDR" => "Rp",
        _ => "",
    }
}

/// Stored images as a bounded thumbnail.
#[derive(Default)]
pub struct ImageFormatter;

impl Formatter for ImageFormatter {
    fn name(&self) -> &str {
        "image"
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::File(f) if !f.name.is_empty() && !f.url.is_empty())
    }

    fn format(&self, value: &Value) -> Result<DisplayValue> {
        let Value::File(file) = value else {
            return Err(mismatch(self, value));
        };
        Ok(DisplayValue::Html(SafeHtml::from_trusted(format!(
            r#"<img src="{}" style="max-width: 100px; max-height: 100px;">"#,
            html_escape(&file.url)
        ))))
    }
}

/// Absent values.
pub struct EmptyFormatter {
    empty_value: String,
}

impl EmptyFormatter {
    pub fn new(empty_value: impl Into<String>) -> Self {
        EmptyFormatter {
            empty_value: empty_value.into(),
        }
    }
}

impl Default for EmptyFormatter {
    fn default() -> Self {
        Self::new("-")
    }
}

impl Formatter for EmptyFormatter {
    fn name(&self) -> &str {
        "empty"
    }

    fn matches(&self, value: &Value) -> bool {
        value.is_none()
    }

    fn format(&self, _value: &Value) -> Result<DisplayValue> {
        Ok(DisplayValue::Text(self.empty_value.clone()))
    }
}

fn mismatch(formatter: &dyn Formatter, value: &Value) -> Error {
    Error::Format {
        formatter: formatter.name().to_string(),
        reason: format!("cannot format a {} value", value.kind()),
    }
}

/// Ordered formatter list with a text fallback.
pub struct FormatterRegistry {
    formatters: Vec<Box<dyn Formatter>>,
}

impl FormatterRegistry {
    /// A registry with no rules; everything falls through to text.
    pub fn empty() -> Self {
        FormatterRegistry {
            formatters: Vec::new(),
        }
    }

    /// The standard rules: date-time, date, money, image, empty.
    pub fn with_defaults(display: &DisplayConfig) -> Self {
        let offset =
            FixedOffset::east_opt(display.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        let mut registry = Self::empty();
        registry.push(DateTimeFormatter::new(offset, &display.datetime_format));
        registry.push(DateFormatter::new(&display.date_format));
        registry.push(MoneyFormatter);
        registry.push(ImageFormatter);
        registry.push(EmptyFormatter::new(&display.empty_value));
        registry
    }

    /// Append a rule; it is tried after the existing ones.
    pub fn push<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters.push(Box::new(formatter));
    }

    /// Insert a rule ahead of the existing ones.
    pub fn prepend<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters.insert(0, Box::new(formatter));
    }

    pub fn names(&self) -> Vec<&str> {
        self.formatters.iter().map(|f| f.name()).collect()
    }

    /// Format a value. Never fails.
    pub fn format(&self, value: &Value) -> DisplayValue {
        for formatter in self.formatters.iter().filter(|f| f.matches(value)) {
            match formatter.format(value) {
                Ok(display) => return display,
                Err(err) => {
                    debug!(
                        formatter = formatter.name(),
                        kind = value.kind(),
                        error = %err,
                        "formatter failed, trying next"
                    );
                }
            }
        }
        match value {
            Value::Html(html) => DisplayValue::Html(html.clone()),
            other => DisplayValue::Text(other.text_form()),
        }
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::with_defaults(&DisplayConfig::default())
    }
}
