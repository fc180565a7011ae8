//! Display-safe strings.
//!
//! A cell's display value is either plain text, which is escaped when it is
//! written into markup, or [`SafeHtml`], which is written verbatim. Markup
//! built here always escapes its interpolated parts.

use serde::{Serialize, Serializer};
use std::fmt;

/// Markup that has already been escaped and may be emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Trust `markup` as-is. Callers are responsible for having escaped any
    /// user data it contains.
    pub fn from_trusted(markup: impl Into<String>) -> Self {
        SafeHtml(markup.into())
    }

    /// Escape plain text into safe markup.
    pub fn escape(text: &str) -> Self {
        SafeHtml(html_escape(text))
    }

    /// `<a href="{url}">{text}</a>` with both parts escaped.
    pub fn link(url: &str, text: &str) -> Self {
        SafeHtml(format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(url),
            html_escape(text)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SafeHtml {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The formatted value of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DisplayValue {
    /// Plain text; escaped on render.
    Text(String),
    /// Pre-escaped markup; emitted verbatim.
    Html(SafeHtml),
}

impl DisplayValue {
    pub fn text(s: impl Into<String>) -> Self {
        DisplayValue::Text(s.into())
    }

    /// Render into markup, escaping text.
    pub fn to_html(&self) -> String {
        match self {
            DisplayValue::Text(s) => html_escape(s),
            DisplayValue::Html(h) => h.as_str().to_string(),
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, DisplayValue::Html(_))
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Html(h) => f.write_str(h.as_str()),
        }
    }
}

impl From<SafeHtml> for DisplayValue {
    fn from(html: SafeHtml) -> Self {
        DisplayValue::Html(html)
    }
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
