//! Renderer configuration types.

use serde::{Deserialize, Serialize};

/// Page color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    Light,
    /// Dark theme.
    Dark,
    /// Auto-detect from system preference.
    #[default]
    Auto,
}

impl Theme {
    /// Value for the `data-bs-theme` attribute.
    pub fn attr_value(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }
}

/// Complete renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Color theme.
    #[serde(default)]
    pub theme: Theme,
    /// Minify output. Unset means "minify in release builds only".
    #[serde(default)]
    pub minify: Option<bool>,
    /// Stylesheet linked from full pages.
    #[serde(default = "default_stylesheet")]
    pub stylesheet_url: Option<String>,
    /// Suffix appended to page titles.
    #[serde(default = "default_site_title")]
    pub site_title: String,
}

fn default_stylesheet() -> Option<String> {
    Some("https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css".to_string())
}

fn default_site_title() -> String {
    "Site administration".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            minify: None,
            stylesheet_url: default_stylesheet(),
            site_title: default_site_title(),
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = Some(minify);
        self
    }

    pub fn with_stylesheet_url(mut self, url: Option<String>) -> Self {
        self.stylesheet_url = url;
        self
    }

    /// Whether output should be minified in this build.
    pub fn should_minify(&self) -> bool {
        self.minify.unwrap_or(!cfg!(debug_assertions))
    }
}
