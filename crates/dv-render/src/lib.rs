//! HTML rendering for detail pages and lazy fragments.
//!
//! Three templates cover everything a detail view emits:
//!
//! - `detail_page.html`: the full page. Lazy panels render as placeholders
//!   carrying `data-controller="lazy-panel"` and the fragment URL, and a small
//!   inline script swaps each one for its fragment once loaded.
//! - `object_list.html`: a table fragment, rendered from `{ object_list }`.
//! - `object_details.html`: a record fragment, rendered from `{ object_details }`.
//!
//! Text values are escaped; values already marked as safe HTML are emitted
//! verbatim. Output is minified in release builds unless configured otherwise.

pub mod config;
pub mod error;
pub mod renderer;

pub use config::{RenderConfig, Theme};
pub use error::{RenderError, Result};
pub use renderer::{HtmlRenderer, TemplateContext, TemplateRenderer};
