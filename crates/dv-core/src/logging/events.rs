//! Event vocabulary shared by the log layers.

use serde::{Deserialize, Serialize};
use tracing::Span;

/// Log levels as they appear in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Where in the request pipeline an event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Descriptor resolution.
    Resolve,
    /// Record and table building.
    Build,
    /// Lazy key issue and placeholder shells.
    Lazy,
    /// Fragment dispatch.
    Dispatch,
    /// Template rendering.
    Render,
    /// HTTP request loop.
    Serve,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Init => "init",
            Stage::Resolve => "resolve",
            Stage::Build => "build",
            Stage::Lazy => "lazy",
            Stage::Dispatch => "dispatch",
            Stage::Render => "render",
            Stage::Serve => "serve",
        })
    }
}

/// Stable event names, used as tracing targets.
pub mod event_names {
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    pub const VIEW_REGISTERED: &str = "site.view_registered";

    pub const PAGE_RENDERED: &str = "page.rendered";
    pub const PAGE_FAILED: &str = "page.failed";

    pub const FRAGMENT_DISPATCHED: &str = "fragment.dispatched";
    pub const FRAGMENT_NOT_FOUND: &str = "fragment.not_found";
    pub const FRAGMENT_FAILED: &str = "fragment.failed";

    pub const SERVER_STARTED: &str = "server.started";
    pub const SERVER_STOPPED: &str = "server.stopped";
    pub const REQUEST_HANDLED: &str = "server.request_handled";
}

/// Correlation data for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub request_id: String,
}

impl LogContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        LogContext {
            request_id: request_id.into(),
        }
    }

    /// Context with a freshly generated request id.
    pub fn generate() -> Self {
        Self::new(super::generate_request_id())
    }

    /// Span carrying the request id and stage; events inside it inherit both
    /// in JSONL output.
    pub fn span(&self, stage: Stage) -> Span {
        tracing::info_span!("request", request_id = %self.request_id, stage = %stage)
    }
}
