//! Structured logging for the detail view engine.
//!
//! Two output modes, both on stderr:
//! - human-readable lines for interactive use
//! - JSONL for machines, one object per event
//!
//! # Usage
//!
//! ```ignore
//! use dv_core::logging::{init_logging, LogConfig, LogContext, Stage};
//!
//! init_logging(&LogConfig::from_env(None, None));
//!
//! let ctx = LogContext::generate();
//! let span = ctx.span(Stage::Dispatch);
//! let _guard = span.enter();
//! tracing::info!(target: "fragment.dispatched", fragment_key = "contacts", "fragment served");
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG`, when it parses as a filter, wins over the configured level.
/// A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "dv_core={level},dv_render={level}",
            level = config.level
        ))
    });

    let installed = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(config.source_location)
                .with_line_number(config.source_location)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Short unique id for one request.
pub fn generate_request_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("req-{}", &uuid[..12])
}

/// Emit an event inside the request's correlation fields.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::PAGE_RENDERED, Stage::Render, "page rendered",
///     bytes = html.len());
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(target: $event, request_id = %$ctx.request_id, stage = %$stage,
            $($key = $val,)* message = $msg)
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(target: $event, request_id = %$ctx.request_id, stage = %$stage,
            $($key = $val,)* message = $msg)
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(target: $event, request_id = %$ctx.request_id, stage = %$stage,
            $($key = $val,)* message = $msg)
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(target: $event, request_id = %$ctx.request_id, stage = %$stage,
            $($key = $val,)* message = $msg)
    };
}
