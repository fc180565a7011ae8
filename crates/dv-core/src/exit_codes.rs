//! Exit codes for the `dv` CLI.
//!
//! Exit code ranges:
//! - 0: success
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: internal errors (bugs, should be reported)

use dv_common::{Error, ErrorCategory};

use crate::server::ServerError;

/// Exit codes for `dv` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed.
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Configuration file missing, unreadable or invalid
    ConfigError = 11,

    /// Requested object or fragment does not exist
    NotFound = 12,

    /// Listener could not be bound
    BindError = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// Producer or template failure while rendering
    RenderError = 22,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Codes 10-19; resolvable by the user.
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Codes 20 and above; these indicate bugs.
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Stable name for machine-readable output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::BindError => "ERR_BIND",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::RenderError => "ERR_RENDER",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidObjectId(_) => ExitCode::ArgsError,
            Error::Toml(_) => ExitCode::ConfigError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::NotFound | ErrorCategory::Route => ExitCode::NotFound,
                ErrorCategory::Producer | ErrorCategory::Format => ExitCode::RenderError,
                ErrorCategory::Io => ExitCode::IoError,
                ErrorCategory::Resolution => ExitCode::InternalError,
            },
        }
    }
}

impl From<&ServerError> for ExitCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::InvalidAddress { .. } => ExitCode::ConfigError,
            ServerError::Bind { .. } => ExitCode::BindError,
            ServerError::Spawn(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
