// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Binary errors and exit codes.
//!
//! | Code | Cause |
//! |------|-------|
//! | 1 | bad or missing configuration |
//! | 2 | startup failed (logging, server bind) |
//! | 3 | runtime failure |
//! | 4 | file or terminal I/O |
//! | 5 | API server |
//! | 6 | access-control core |

use thiserror::Error;

/// Result type alias for command implementations.
pub type BinResult<T> = Result<T, BinError>;

/// Failure of a `portal` command.
#[derive(Debug, Error)]
pub enum BinError {
    /// Bad or missing configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Logging or server setup failed.
    #[error("Startup failed: {0}")]
    Startup(String),

    /// Failure while running a command.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// File or terminal I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error.
    #[error(transparent)]
    Api(#[from] portal_api::ApiError),

    /// Configuration loading error.
    #[error(transparent)]
    Config(#[from] portal_config::ConfigError),

    /// Access-control core error.
    #[error(transparent)]
    Core(#[from] portal_core::CoreError),

    /// An error wrapped with what the command was doing.
    #[error("{context}: {source}")]
    Context {
        /// The failed step.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a startup error.
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Wraps `self` with a description of the failed step.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Process exit code. Wrapped errors keep the code of their source.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => 1,
            Self::Startup(_) => 2,
            Self::Runtime(_) => 3,
            Self::Io(_) => 4,
            Self::Api(_) => 5,
            Self::Core(_) => 6,
            Self::Context { source, .. } => source.exit_code(),
        }
    }
}

impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{:#}", err))
    }
}

/// Prints `error` with its cause chain to stderr and exits.
pub fn report_error_and_exit(error: BinError) -> ! {
    eprintln!("Error: {}", error);
    let mut cause = std::error::Error::source(&error);
    while let Some(inner) = cause {
        eprintln!("  Caused by: {}", inner);
        cause = inner.source();
    }
    std::process::exit(error.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_exit_code() {
        let err = BinError::config("jwt.secret is empty").with_context("Failed to load portal.yaml");
        assert_eq!(
            err.to_string(),
            "Failed to load portal.yaml: Configuration error: jwt.secret is empty"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_codes_by_source() {
        let missing = portal_config::ConfigError::missing_field("jwt.secret");
        assert_eq!(BinError::from(missing).exit_code(), 1);
        assert_eq!(BinError::startup("bind").exit_code(), 2);

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert_eq!(BinError::from(io).exit_code(), 4);
        assert_eq!(
            BinError::from(portal_core::CoreError::validation("bad")).exit_code(),
            6
        );
    }

    #[test]
    fn test_anyhow_keeps_context() {
        let err: anyhow::Error = anyhow::anyhow!("pipe closed").context("Failed to read stdin");
        let err = BinError::from(err);
        assert_eq!(err.to_string(), "Runtime error: Failed to read stdin: pipe closed");
        assert_eq!(err.exit_code(), 3);
    }
}
