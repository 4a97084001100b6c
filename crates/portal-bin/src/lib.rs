// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # portal-bin
//!
//! Command-line entry point for the project portal.
//!
//! ## Usage
//!
//! ```bash
//! # Start the API server (default command)
//! portal
//!
//! # Start with a custom config
//! portal -c /etc/portal/portal.yaml
//!
//! # Check a config file
//! portal validate
//!
//! # Hash a password for a user record
//! portal hash-password 'S3cret!'
//!
//! # Print the role table
//! portal roles --format json
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{api_config, PortalRuntime};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
