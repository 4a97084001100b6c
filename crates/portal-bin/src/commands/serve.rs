// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `serve` command.

use portal_config::load_config;
use tracing::info;

use crate::cli::{Cli, ServeArgs};
use crate::error::{BinError, BinResult};
use crate::logging::init_logging;
use crate::runtime::PortalRuntime;

/// Loads the configuration and runs the API server.
pub async fn serve(cli: &Cli, args: ServeArgs) -> BinResult<()> {
    let mut config = load_config(&cli.config).map_err(|e| {
        BinError::from(e).with_context(format!("Failed to load {}", cli.config.display()))
    })?;

    init_logging(
        &cli.effective_log_level(config.logging.level),
        cli.effective_log_format(config.logging.format),
    )?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.no_seed {
        config.seed.demo_users = false;
    }

    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    info!(config = %cli.config.display(), "Starting portal API");
    PortalRuntime::new(config).run().await
}
