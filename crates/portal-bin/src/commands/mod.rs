// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.

mod hash_password;
mod roles;
mod serve;
mod validate;
mod version;

pub use hash_password::hash_password;
pub use roles::{role_table, roles, RoleRow};
pub use serve::serve;
pub use validate::validate;
pub use version::version;

use portal_config::{LogFormat, LogLevel};

use crate::cli::{Cli, Commands};
use crate::error::BinResult;
use crate::logging::init_logging;

/// Executes the appropriate command based on CLI arguments.
///
/// `serve` installs logging from the loaded configuration; the one-shot
/// commands log warnings only unless a flag says otherwise.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Serve(args) => serve::serve(&cli, args).await,
        command => {
            init_logging(
                &cli.effective_log_level(LogLevel::Warn),
                cli.effective_log_format(LogFormat::Text),
            )?;
            match command {
                Commands::Validate(args) => validate::validate(&cli, args),
                Commands::Version => version::version(&cli),
                Commands::HashPassword(args) => hash_password::hash_password(&cli, args),
                Commands::Roles(args) => roles::roles(&cli, args),
                Commands::Serve(_) => Ok(()),
            }
        }
    }
}
