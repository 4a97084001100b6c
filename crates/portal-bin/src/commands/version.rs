// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Prints version information for every component.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("Project Portal API");
    println!();
    println!("Version Information:");
    println!("  portal-bin:     {}", env!("CARGO_PKG_VERSION"));
    println!("  portal-core:    {}", portal_core::VERSION);
    println!("  portal-api:     {}", portal_api::VERSION);
    println!("  portal-config:  {}", portal_config::VERSION);
    println!("  portal-session: {}", portal_session::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:         {}", std::env::consts::ARCH);
    println!("  OS:             {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
