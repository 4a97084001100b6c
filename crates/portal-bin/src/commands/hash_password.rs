// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-password` command.

use std::io::BufRead;

use anyhow::Context;

use crate::cli::{Cli, HashPasswordArgs};
use crate::error::{BinError, BinResult};

/// Prints the argon2 PHC string for a password.
pub fn hash_password(_cli: &Cli, args: HashPasswordArgs) -> BinResult<()> {
    let password = if args.stdin {
        read_password(std::io::stdin().lock())?
    } else {
        args.password
            .ok_or_else(|| BinError::config("No password given"))?
    };

    if password.is_empty() {
        return Err(BinError::config("Password cannot be empty"));
    }

    println!("{}", portal_core::hash_password(&password)?);
    Ok(())
}

/// Reads the first line, without its line terminator.
fn read_password(mut input: impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
