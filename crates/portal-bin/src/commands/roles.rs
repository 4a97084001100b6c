// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `roles` command.

use portal_core::{PermissionEvaluator, Role, RoleRegistry};
use portal_session::landing_page_for;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat, RolesArgs};
use crate::error::BinResult;

/// One line of the role table.
#[derive(Debug, Clone, Serialize)]
pub struct RoleRow {
    /// Wire name.
    pub role: Role,
    /// Display label.
    pub label: &'static str,
    /// Hierarchy rank.
    pub hierarchy: u32,
    /// Landing page after login.
    pub landing_page: String,
    /// Roles this role may administer.
    pub can_manage: Vec<Role>,
    /// Permissions as `resource: actions`.
    pub permissions: Vec<String>,
}

/// Builds the role table, most privileged first.
pub fn role_table(registry: &RoleRegistry) -> Vec<RoleRow> {
    let evaluator = PermissionEvaluator::new(registry.clone());

    registry
        .ranked_roles()
        .into_iter()
        .map(|role| RoleRow {
            role,
            label: role.label(),
            hierarchy: registry.hierarchy_level(role),
            landing_page: landing_page_for(role).to_string(),
            can_manage: evaluator.editable_roles(role),
            permissions: registry
                .permissions_for(role)
                .iter()
                .map(ToString::to_string)
                .collect(),
        })
        .collect()
}

/// Prints the standard role table.
pub fn roles(_cli: &Cli, args: RolesArgs) -> BinResult<()> {
    let rows = role_table(&RoleRegistry::standard());

    match args.format {
        OutputFormat::Text => {
            for row in &rows {
                println!(
                    "{} ({}) rank {} -> {}",
                    row.role.as_str(),
                    row.label,
                    row.hierarchy,
                    row.landing_page
                );
                for permission in &row.permissions {
                    println!("    {}", permission);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows).map_err(anyhow::Error::from)?);
        }
    }

    Ok(())
}
