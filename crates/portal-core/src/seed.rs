// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Demo account seeding.

use tracing::{debug, info};

use crate::credential::hash_password;
use crate::error::CoreResult;
use crate::role::Role;
use crate::store::UserStore;
use crate::user::User;

/// A demo account created on first start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoUser {
    /// Fixed user id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Login email.
    pub email: &'static str,
    /// Plain password, hashed before storage.
    pub password: &'static str,
    /// Assigned role.
    pub role: Role,
    /// Department label.
    pub department: &'static str,
}

/// One demo account for each operational role.
pub const DEMO_USERS: [DemoUser; 6] = [
    DemoUser {
        id: "u_super_admin",
        name: "Super Admin",
        email: "superadmin@portal.test",
        password: "Super@123",
        role: Role::SuperAdmin,
        department: "Admin",
    },
    DemoUser {
        id: "u_manager",
        name: "Manager",
        email: "manager@portal.test",
        password: "Manager@123",
        role: Role::Manager,
        department: "Management",
    },
    DemoUser {
        id: "u_dev",
        name: "Developer",
        email: "developer@portal.test",
        password: "Developer@123",
        role: Role::Developer,
        department: "Engineering",
    },
    DemoUser {
        id: "u_qa",
        name: "QA Engineer",
        email: "qa@portal.test",
        password: "Qa@123",
        role: Role::Qa,
        department: "Quality",
    },
    DemoUser {
        id: "u_designer",
        name: "Designer",
        email: "designer@portal.test",
        password: "Designer@123",
        role: Role::Designer,
        department: "Design",
    },
    DemoUser {
        id: "u_hr",
        name: "HR",
        email: "hr@portal.test",
        password: "Hr@123",
        role: Role::Hr,
        department: "Human Resources",
    },
];

impl DemoUser {
    /// Builds the stored user record with a hashed password.
    pub fn to_user(&self) -> CoreResult<User> {
        let hash = hash_password(self.password)?;
        Ok(User::new(self.name, self.email, hash, self.role)
            .with_id(self.id)
            .with_department(self.department))
    }
}

/// Result of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Accounts inserted.
    pub created: usize,
    /// Accounts skipped because the email already existed.
    pub skipped: usize,
}

/// Inserts the demo accounts that do not exist yet.
///
/// Existing accounts are matched by email and left untouched.
pub async fn seed_demo_users(store: &dyn UserStore) -> CoreResult<SeedReport> {
    let mut report = SeedReport::default();

    for demo in DEMO_USERS.iter() {
        if store.find_by_email(demo.email).await?.is_some() {
            debug!(email = demo.email, "Demo user exists, skipping");
            report.skipped += 1;
            continue;
        }
        store.insert(demo.to_user()?).await?;
        report.created += 1;
    }

    info!(created = report.created, skipped = report.skipped, "Seeded demo users");
    Ok(report)
}
