// ABOUTME: Static role-to-permission mapping with fail-closed checks
// ABOUTME: Each role declares its permission set explicitly, no inheritance shortcut
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! # Role & Permission Model
//!
//! Pure, I/O-free permission checks. Roles are totally ordered by privilege
//! breadth but deliberately *not* implemented as a numeric hierarchy: each
//! role's permission set is declared independently, so granting a new
//! permission to [`UserRole::SuperAdmin`] does not silently extend
//! [`UserRole::TenantAdmin`].

use crate::models::UserRole;
use serde::{Deserialize, Serialize};

/// Actions a caller may be permitted to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Sit exams and submit answers
    TakeExams,
    /// View analytics dashboards
    ViewAnalytics,
    /// Manage a tenant's users
    ManageUsers,
    /// Manage a tenant's billing and subscription
    ManageBilling,
    /// Author and publish exams and question banks
    ManageExams,
    /// Create, suspend, and configure tenants platform-wide
    ManageTenants,
}

impl UserRole {
    /// Check whether this role grants a permission
    ///
    /// The match is exhaustive over both enums; the declared sets are the
    /// whole policy and are not extensible at runtime.
    #[must_use]
    pub const fn grants(&self, permission: Permission) -> bool {
        match self {
            Self::User => matches!(
                permission,
                Permission::TakeExams | Permission::ViewAnalytics
            ),
            Self::TenantAdmin => matches!(
                permission,
                Permission::ManageUsers
                    | Permission::ManageBilling
                    | Permission::ManageExams
                    | Permission::ViewAnalytics
                    | Permission::TakeExams
            ),
            Self::SuperAdmin => true,
        }
    }
}

/// Check whether `role` grants `permission`, failing closed
///
/// An absent role (e.g. an unrecognized role string that
/// [`UserRole::parse`] refused) yields `false` for every permission,
/// never a panic.
#[must_use]
pub fn can(role: Option<UserRole>, permission: Permission) -> bool {
    role.is_some_and(|r| r.grants(permission))
}

/// Check whether `role` is the cross-tenant super admin role
///
/// A plain equality check; absent role is not a super admin.
#[must_use]
pub fn is_super_admin(role: Option<UserRole>) -> bool {
    role == Some(UserRole::SuperAdmin)
}
