// ABOUTME: Core identity and tenancy models shared across the authorization layer
// ABOUTME: User, UserRole, Session, TenantId, Tenant, and TenantMembership definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Platform-wide user role
///
/// A closed enumeration: the permission table in [`crate::permissions`]
/// matches on it exhaustively, so adding a role is a compile-time-checked
/// event. Wire representation matches the directory's role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular platform user (students, teachers)
    User,
    /// Administrator of a single tenant
    TenantAdmin,
    /// Cross-tenant platform administrator
    SuperAdmin,
}

impl UserRole {
    /// Parse a role string, failing closed on anything unrecognized
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(Self::User),
            "TENANT_ADMIN" => Some(Self::TenantAdmin),
            "SUPER_ADMIN" => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Directory string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::TenantAdmin => "TENANT_ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User identity record
///
/// Owned and mutated by the session authentication service; this crate only
/// reads it. Profile fields beyond what authorization needs are omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address
    pub email: String,
    /// Display name (optional)
    pub display_name: Option<String>,
    /// Platform-wide role
    pub role: UserRole,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_active: DateTime<Utc>,
    /// Whether the account is active
    pub is_active: bool,
}

impl User {
    /// Create a new user record with the given role
    #[must_use]
    pub fn new(email: String, display_name: Option<String>, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            role,
            created_at: now,
            last_active: now,
            is_active: true,
        }
    }
}

/// Server-validated proof of authentication bound to a user
///
/// Opaque to this subsystem beyond exposing the user it belongs to;
/// created and destroyed entirely by the session authentication service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier
    pub id: String,
    /// User this session authenticates
    pub user_id: Uuid,
    /// When the session expires
    pub expires_at: DateTime<Utc>,
}

/// Type-safe wrapper for tenant identifiers
///
/// Provides compile-time distinction between tenant IDs and other UUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    /// Create a new random `TenantId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TenantId` from a UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TenantId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TenantId> for Uuid {
    fn from(tenant_id: TenantId) -> Self {
        tenant_id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl AsRef<Uuid> for TenantId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

/// Tenant organization record
///
/// Created by tenant-provisioning flows outside this core; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant identifier
    pub id: TenantId,
    /// Tenant organization name
    pub name: String,
    /// URL-safe slug, unique across the platform
    pub slug: String,
    /// Connection string for the tenant's dedicated data store.
    /// `None` until the store has been provisioned.
    pub connection_string: Option<String>,
    /// When the tenant was created
    pub created_at: DateTime<Utc>,
    /// When the tenant was last updated
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Creates a new, not-yet-provisioned tenant
    #[must_use]
    pub fn new(name: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: TenantId::new(),
            name,
            slug,
            connection_string: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Grant linking a user to a tenant they may act within
///
/// Many-to-many: a user may belong to multiple tenants. The membership
/// inserted first is treated as the user's primary tenant by the resolver's
/// implicit mode (a convention, not a uniqueness invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantMembership {
    /// Tenant side of the grant
    pub tenant_id: TenantId,
    /// User side of the grant
    pub user_id: Uuid,
    /// When the membership was granted
    pub joined_at: DateTime<Utc>,
}

impl TenantMembership {
    /// Create a new membership grant
    #[must_use]
    pub fn new(tenant_id: TenantId, user_id: Uuid) -> Self {
        Self {
            tenant_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}
