// ABOUTME: Master-store access for tenants, users, and memberships
// ABOUTME: TenantDirectory trait plus the sqlx/SQLite implementation used in production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! # Tenant Directory
//!
//! The master relational store holds [`Tenant`], [`User`], and
//! [`TenantMembership`] records. The resolver only ever reads from it;
//! write operations exist for provisioning flows and tests.

use crate::errors::{AppError, AppResult};
use crate::models::{Tenant, TenantId, TenantMembership, User, UserRole};
use crate::tenant::TenantSelector;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Read interface the tenant context resolver depends on
///
/// Kept narrow so tests can substitute an in-memory directory and so the
/// resolver cannot grow hidden write paths.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Find a tenant matching the selector's id OR slug, ignoring membership
    ///
    /// This is the super-admin path: no membership filter is applied.
    async fn find_tenant(&self, selector: &TenantSelector) -> AppResult<Option<Tenant>>;

    /// Find a tenant matching the selector, restricted to tenants the user
    /// is a member of
    ///
    /// A match the user has no membership for resolves to `Ok(None)`,
    /// not an error.
    async fn find_tenant_for_member(
        &self,
        user_id: Uuid,
        selector: &TenantSelector,
    ) -> AppResult<Option<Tenant>>;

    /// The user's first membership (insertion order) with its tenant
    async fn first_membership_with_tenant(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<(TenantMembership, Tenant)>>;
}

/// Master database backed by SQLite
#[derive(Clone)]
pub struct MasterDatabase {
    pool: SqlitePool,
}

impl MasterDatabase {
    /// Create a new master database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns a database error if the connection or migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns a database error if any DDL statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                display_name TEXT,
                role TEXT NOT NULL DEFAULT 'USER',
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL,
                connection_string TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tenants_slug ON tenants(slug)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tenant_memberships (
                tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                joined_at TEXT NOT NULL,
                PRIMARY KEY (tenant_id, user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memberships_user_id ON tenant_memberships(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a new user
    ///
    /// # Errors
    ///
    /// Returns a database error on constraint violation or I/O failure.
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, display_name, role, created_at, last_active, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.created_at.to_rfc3339())
        .bind(user.last_active.to_rfc3339())
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;

        Ok(user.id)
    }

    /// Get user by ID
    ///
    /// # Errors
    ///
    /// Returns a database error on I/O failure or a malformed row.
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_user).transpose()
    }

    /// Create a new tenant
    ///
    /// # Errors
    ///
    /// Returns a database error on slug collision or I/O failure.
    pub async fn create_tenant(&self, tenant: &Tenant) -> AppResult<TenantId> {
        sqlx::query(
            r"
            INSERT INTO tenants (id, name, slug, connection_string, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(tenant.id.to_string())
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.connection_string)
        .bind(tenant.created_at.to_rfc3339())
        .bind(tenant.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(tenant.id)
    }

    /// Get tenant by ID
    ///
    /// # Errors
    ///
    /// Returns a database error on I/O failure or a malformed row.
    pub async fn get_tenant_by_id(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE id = ?1")
            .bind(tenant_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_tenant).transpose()
    }

    /// Get tenant by slug
    ///
    /// # Errors
    ///
    /// Returns a database error on I/O failure or a malformed row.
    pub async fn get_tenant_by_slug(&self, slug: &str) -> AppResult<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE slug = ?1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_tenant).transpose()
    }

    /// Record a tenant's data-store connection string once provisioned
    ///
    /// # Errors
    ///
    /// Returns a database error on I/O failure.
    pub async fn set_connection_string(
        &self,
        tenant_id: TenantId,
        connection_string: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE tenants SET connection_string = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(connection_string)
        .bind(Utc::now().to_rfc3339())
        .bind(tenant_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Grant a user membership in a tenant
    ///
    /// # Errors
    ///
    /// Returns a database error if the grant already exists or on I/O failure.
    pub async fn add_membership(&self, membership: &TenantMembership) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO tenant_memberships (tenant_id, user_id, joined_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(membership.tenant_id.to_string())
        .bind(membership.user_id.to_string())
        .bind(membership.joined_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All tenants a user belongs to, in membership insertion order
    ///
    /// # Errors
    ///
    /// Returns a database error on I/O failure or a malformed row.
    pub async fn list_tenants_for_user(&self, user_id: Uuid) -> AppResult<Vec<Tenant>> {
        let rows = sqlx::query(
            r"
            SELECT t.* FROM tenants t
            JOIN tenant_memberships m ON m.tenant_id = t.id
            WHERE m.user_id = ?1
            ORDER BY m.joined_at, m.rowid
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_tenant).collect()
    }
}

#[async_trait]
impl TenantDirectory for MasterDatabase {
    async fn find_tenant(&self, selector: &TenantSelector) -> AppResult<Option<Tenant>> {
        let row = sqlx::query(
            r"
            SELECT * FROM tenants
            WHERE (?1 IS NOT NULL AND id = ?1) OR (?2 IS NOT NULL AND slug = ?2)
            LIMIT 1
            ",
        )
        .bind(selector.id.map(|id| id.to_string()))
        .bind(selector.slug.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_tenant).transpose()
    }

    async fn find_tenant_for_member(
        &self,
        user_id: Uuid,
        selector: &TenantSelector,
    ) -> AppResult<Option<Tenant>> {
        let row = sqlx::query(
            r"
            SELECT t.* FROM tenants t
            WHERE ((?1 IS NOT NULL AND t.id = ?1) OR (?2 IS NOT NULL AND t.slug = ?2))
              AND EXISTS (
                SELECT 1 FROM tenant_memberships m
                WHERE m.tenant_id = t.id AND m.user_id = ?3
              )
            LIMIT 1
            ",
        )
        .bind(selector.id.map(|id| id.to_string()))
        .bind(selector.slug.as_deref())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_tenant).transpose()
    }

    async fn first_membership_with_tenant(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<(TenantMembership, Tenant)>> {
        let row = sqlx::query(
            r"
            SELECT m.tenant_id AS m_tenant_id, m.user_id AS m_user_id,
                   m.joined_at AS m_joined_at, t.*
            FROM tenant_memberships m
            JOIN tenants t ON t.id = m.tenant_id
            WHERE m.user_id = ?1
            ORDER BY m.joined_at, m.rowid
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let membership = TenantMembership {
            tenant_id: TenantId::from_uuid(parse_uuid_column(&row, "m_tenant_id")?),
            user_id: parse_uuid_column(&row, "m_user_id")?,
            joined_at: parse_timestamp_column(&row, "m_joined_at")?,
        };
        let tenant = row_to_tenant(row)?;

        Ok(Some((membership, tenant)))
    }
}

/// Convert a database row to a [`Tenant`]
fn row_to_tenant(row: sqlx::sqlite::SqliteRow) -> AppResult<Tenant> {
    Ok(Tenant {
        id: TenantId::from_uuid(parse_uuid_column(&row, "id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        connection_string: row.try_get("connection_string")?,
        created_at: parse_timestamp_column(&row, "created_at")?,
        updated_at: parse_timestamp_column(&row, "updated_at")?,
    })
}

/// Convert a database row to a [`User`]
fn row_to_user(row: sqlx::sqlite::SqliteRow) -> AppResult<User> {
    let role_str: String = row.try_get("role")?;
    // Fail closed on an unknown role string rather than guessing a role
    let role = UserRole::parse(&role_str)
        .ok_or_else(|| AppError::database(format!("Unknown role in users table: {role_str}")))?;

    Ok(User {
        id: parse_uuid_column(&row, "id")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        role,
        created_at: parse_timestamp_column(&row, "created_at")?,
        last_active: parse_timestamp_column(&row, "last_active")?,
        is_active: row.try_get("is_active")?,
    })
}

fn parse_uuid_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> AppResult<Uuid> {
    let value: String = row.try_get(column)?;
    Uuid::parse_str(&value)
        .map_err(|e| AppError::database(format!("Invalid UUID in column {column}: {e}")))
}

fn parse_timestamp_column(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> AppResult<DateTime<Utc>> {
    let value: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp in column {column}: {e}")))
}
