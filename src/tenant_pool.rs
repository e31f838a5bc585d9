// ABOUTME: Per-tenant data client pool with race-safe memoization
// ABOUTME: At most one client construction per tenant id, shared via Arc across requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! # Tenant Data Client Pool
//!
//! Lazily creates and caches a tenant-scoped database handle per tenant id.
//! Handles are immutable once constructed and shared by all in-flight
//! requests for that tenant; construction is single-flight per key, so a
//! thundering herd of first requests for a new tenant builds exactly one
//! handle.
//!
//! The pool is an explicit, injectable object; pass it by reference into
//! the resolver rather than reaching for ambient state.

use crate::errors::{AppError, AppResult};
use crate::models::{Tenant, TenantId};
use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Tenant-scoped handle to that tenant's data store
///
/// Opaque to the resolver; downstream handlers use [`TenantClient::pool`]
/// for tenant-isolated queries. Safe for concurrent use.
#[derive(Debug, Clone)]
pub struct TenantClient {
    tenant_id: TenantId,
    pool: SqlitePool,
}

impl TenantClient {
    /// Create a client from an already-connected pool
    #[must_use]
    pub const fn new(tenant_id: TenantId, pool: SqlitePool) -> Self {
        Self { tenant_id, pool }
    }

    /// The tenant this client is scoped to
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// The underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Constructs tenant data clients from a tenant's connection string
///
/// Injected into the pool so tests can count constructions and production
/// can swap the backing store.
#[async_trait]
pub trait TenantConnector: Send + Sync {
    /// Connect to the tenant's data store
    ///
    /// Callers guarantee `tenant.connection_string` is present.
    ///
    /// # Errors
    ///
    /// Returns a database error if the connection fails.
    async fn connect(&self, tenant: &Tenant) -> AppResult<TenantClient>;
}

/// Default connector: SQLite via the tenant's connection string
pub struct SqliteTenantConnector;

#[async_trait]
impl TenantConnector for SqliteTenantConnector {
    async fn connect(&self, tenant: &Tenant) -> AppResult<TenantClient> {
        let url = tenant
            .connection_string
            .as_deref()
            .ok_or_else(|| AppError::tenant_not_provisioned(&tenant.slug))?;

        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if url.starts_with("sqlite:") {
            format!("{url}?mode=rwc")
        } else {
            url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;
        info!(tenant_id = %tenant.id, slug = %tenant.slug, "Connected tenant data store");

        Ok(TenantClient::new(tenant.id, pool))
    }
}

/// Cache of reusable tenant data clients keyed by tenant id
pub struct TenantClientPool {
    connector: Arc<dyn TenantConnector>,
    clients: DashMap<TenantId, Arc<OnceCell<Arc<TenantClient>>>>,
}

impl TenantClientPool {
    /// Create a pool around the given connector
    #[must_use]
    pub fn new(connector: Arc<dyn TenantConnector>) -> Self {
        Self {
            connector,
            clients: DashMap::new(),
        }
    }

    /// Create a pool with the default SQLite connector
    #[must_use]
    pub fn with_sqlite_connector() -> Self {
        Self::new(Arc::new(SqliteTenantConnector))
    }

    /// Get (or lazily construct) the data client for a tenant
    ///
    /// Repeated calls for the same tenant id return the same handle.
    /// Concurrent first calls serialize on a per-key cell, so the connector
    /// runs at most once per tenant; no map lock is held across the await.
    ///
    /// # Errors
    ///
    /// Returns `TenantNotProvisioned` when the tenant has no connection
    /// string, or a database error if the connector fails. A failed
    /// construction leaves the cell empty so a later call can retry once
    /// the tenant is provisioned.
    pub async fn client_for(&self, tenant: &Tenant) -> AppResult<Arc<TenantClient>> {
        let cell = self
            .clients
            .entry(tenant.id)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let client = cell
            .get_or_try_init(|| async {
                if tenant.connection_string.is_none() {
                    return Err(AppError::tenant_not_provisioned(&tenant.slug));
                }
                debug!(tenant_id = %tenant.id, "Constructing tenant data client");
                let client = self.connector.connect(tenant).await?;
                Ok(Arc::new(client))
            })
            .await?;

        Ok(Arc::clone(client))
    }

    /// Drop a cached client so the next request reconnects
    ///
    /// Operator hook for re-provisioning; in-flight `Arc`s stay valid.
    /// Returns whether a cached entry existed.
    pub fn evict(&self, tenant_id: TenantId) -> bool {
        self.clients.remove(&tenant_id).is_some()
    }

    /// Number of tenants with a cache entry (constructed or in flight)
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the pool has no cache entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
