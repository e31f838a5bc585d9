// ABOUTME: Shared test utilities and fixtures for integration tests
// ABOUTME: In-memory master store, stub session service, and counting tenant connector
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack
#![allow(dead_code)]

//! Shared test utilities for `edustack_server`
//!
//! Common setup to reduce duplication across integration tests.

use async_trait::async_trait;
use edustack_server::{
    auth::{AuthenticatedSession, SessionAuthService},
    database::MasterDatabase,
    errors::{AppError, AppResult},
    models::{Session, Tenant, TenantMembership, User, UserRole},
    tenant_pool::{TenantClient, TenantConnector},
};
use http::{HeaderMap, HeaderValue};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard in-memory master store setup
pub async fn create_test_directory() -> AppResult<Arc<MasterDatabase>> {
    init_test_logging();
    let database = Arc::new(MasterDatabase::new("sqlite::memory:").await?);
    Ok(database)
}

/// Create a test user with the given role, registered in the master store
pub async fn create_test_user(
    database: &MasterDatabase,
    email: &str,
    role: UserRole,
) -> AppResult<User> {
    let user = User::new(email.to_string(), Some("Test User".to_string()), role);
    database.create_user(&user).await?;
    Ok(user)
}

/// Create a provisioned test tenant (in-memory tenant store)
pub async fn create_test_tenant(
    database: &MasterDatabase,
    name: &str,
    slug: &str,
) -> AppResult<Tenant> {
    let mut tenant = Tenant::new(name.to_string(), slug.to_string());
    tenant.connection_string = Some("sqlite::memory:".to_string());
    database.create_tenant(&tenant).await?;
    Ok(tenant)
}

/// Create a tenant whose data store has not been provisioned yet
pub async fn create_unprovisioned_tenant(
    database: &MasterDatabase,
    name: &str,
    slug: &str,
) -> AppResult<Tenant> {
    let tenant = Tenant::new(name.to_string(), slug.to_string());
    database.create_tenant(&tenant).await?;
    Ok(tenant)
}

/// Grant `user` membership in `tenant`
pub async fn add_test_membership(
    database: &MasterDatabase,
    tenant: &Tenant,
    user: &User,
) -> AppResult<()> {
    database
        .add_membership(&TenantMembership::new(tenant.id, user.id))
        .await
}

/// Stub session service mapping bearer tokens to pre-registered sessions
///
/// The resolver treats the session service as opaque, so tests only need a
/// lookup table: a matching `Authorization: Bearer <token>` header yields
/// the registered session, anything else yields no session.
#[derive(Default)]
pub struct StaticSessionService {
    sessions: HashMap<String, AuthenticatedSession>,
}

impl StaticSessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for `user`, reachable via `token`
    #[must_use]
    pub fn with_session(mut self, token: &str, user: User) -> Self {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        };
        self.sessions
            .insert(token.to_string(), AuthenticatedSession { user, session });
        self
    }
}

#[async_trait]
impl SessionAuthService for StaticSessionService {
    async fn session_from_headers(
        &self,
        headers: &HeaderMap,
    ) -> AppResult<Option<AuthenticatedSession>> {
        let token = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "));

        Ok(token.and_then(|t| self.sessions.get(t).cloned()))
    }
}

/// Session service whose backing store is down
pub struct FailingSessionService;

#[async_trait]
impl SessionAuthService for FailingSessionService {
    async fn session_from_headers(
        &self,
        _headers: &HeaderMap,
    ) -> AppResult<Option<AuthenticatedSession>> {
        Err(AppError::internal("session service unavailable"))
    }
}

/// Tenant connector that counts constructions
///
/// Hands out real in-memory SQLite clients; the short sleep widens the
/// race window so single-flight violations actually show up.
#[derive(Default)]
pub struct CountingConnector {
    constructions: AtomicUsize,
}

impl CountingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantConnector for CountingConnector {
    async fn connect(&self, tenant: &Tenant) -> AppResult<TenantClient> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Ok(TenantClient::new(tenant.id, pool))
    }
}

/// Headers for an authenticated request
pub fn authed_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

/// Headers for an authenticated request with an explicit tenant slug
pub fn authed_headers_with_slug(token: &str, slug: &str) -> HeaderMap {
    let mut headers = authed_headers(token);
    headers.insert("x-tenant-slug", HeaderValue::from_str(slug).unwrap());
    headers
}

/// Headers for an authenticated request with an explicit tenant id
pub fn authed_headers_with_tenant_id(token: &str, tenant_id: &str) -> HeaderMap {
    let mut headers = authed_headers(token);
    headers.insert("x-tenant-id", HeaderValue::from_str(tenant_id).unwrap());
    headers
}
