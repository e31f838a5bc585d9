// ABOUTME: Library entry point for the EduStack tenant authorization core
// ABOUTME: Tenant context resolution, role permissions, and route guards for a multi-tenant platform
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

#![deny(unsafe_code)]

//! # EduStack Server — tenant context & authorization core
//!
//! The security boundary of a multi-tenant education platform. On every
//! authenticated request this crate determines who the caller is, which
//! tenant's data they may operate against (possibly a different tenant than
//! their home one), and hands back a ready-to-use, tenant-scoped data
//! client, while letting the cross-tenant super admin bypass membership
//! checks.
//!
//! ## Architecture
//!
//! - **Permissions**: static role → permission table, fail-closed
//! - **Password**: composition policy + bcrypt hashing
//! - **Auth**: seam for the external session authentication service
//! - **Database**: master-store tenant directory (tenants, users, memberships)
//! - **Tenant pool**: per-tenant data clients, single-flight construction
//! - **Tenant**: the request-scoped [`tenant::TenantContext`] resolver
//! - **Middleware**: transport-agnostic route guards
//!
//! ## Example
//!
//! ```rust,no_run
//! use edustack_server::config::MasterDatabaseConfig;
//! use edustack_server::database::MasterDatabase;
//! use edustack_server::tenant_pool::TenantClientPool;
//! use std::sync::Arc;
//!
//! # async fn example() -> edustack_server::errors::AppResult<()> {
//! let config = MasterDatabaseConfig::from_env();
//! let directory = Arc::new(MasterDatabase::new(&config.url).await?);
//! let pool = Arc::new(TenantClientPool::with_sqlite_connector());
//! // wire directory + pool + your session service into a TenantContextResolver
//! # Ok(())
//! # }
//! ```

/// Session authentication service seam
pub mod auth;

/// Environment-based configuration
pub mod config;

/// Application constants
pub mod constants;

/// Master-store tenant directory
pub mod database;

/// Unified error handling with standard error codes
pub mod errors;

/// Logging configuration and setup
pub mod logging;

/// Route guards evaluated before handlers run
pub mod middleware;

/// Identity and tenancy models
pub mod models;

/// Password composition policy and hashing
pub mod password;

/// Role-based permission checks
pub mod permissions;

/// Tenant context resolution
pub mod tenant;

/// Per-tenant data client pool
pub mod tenant_pool;
