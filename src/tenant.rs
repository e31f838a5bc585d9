// ABOUTME: Tenant context resolution combining session, tenant-switch headers, and membership
// ABOUTME: Produces a request-scoped TenantContext with a ready-to-use tenant data client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! # Tenant Context Resolver
//!
//! The central algorithm of this crate: on every authenticated request,
//! determine who the caller is, which tenant they may act against, and hand
//! back a tenant-scoped data client, while letting the cross-tenant super
//! admin bypass membership checks.
//!
//! Resolution runs fully per request (no caching across requests) and
//! holds no mutable shared state; the only shared resource is the injected
//! [`TenantClientPool`].

use crate::auth::SessionAuthService;
use crate::constants::headers;
use crate::database::TenantDirectory;
use crate::errors::{AppError, AppResult};
use crate::models::{Session, Tenant, TenantId, User, UserRole};
use crate::permissions::is_super_admin;
use crate::tenant_pool::{TenantClient, TenantClientPool};
use http::HeaderMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Tenant-switch hints read from the request headers
///
/// Either hint may be absent; at most one needs to match. Presence of
/// either header puts the request in explicit mode even when the id value
/// is unusable: a typo'd explicit switch must not silently fall back to
/// the caller's primary tenant.
#[derive(Debug, Clone, Default)]
pub struct TenantSelector {
    /// Explicit tenant id, when the header carried a well-formed UUID
    pub id: Option<TenantId>,
    /// Explicit tenant slug
    pub slug: Option<String>,
    explicit: bool,
}

impl TenantSelector {
    /// Read the tenant-switch headers from a request
    #[must_use]
    pub fn from_headers(request_headers: &HeaderMap) -> Self {
        // Header presence alone decides the mode; an unreadable value
        // (bad UTF-8, malformed UUID) must not demote the request to
        // implicit mode.
        let explicit = request_headers.contains_key(headers::TENANT_ID)
            || request_headers.contains_key(headers::TENANT_SLUG);

        let id_header = request_headers
            .get(headers::TENANT_ID)
            .and_then(|v| v.to_str().ok());
        let slug = request_headers
            .get(headers::TENANT_SLUG)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);

        let id = id_header.and_then(|raw| match raw.parse::<TenantId>() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(tenant_id = %raw, error = %e, "Invalid tenant ID format in header");
                None
            }
        });

        Self { id, slug, explicit }
    }

    /// Select a tenant by id
    #[must_use]
    pub fn by_id(id: TenantId) -> Self {
        Self {
            id: Some(id),
            slug: None,
            explicit: true,
        }
    }

    /// Select a tenant by slug
    #[must_use]
    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self {
            id: None,
            slug: Some(slug.into()),
            explicit: true,
        }
    }

    /// Whether the request asked for a specific tenant
    #[must_use]
    pub const fn is_explicit(&self) -> bool {
        self.explicit
    }
}

/// The resolved bundle of identity, selected tenant, and data client for
/// one request
///
/// Constructed fresh per request, never persisted.
///
/// Invariants:
/// - `tenant.is_none()` implies `client.is_none()`
/// - `is_super_admin` is a function of `user.role` only, independent of
///   the tenant resolution outcome
#[derive(Debug, Clone)]
pub struct TenantContext {
    /// The authenticated caller
    pub user: User,
    /// The session proving the authentication
    pub session: Session,
    /// The tenant the caller may act against, when one resolved
    pub tenant: Option<Tenant>,
    /// Data client scoped to `tenant`
    pub client: Option<Arc<TenantClient>>,
    /// Whether the caller holds the cross-tenant super admin role
    pub is_super_admin: bool,
}

impl TenantContext {
    /// The resolved tenant's id, if any
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant.as_ref().map(|t| t.id)
    }

    /// Whether a tenant (and therefore a data client) resolved
    #[must_use]
    pub const fn has_tenant(&self) -> bool {
        self.tenant.is_some()
    }

    /// The resolved tenant, for handlers that cannot run without one
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when no tenant resolved for this request.
    pub fn require_tenant(&self) -> AppResult<&Tenant> {
        self.tenant
            .as_ref()
            .ok_or_else(|| AppError::not_found("Tenant").with_user_id(self.user.id))
    }
}

/// Resolves a request into a [`TenantContext`]
///
/// All collaborators are injected; the resolver itself is stateless and
/// safe to share across concurrent requests.
pub struct TenantContextResolver {
    auth: Arc<dyn SessionAuthService>,
    directory: Arc<dyn TenantDirectory>,
    pool: Arc<TenantClientPool>,
}

impl TenantContextResolver {
    /// Create a resolver around its collaborators
    #[must_use]
    pub fn new(
        auth: Arc<dyn SessionAuthService>,
        directory: Arc<dyn TenantDirectory>,
        pool: Arc<TenantClientPool>,
    ) -> Self {
        Self {
            auth,
            directory,
            pool,
        }
    }

    /// Resolve the tenant context for a request
    ///
    /// `Ok(None)` is the single unauthenticated terminal. An authenticated
    /// caller always gets a context; a tenant that could not be resolved
    /// (none requested and no membership, or an explicit request the caller
    /// has no membership for) yields a context with `tenant: None`, not an
    /// error. Callers needing a tenant must check for this explicitly.
    ///
    /// # Errors
    ///
    /// Session-service or directory I/O failures propagate unmodified, as
    /// does `TenantNotProvisioned` from the client pool. Authorization
    /// outcomes are never errors here.
    #[tracing::instrument(
        skip(self, request_headers),
        fields(
            user_id = tracing::field::Empty,
            tenant_id = tracing::field::Empty,
        )
    )]
    pub async fn resolve(&self, request_headers: &HeaderMap) -> AppResult<Option<TenantContext>> {
        let Some(authenticated) = self.auth.session_from_headers(request_headers).await? else {
            debug!("No valid session, yielding null tenant context");
            return Ok(None);
        };
        let user = authenticated.user;
        let session = authenticated.session;

        tracing::Span::current().record("user_id", user.id.to_string());

        let super_admin = is_super_admin(Some(user.role));

        let selector = TenantSelector::from_headers(request_headers);
        let tenant = if selector.is_explicit() {
            self.resolve_explicit_tenant(user.id, &selector, super_admin)
                .await?
        } else {
            self.resolve_primary_tenant(user.id).await?
        };

        if let Some(ref tenant) = tenant {
            tracing::Span::current().record("tenant_id", tenant.id.to_string());
        }

        let client = match tenant {
            Some(ref tenant) => Some(self.pool.client_for(tenant).await?),
            None => None,
        };

        Ok(Some(TenantContext {
            user,
            session,
            tenant,
            client,
            is_super_admin: super_admin,
        }))
    }

    /// Resolve an explicitly requested tenant (tenant switching)
    ///
    /// Non-super-admin callers are restricted to tenants they hold a
    /// membership for; a request for any other tenant quietly resolves to
    /// `None` rather than an explicit denial. That leniency is confined to
    /// this function so a stricter variant (returning `PermissionDenied`)
    /// can be swapped in without touching call sites.
    async fn resolve_explicit_tenant(
        &self,
        user_id: Uuid,
        selector: &TenantSelector,
        super_admin: bool,
    ) -> AppResult<Option<Tenant>> {
        let tenant = if super_admin {
            self.directory.find_tenant(selector).await?
        } else {
            self.directory
                .find_tenant_for_member(user_id, selector)
                .await?
        };

        if tenant.is_none() {
            debug!(
                user_id = %user_id,
                "Requested tenant not found or not accessible to caller"
            );
        }

        Ok(tenant)
    }

    /// Fall back to the caller's primary tenant (first membership)
    async fn resolve_primary_tenant(&self, user_id: Uuid) -> AppResult<Option<Tenant>> {
        let membership = self.directory.first_membership_with_tenant(user_id).await?;
        match membership {
            Some((_, tenant)) => Ok(Some(tenant)),
            None => {
                debug!(user_id = %user_id, "User does not belong to any tenant");
                Ok(None)
            }
        }
    }

    /// Resolve the context, requiring an authenticated caller
    ///
    /// For transports that want a 401 instead of a `None` they have to
    /// branch on.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when there is no valid session; resolution
    /// failures propagate unmodified.
    pub async fn require_context(&self, request_headers: &HeaderMap) -> AppResult<TenantContext> {
        self.resolve(request_headers)
            .await?
            .ok_or_else(AppError::auth_required)
    }

    /// Whether the caller is authenticated and holds exactly `role`
    ///
    /// `Ok(false)` covers both "no session" and "role mismatch".
    ///
    /// # Errors
    ///
    /// Resolution failures propagate; they are not flattened into `false`.
    pub async fn has_role(&self, request_headers: &HeaderMap, role: UserRole) -> AppResult<bool> {
        let context = self.resolve(request_headers).await?;
        Ok(context.is_some_and(|ctx| ctx.user.role == role))
    }

    /// Resolve the context, requiring the caller to hold exactly `role`
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` (carrying the required role) when there
    /// is no session or the role does not match; resolution failures
    /// propagate unmodified.
    pub async fn require_role(
        &self,
        request_headers: &HeaderMap,
        role: UserRole,
    ) -> AppResult<TenantContext> {
        match self.resolve(request_headers).await? {
            Some(context) if context.user.role == role => Ok(context),
            Some(context) => {
                warn!(
                    user_id = %context.user.id,
                    actual = %context.user.role,
                    required = %role,
                    "Role requirement not met"
                );
                Err(AppError::unauthorized(role).with_user_id(context.user.id))
            }
            None => Err(AppError::unauthorized(role)),
        }
    }
}
