// ABOUTME: Session authentication service seam consumed by the resolver and guards
// ABOUTME: Headers in, authenticated user and session out; credentials stay opaque
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! # Session Authentication Service
//!
//! The session token format and its issuance/verification live in an
//! external service; this crate only consumes its output through
//! [`SessionAuthService`]. The credential travels opaquely in the request
//! headers (cookie or bearer-style token) and is never parsed here.

use crate::errors::AppResult;
use crate::models::{Session, User};
use async_trait::async_trait;
use http::HeaderMap;

/// A validated session together with the user it authenticates
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// The authenticated user
    pub user: User,
    /// The session proving the authentication
    pub session: Session,
}

/// External collaborator that validates request credentials
///
/// Implementations are expected to be cheap to clone behind an `Arc` and
/// safe to share across concurrent requests.
#[async_trait]
pub trait SessionAuthService: Send + Sync {
    /// Validate the credential carried in `headers`
    ///
    /// `Ok(None)` means "no valid session"; the caller decides whether
    /// that is a redirect, a `null` context, or acceptable.
    ///
    /// # Errors
    ///
    /// Only transport/service failures are errors; a missing or invalid
    /// credential is `Ok(None)`.
    async fn session_from_headers(
        &self,
        headers: &HeaderMap,
    ) -> AppResult<Option<AuthenticatedSession>>;
}
