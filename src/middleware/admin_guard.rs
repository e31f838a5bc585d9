// ABOUTME: Super-admin authorization gate for platform administration routes
// ABOUTME: Redirects to the unauthorized page on missing session or insufficient role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

use crate::auth::SessionAuthService;
use crate::config::GuardConfig;
use crate::errors::AppResult;
use crate::middleware::GuardDecision;
use crate::models::UserRole;
use http::HeaderMap;
use std::sync::Arc;
use tracing::warn;

/// Gate for routes restricted to the cross-tenant super admin
///
/// Unlike [`crate::middleware::AuthGuard`] this redirects to a fixed
/// unauthorized page and deliberately does not preserve the requested path:
/// a caller who lacks the role will not become a super admin by signing in
/// again, so there is nothing to return to.
pub struct SuperAdminGuard {
    auth: Arc<dyn SessionAuthService>,
    config: GuardConfig,
}

impl SuperAdminGuard {
    /// Create a guard around the session service
    #[must_use]
    pub fn new(auth: Arc<dyn SessionAuthService>, config: GuardConfig) -> Self {
        Self { auth, config }
    }

    /// Check a request for a valid session with the super admin role
    ///
    /// # Errors
    ///
    /// Session-service failures propagate; they are not treated as
    /// "unauthorized".
    pub async fn check(&self, request_headers: &HeaderMap) -> AppResult<GuardDecision> {
        match self.auth.session_from_headers(request_headers).await? {
            Some(authenticated) if authenticated.user.role == UserRole::SuperAdmin => {
                Ok(GuardDecision::Allow)
            }
            Some(authenticated) => {
                warn!(
                    user_id = %authenticated.user.id,
                    role = %authenticated.user.role,
                    "Non-super-admin request to admin route"
                );
                Ok(GuardDecision::redirect(self.config.unauthorized_path.clone()))
            }
            None => Ok(GuardDecision::redirect(self.config.unauthorized_path.clone())),
        }
    }
}
