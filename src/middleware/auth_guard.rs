// ABOUTME: Authentication gate for protected routes
// ABOUTME: Unauthenticated callers are redirected to sign-in with a return path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

use crate::auth::SessionAuthService;
use crate::config::GuardConfig;
use crate::errors::AppResult;
use crate::middleware::GuardDecision;
use http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

/// General authentication gate
///
/// Performs only the session check, not full tenant resolution, so
/// public-adjacent routes stay cheap. The originally requested path rides
/// along as a callback parameter so the caller lands back where they were
/// headed after signing in.
pub struct AuthGuard {
    auth: Arc<dyn SessionAuthService>,
    config: GuardConfig,
}

impl AuthGuard {
    /// Create a guard around the session service
    #[must_use]
    pub fn new(auth: Arc<dyn SessionAuthService>, config: GuardConfig) -> Self {
        Self { auth, config }
    }

    /// Check a request for a valid session
    ///
    /// `requested_path` is the path the caller was trying to reach; it is
    /// preserved as the callback parameter on redirect.
    ///
    /// # Errors
    ///
    /// Session-service failures propagate; they are not treated as
    /// "unauthenticated".
    pub async fn check(
        &self,
        request_headers: &HeaderMap,
        requested_path: &str,
    ) -> AppResult<GuardDecision> {
        if self.auth.session_from_headers(request_headers).await?.is_some() {
            return Ok(GuardDecision::Allow);
        }

        debug!(path = %requested_path, "Unauthenticated request, redirecting to sign-in");
        Ok(GuardDecision::redirect_with_query(
            self.config.sign_in_path.clone(),
            self.config.callback_param.clone(),
            requested_path,
        ))
    }
}
