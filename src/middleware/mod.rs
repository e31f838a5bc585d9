// ABOUTME: Request-interception guards evaluated before handlers run
// ABOUTME: Transport-agnostic decisions the HTTP layer turns into pass-through or redirects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! # Route Guards
//!
//! Guards return a tagged [`GuardDecision`] instead of an HTTP response, so
//! they stay unit-testable without a real HTTP stack. The transport layer
//! interprets `Redirect` into whatever its framework wants.

pub mod admin_guard;
pub mod auth_guard;

pub use admin_guard::SuperAdminGuard;
pub use auth_guard::AuthGuard;

/// Outcome of a route guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the request through unchanged
    Allow,
    /// Send the caller elsewhere before the handler runs
    Redirect {
        /// Target path
        path: String,
        /// Query parameters to append (percent-encoded by [`GuardDecision::location`])
        query: Vec<(String, String)>,
    },
}

impl GuardDecision {
    /// Build a redirect with no query parameters
    #[must_use]
    pub fn redirect(path: impl Into<String>) -> Self {
        Self::Redirect {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Build a redirect with a single query parameter
    #[must_use]
    pub fn redirect_with_query(
        path: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Redirect {
            path: path.into(),
            query: vec![(key.into(), value.into())],
        }
    }

    /// Whether the guard let the request through
    #[must_use]
    pub const fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Render the redirect target as a percent-encoded location string
    ///
    /// Returns `None` for [`GuardDecision::Allow`].
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::Redirect { path, query } => {
                if query.is_empty() {
                    return Some(path.clone());
                }
                let encoded = query
                    .iter()
                    .map(|(k, v)| {
                        format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
                    })
                    .collect::<Vec<_>>()
                    .join("&");
                Some(format!("{path}?{encoded}"))
            }
        }
    }
}
