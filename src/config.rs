// ABOUTME: Environment-based configuration for guard paths and the master store
// ABOUTME: Typed defaults with environment-variable overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

//! Environment-based configuration management

use crate::constants::{defaults, env_vars, guard_defaults};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Paths and parameter names used by the route guards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuardConfig {
    /// Where unauthenticated requests are redirected
    pub sign_in_path: String,
    /// Where under-privileged requests to admin routes are redirected
    pub unauthorized_path: String,
    /// Query parameter carrying the originally requested path
    pub callback_param: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            sign_in_path: guard_defaults::SIGN_IN_PATH.into(),
            unauthorized_path: guard_defaults::UNAUTHORIZED_PATH.into(),
            callback_param: guard_defaults::CALLBACK_PARAM.into(),
        }
    }
}

impl GuardConfig {
    /// Load guard configuration from environment variables, falling back
    /// to the defaults for anything unset
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the resulting configuration is invalid.
    pub fn from_env() -> AppResult<Self> {
        let base = Self::default();
        let config = Self {
            sign_in_path: env::var(env_vars::SIGN_IN_PATH).unwrap_or(base.sign_in_path),
            unauthorized_path: env::var(env_vars::UNAUTHORIZED_PATH)
                .unwrap_or(base.unauthorized_path),
            callback_param: env::var(env_vars::CALLBACK_PARAM).unwrap_or(base.callback_param),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate redirect targets and the callback parameter name
    ///
    /// Relative redirect paths would resolve against whatever route the
    /// guard fired on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the offending value.
    pub fn validate(&self) -> AppResult<()> {
        for (name, path) in [
            ("sign-in", &self.sign_in_path),
            ("unauthorized", &self.unauthorized_path),
        ] {
            if !path.starts_with('/') {
                return Err(AppError::config(format!(
                    "Guard {name} path must be absolute, got {path:?}"
                )));
            }
        }
        if self.callback_param.is_empty() {
            return Err(AppError::config("Guard callback parameter must not be empty"));
        }
        Ok(())
    }
}

/// Master store location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasterDatabaseConfig {
    /// Connection URL for the master relational store
    pub url: String,
}

impl Default for MasterDatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.into(),
        }
    }
}

impl MasterDatabaseConfig {
    /// Load the master store URL from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.into()),
        }
    }
}
