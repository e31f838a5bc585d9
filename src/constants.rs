// ABOUTME: Application constants for headers, guard paths, and policy bounds
// ABOUTME: Central place for names shared between the resolver, guards, and tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

/// Request header names consumed by the tenant context resolver
pub mod headers {
    /// Explicit tenant selection by id (tenant switching)
    pub const TENANT_ID: &str = "x-tenant-id";
    /// Explicit tenant selection by slug (tenant switching)
    pub const TENANT_SLUG: &str = "x-tenant-slug";
}

/// Default paths used by the route guards
pub mod guard_defaults {
    /// Where unauthenticated requests are redirected
    pub const SIGN_IN_PATH: &str = "/auth/signin";
    /// Where under-privileged requests to admin routes are redirected
    pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
    /// Query parameter carrying the originally requested path
    pub const CALLBACK_PARAM: &str = "callbackUrl";
}

/// Password composition policy bounds
pub mod password_policy {
    pub const MIN_LENGTH: usize = 8;
    pub const MAX_LENGTH: usize = 100;
}

/// Environment variable names for runtime configuration
pub mod env_vars {
    pub const DATABASE_URL: &str = "EDUSTACK_DATABASE_URL";
    pub const SIGN_IN_PATH: &str = "EDUSTACK_SIGN_IN_PATH";
    pub const UNAUTHORIZED_PATH: &str = "EDUSTACK_UNAUTHORIZED_PATH";
    pub const CALLBACK_PARAM: &str = "EDUSTACK_CALLBACK_PARAM";
}

/// Default values for environment-driven configuration
pub mod defaults {
    /// Master store location when `EDUSTACK_DATABASE_URL` is unset
    pub const DATABASE_URL: &str = "sqlite:data/edustack.db";
}
