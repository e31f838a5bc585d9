// ABOUTME: Integration tests for tenant context resolution
// ABOUTME: Covers implicit/explicit tenant selection, super admin bypass, and role requirements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 EduStack

mod common;

use common::{
    add_test_membership, authed_headers, authed_headers_with_slug, authed_headers_with_tenant_id,
    create_test_directory, create_test_tenant, create_test_user, create_unprovisioned_tenant,
    FailingSessionService, StaticSessionService,
};
use edustack_server::{
    database::{MasterDatabase, TenantDirectory},
    errors::{AppResult, ErrorCode},
    models::UserRole,
    tenant::TenantContextResolver,
    tenant_pool::TenantClientPool,
};
use http::{HeaderMap, HeaderValue};
use std::sync::Arc;

fn resolver_with(
    database: &Arc<MasterDatabase>,
    sessions: StaticSessionService,
) -> TenantContextResolver {
    let directory: Arc<dyn TenantDirectory> = database.clone();
    TenantContextResolver::new(
        Arc::new(sessions),
        directory,
        Arc::new(TenantClientPool::with_sqlite_connector()),
    )
}

#[tokio::test]
async fn test_no_session_resolves_to_none() -> AppResult<()> {
    let database = create_test_directory().await?;
    let resolver = resolver_with(&database, StaticSessionService::new());

    let context = resolver.resolve(&HeaderMap::new()).await?;
    assert!(context.is_none());

    // A bogus token is the same terminal as no header at all
    let context = resolver.resolve(&authed_headers("not-a-real-token")).await?;
    assert!(context.is_none());
    Ok(())
}

#[tokio::test]
async fn test_session_service_failure_propagates() -> AppResult<()> {
    let database = create_test_directory().await?;
    let directory: Arc<dyn TenantDirectory> = database.clone();
    let resolver = TenantContextResolver::new(
        Arc::new(FailingSessionService),
        directory,
        Arc::new(TenantClientPool::with_sqlite_connector()),
    );

    let result = resolver.resolve(&HeaderMap::new()).await;
    let err = result.expect_err("backend outage must not look like a missing session");
    assert_eq!(err.code, ErrorCode::InternalError);
    Ok(())
}

#[tokio::test]
async fn test_implicit_mode_without_membership_yields_tenantless_context() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "new@example.com", UserRole::User).await?;
    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user.clone()),
    );

    let context = resolver
        .resolve(&authed_headers("tok"))
        .await?
        .expect("authenticated caller always gets a context");

    assert_eq!(context.user.id, user.id);
    assert!(context.tenant.is_none());
    assert!(context.client.is_none());
    assert!(!context.is_super_admin);
    assert!(!context.has_tenant());
    Ok(())
}

#[tokio::test]
async fn test_implicit_mode_resolves_first_membership() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::TenantAdmin).await?;
    let first = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    let second = create_test_tenant(&database, "Beta School", "beta-school").await?;
    add_test_membership(&database, &first, &user).await?;
    add_test_membership(&database, &second, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    let context = resolver
        .resolve(&authed_headers("tok"))
        .await?
        .expect("context");

    // Earliest membership wins, not the most recent
    assert_eq!(context.tenant_id(), Some(first.id));
    let client = context.client.expect("provisioned tenant yields a client");
    assert_eq!(client.tenant_id(), first.id);
    Ok(())
}

#[tokio::test]
async fn test_explicit_slug_switch_for_member() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::User).await?;
    let home = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    let other = create_test_tenant(&database, "Beta School", "beta-school").await?;
    add_test_membership(&database, &home, &user).await?;
    add_test_membership(&database, &other, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    let context = resolver
        .resolve(&authed_headers_with_slug("tok", "beta-school"))
        .await?
        .expect("context");

    assert_eq!(context.tenant_id(), Some(other.id));
    Ok(())
}

#[tokio::test]
async fn test_explicit_id_switch_for_member() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::User).await?;
    let tenant = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    add_test_membership(&database, &tenant, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    let context = resolver
        .resolve(&authed_headers_with_tenant_id("tok", &tenant.id.to_string()))
        .await?
        .expect("context");

    assert_eq!(context.tenant_id(), Some(tenant.id));
    Ok(())
}

#[tokio::test]
async fn test_explicit_switch_to_non_member_tenant_is_lenient() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::TenantAdmin).await?;
    let home = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    create_test_tenant(&database, "Rival School", "rival-school").await?;
    add_test_membership(&database, &home, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    // Not an error: the caller stays authenticated but gets no tenant
    let context = resolver
        .resolve(&authed_headers_with_slug("tok", "rival-school"))
        .await?
        .expect("context");

    assert!(context.tenant.is_none());
    assert!(context.client.is_none());
    assert!(!context.is_super_admin);
    Ok(())
}

#[tokio::test]
async fn test_super_admin_switches_without_membership() -> AppResult<()> {
    let database = create_test_directory().await?;
    let admin = create_test_user(&database, "ops@example.com", UserRole::SuperAdmin).await?;
    let tenant = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    // Deliberately no membership row for the admin

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", admin),
    );

    let context = resolver
        .resolve(&authed_headers_with_slug("tok", "acme-prep"))
        .await?
        .expect("context");

    assert!(context.is_super_admin);
    assert_eq!(context.tenant_id(), Some(tenant.id));
    assert!(context.client.is_some());
    Ok(())
}

#[tokio::test]
async fn test_malformed_explicit_id_does_not_fall_back_to_primary() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::User).await?;
    let home = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    add_test_membership(&database, &home, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    let context = resolver
        .resolve(&authed_headers_with_tenant_id("tok", "not-a-uuid"))
        .await?
        .expect("context");

    // A typo'd switch must not silently land the caller in their home tenant
    assert!(context.tenant.is_none());
    Ok(())
}

#[tokio::test]
async fn test_non_utf8_explicit_header_does_not_fall_back_to_primary() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::User).await?;
    let home = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    add_test_membership(&database, &home, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    // obs-text header bytes are legal HTTP but unreadable as UTF-8; the
    // request is still an explicit switch, not an implicit one
    let mut headers = authed_headers("tok");
    headers.insert(
        "x-tenant-id",
        HeaderValue::from_bytes(b"\xff\xfe").unwrap(),
    );

    let context = resolver.resolve(&headers).await?.expect("context");
    assert!(context.tenant.is_none());
    assert!(context.client.is_none());
    Ok(())
}

#[tokio::test]
async fn test_unprovisioned_tenant_surfaces_service_unavailable() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::User).await?;
    let tenant = create_unprovisioned_tenant(&database, "Acme Prep", "acme-prep").await?;
    add_test_membership(&database, &tenant, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    let err = resolver
        .resolve(&authed_headers("tok"))
        .await
        .expect_err("unprovisioned tenant is a hard failure");
    assert_eq!(err.code, ErrorCode::TenantNotProvisioned);
    assert_eq!(err.code.http_status(), 503);
    Ok(())
}

#[tokio::test]
async fn test_has_role_matches_exact_role_only() -> AppResult<()> {
    let database = create_test_directory().await?;
    let admin = create_test_user(&database, "head@example.com", UserRole::TenantAdmin).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", admin),
    );

    assert!(
        resolver
            .has_role(&authed_headers("tok"), UserRole::TenantAdmin)
            .await?
    );
    assert!(
        !resolver
            .has_role(&authed_headers("tok"), UserRole::SuperAdmin)
            .await?
    );
    // No session flattens to false, not an error
    assert!(
        !resolver
            .has_role(&HeaderMap::new(), UserRole::TenantAdmin)
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn test_require_role_rejects_with_required_role() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "student@example.com", UserRole::User).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user.clone()),
    );

    let context = resolver
        .require_role(&authed_headers("tok"), UserRole::User)
        .await?;
    assert_eq!(context.user.id, user.id);

    let err = resolver
        .require_role(&authed_headers("tok"), UserRole::SuperAdmin)
        .await
        .expect_err("wrong role must be rejected");
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    assert_eq!(err.context.details["required_role"], "SUPER_ADMIN");

    let err = resolver
        .require_role(&HeaderMap::new(), UserRole::User)
        .await
        .expect_err("missing session must be rejected");
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    Ok(())
}

#[tokio::test]
async fn test_require_context_maps_missing_session_to_auth_required() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "student@example.com", UserRole::User).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user.clone()),
    );

    let context = resolver.require_context(&authed_headers("tok")).await?;
    assert_eq!(context.user.id, user.id);

    let err = resolver
        .require_context(&HeaderMap::new())
        .await
        .expect_err("anonymous caller must be rejected");
    assert_eq!(err.code, ErrorCode::AuthRequired);
    assert_eq!(err.code.http_status(), 401);
    Ok(())
}

#[tokio::test]
async fn test_require_tenant_on_tenantless_context() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "new@example.com", UserRole::User).await?;
    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    let context = resolver
        .resolve(&authed_headers("tok"))
        .await?
        .expect("context");

    let err = context
        .require_tenant()
        .expect_err("no membership means no tenant to require");
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    Ok(())
}

#[tokio::test]
async fn test_require_tenant_returns_resolved_tenant() -> AppResult<()> {
    let database = create_test_directory().await?;
    let user = create_test_user(&database, "teacher@example.com", UserRole::User).await?;
    let tenant = create_test_tenant(&database, "Acme Prep", "acme-prep").await?;
    add_test_membership(&database, &tenant, &user).await?;

    let resolver = resolver_with(
        &database,
        StaticSessionService::new().with_session("tok", user),
    );

    let context = resolver
        .resolve(&authed_headers("tok"))
        .await?
        .expect("context");
    assert_eq!(context.require_tenant()?.id, tenant.id);
    Ok(())
}
