//! Database query functions for the `tenants` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::models::{BrandingSettings, LandingCopy, TenantConfig};

/// Fetch a tenant bundle by slug.
pub async fn get_tenant(pool: &PgPool, slug: &str) -> Result<Option<TenantConfig>> {
    let tenant = sqlx::query_as::<_, TenantConfig>("SELECT * FROM tenants WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch tenant {slug:?}"))?;

    Ok(tenant)
}

/// Insert or replace a tenant bundle.
pub async fn upsert_tenant(
    pool: &PgPool,
    slug: &str,
    branding: &BrandingSettings,
    landing: &LandingCopy,
) -> Result<TenantConfig> {
    let tenant = sqlx::query_as::<_, TenantConfig>(
        "INSERT INTO tenants (slug, branding, landing) VALUES ($1, $2, $3) \
         ON CONFLICT (slug) DO UPDATE \
         SET branding = EXCLUDED.branding, landing = EXCLUDED.landing, updated_at = now() \
         RETURNING *",
    )
    .bind(slug)
    .bind(Json(branding))
    .bind(Json(landing))
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert tenant {slug:?}"))?;

    Ok(tenant)
}

/// List all tenant bundles ordered by slug.
pub async fn list_tenants(pool: &PgPool) -> Result<Vec<TenantConfig>> {
    let tenants = sqlx::query_as::<_, TenantConfig>("SELECT * FROM tenants ORDER BY slug")
        .fetch_all(pool)
        .await
        .context("failed to list tenants")?;

    Ok(tenants)
}
