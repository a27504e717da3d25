//! Host-based tenant resolution against the in-memory store.

use jornada_core::ServiceError;
use jornada_core::tenant::resolve_tenant;
use jornada_db::models::{BrandingSettings, LandingCopy};
use jornada_db::store::{MemoryStore, RecordStore};

#[tokio::test]
async fn unknown_subdomain_falls_back_to_default_once() {
    let store = MemoryStore::with_default_tenant();

    let tenant = resolve_tenant(&store, "acme.jornada.app").await.unwrap();
    assert_eq!(tenant.slug, "default");
    // One lookup for "acme", one for "default".
    assert_eq!(store.tenant_lookups(), 2);
}

#[tokio::test]
async fn known_subdomain_resolves_directly() {
    let store = MemoryStore::with_default_tenant();
    let branding = BrandingSettings {
        program_name: "Acme Academy".to_string(),
        ..BrandingSettings::default()
    };
    store
        .upsert_tenant("acme", &branding, &LandingCopy::default())
        .await
        .unwrap();

    let tenant = resolve_tenant(&store, "acme.jornada.app:443").await.unwrap();
    assert_eq!(tenant.slug, "acme");
    assert_eq!(tenant.branding.0.program_name, "Acme Academy");
    assert_eq!(store.tenant_lookups(), 1);
}

#[tokio::test]
async fn bare_host_uses_default_with_one_lookup() {
    let store = MemoryStore::with_default_tenant();
    let tenant = resolve_tenant(&store, "jornada.app").await.unwrap();
    assert_eq!(tenant.slug, "default");
    assert_eq!(store.tenant_lookups(), 1);
}

#[tokio::test]
async fn missing_default_is_unavailable() {
    let store = MemoryStore::new();
    assert!(matches!(
        resolve_tenant(&store, "acme.jornada.app").await,
        Err(ServiceError::TenantUnavailable)
    ));
    assert_eq!(store.tenant_lookups(), 2);

    assert!(matches!(
        resolve_tenant(&store, "localhost").await,
        Err(ServiceError::TenantUnavailable)
    ));
    assert_eq!(store.tenant_lookups(), 3);
}
