//! Subdomain tenant routing.
//!
//! `acme.example.com` resolves to the `acme` bundle. Bare hosts, `www`,
//! `app` and IP addresses resolve to the `default` bundle, as does any
//! slug with no stored bundle.

use std::net::IpAddr;

use tracing::{debug, warn};

use jornada_db::models::TenantConfig;
use jornada_db::store::RecordStore;

use crate::error::{ServiceError, ValidationError};

pub const DEFAULT_TENANT: &str = "default";

/// Leading labels that never name a tenant.
const RESERVED_LABELS: [&str; 2] = ["www", "app"];

/// Tenant slug carried by `host`, if any. A port suffix is ignored.
pub fn tenant_slug(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let name = host.split_once(':').map_or(host.as_str(), |(name, _)| name);
    if name.parse::<IpAddr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = name.split('.').collect();
    let is_local = labels.last() == Some(&"localhost");
    let min_labels = if is_local { 2 } else { 3 };
    if labels.len() < min_labels {
        return None;
    }

    let slug = labels[0];
    if slug.is_empty() || RESERVED_LABELS.contains(&slug) {
        return None;
    }
    Some(slug.to_string())
}

/// Check a slug an operator wants to store.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let ok = !slug.is_empty()
        && slug.len() <= 63
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok && !RESERVED_LABELS.contains(&slug) {
        Ok(())
    } else {
        Err(ValidationError::Invalid(format!(
            "{slug:?} is not a valid tenant slug (lowercase letters, digits and '-')"
        )))
    }
}

/// Resolve the tenant bundle for a request's `Host` header.
///
/// A missing bundle falls back to `default` with a single extra lookup.
pub async fn resolve_tenant(
    store: &dyn RecordStore,
    host: &str,
) -> Result<TenantConfig, ServiceError> {
    let slug = tenant_slug(host).unwrap_or_else(|| DEFAULT_TENANT.to_string());
    if let Some(tenant) = store.get_tenant(&slug).await? {
        debug!(host, slug = %tenant.slug, "resolved tenant");
        return Ok(tenant);
    }
    if slug == DEFAULT_TENANT {
        warn!(host, "default tenant bundle is missing");
        return Err(ServiceError::TenantUnavailable);
    }

    debug!(host, slug = %slug, "no bundle for tenant, using default");
    store
        .get_tenant(DEFAULT_TENANT)
        .await?
        .ok_or_else(|| {
            warn!(host, "default tenant bundle is missing");
            ServiceError::TenantUnavailable
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_is_slug() {
        assert_eq!(tenant_slug("acme.jornada.app"), Some("acme".to_string()));
        assert_eq!(tenant_slug("Acme.Jornada.App:8080"), Some("acme".to_string()));
        assert_eq!(tenant_slug("acme.localhost:3000"), Some("acme".to_string()));
    }

    #[test]
    fn bare_and_reserved_hosts_have_no_slug() {
        for host in [
            "jornada.app",
            "localhost",
            "localhost:3000",
            "www.jornada.app",
            "app.jornada.app",
            "",
        ] {
            assert_eq!(tenant_slug(host), None, "{host:?}");
        }
    }

    #[test]
    fn ip_hosts_have_no_slug() {
        for host in ["127.0.0.1", "127.0.0.1:8080", "10.1.2.3", "[::1]:8080", "::1"] {
            assert_eq!(tenant_slug(host), None, "{host:?}");
        }
    }

    #[test]
    fn slug_validation() {
        assert!(validate_slug("acme").is_ok());
        assert!(validate_slug("acme-2").is_ok());
        for bad in ["", "Acme", "-acme", "acme_co", "www", "a.b"] {
            assert!(validate_slug(bad).is_err(), "{bad:?}");
        }
    }
}
