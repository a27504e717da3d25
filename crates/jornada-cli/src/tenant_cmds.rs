//! Operator-mode CLI handlers for `jornada tenant` subcommands.
//!
//! - `jornada tenant set <slug> [--field value ...]` -- create or update a bundle
//! - `jornada tenant list`                           -- list bundles

use anyhow::{Context, Result};

use jornada_core::tenant::validate_slug;
use jornada_core::users::validate_branding;
use jornada_db::models::{BrandingSettings, LandingCopy, TenantConfig};
use jornada_db::store::RecordStore;

use crate::TenantCommands;

/// Field overrides for `tenant set`. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct BundleEdits {
    pub program_name: Option<String>,
    pub expert_name: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub call_to_action: Option<String>,
    /// Replaces the bullets when non-empty.
    pub highlights: Vec<String>,
}

impl BundleEdits {
    fn apply(self, branding: &mut BrandingSettings, landing: &mut LandingCopy) {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(v) = value {
                *target = v;
            }
        }
        set(&mut branding.program_name, self.program_name);
        set(&mut branding.expert_name, self.expert_name);
        set(&mut branding.primary_color, self.primary_color);
        set(&mut branding.secondary_color, self.secondary_color);
        set(&mut branding.accent_color, self.accent_color);
        if let Some(url) = self.logo_url {
            branding.logo_url = Some(url).filter(|u| !u.is_empty());
        }
        set(&mut landing.headline, self.headline);
        set(&mut landing.subheadline, self.subheadline);
        set(&mut landing.call_to_action, self.call_to_action);
        if !self.highlights.is_empty() {
            landing.highlights = self.highlights;
        }
    }
}

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_tenant_command(command: TenantCommands, store: &dyn RecordStore) -> Result<()> {
    match command {
        TenantCommands::Set {
            slug,
            program_name,
            expert_name,
            logo_url,
            primary_color,
            secondary_color,
            accent_color,
            headline,
            subheadline,
            call_to_action,
            highlights,
        } => {
            let edits = BundleEdits {
                program_name,
                expert_name,
                logo_url,
                primary_color,
                secondary_color,
                accent_color,
                headline,
                subheadline,
                call_to_action,
                highlights,
            };
            let tenant = set_tenant(store, &slug, edits).await?;
            println!("Tenant {} saved.", tenant.slug);
            print!("{}", format_tenant(&tenant));
            Ok(())
        }
        TenantCommands::List => {
            let tenants = store.list_tenants().await?;
            if tenants.is_empty() {
                println!("No tenants. Run `jornada db-init` to seed the default bundle.");
                return Ok(());
            }
            println!("{:<20} {:<28} UPDATED", "SLUG", "PROGRAM");
            for t in &tenants {
                println!(
                    "{:<20} {:<28} {}",
                    t.slug,
                    t.branding.0.program_name,
                    t.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
    }
}

// -----------------------------------------------------------------------
// jornada tenant set
// -----------------------------------------------------------------------

/// Overlay `edits` on the existing bundle (or the defaults) and save it.
pub async fn set_tenant(
    store: &dyn RecordStore,
    slug: &str,
    edits: BundleEdits,
) -> Result<TenantConfig> {
    validate_slug(slug)?;

    let (mut branding, mut landing) = match store.get_tenant(slug).await? {
        Some(existing) => (existing.branding.0, existing.landing.0),
        None => (BrandingSettings::default(), LandingCopy::default()),
    };
    edits.apply(&mut branding, &mut landing);
    validate_branding(&branding)?;

    store
        .upsert_tenant(slug, &branding, &landing)
        .await
        .with_context(|| format!("failed to save tenant {slug}"))
}

fn format_tenant(tenant: &TenantConfig) -> String {
    let b = &tenant.branding.0;
    let l = &tenant.landing.0;
    let mut out = String::new();
    out.push_str(&format!("  Program:  {}\n", b.program_name));
    out.push_str(&format!("  Expert:   {}\n", b.expert_name));
    out.push_str(&format!(
        "  Colors:   {} / {} / {}\n",
        b.primary_color, b.secondary_color, b.accent_color
    ));
    if let Some(url) = &b.logo_url {
        out.push_str(&format!("  Logo:     {url}\n"));
    }
    out.push_str(&format!("  Headline: {}\n", l.headline));
    for h in &l.highlights {
        out.push_str(&format!("    - {h}\n"));
    }
    out
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use jornada_db::store::MemoryStore;

    #[tokio::test]
    async fn new_tenant_starts_from_defaults() {
        let store = MemoryStore::new();
        let edits = BundleEdits {
            program_name: Some("Acme Academy".to_string()),
            highlights: vec!["Daily check-ins".to_string()],
            ..BundleEdits::default()
        };
        let tenant = set_tenant(&store, "acme", edits).await.unwrap();
        assert_eq!(tenant.branding.0.program_name, "Acme Academy");
        assert_eq!(
            tenant.branding.0.primary_color,
            BrandingSettings::default().primary_color
        );
        assert_eq!(tenant.landing.0.highlights, vec!["Daily check-ins".to_string()]);
    }

    #[tokio::test]
    async fn edits_keep_untouched_fields() {
        let store = MemoryStore::new();
        let first = BundleEdits {
            headline: Some("Change in 21 days".to_string()),
            highlights: vec!["One".to_string()],
            ..BundleEdits::default()
        };
        set_tenant(&store, "acme", first).await.unwrap();

        let second = BundleEdits {
            expert_name: Some("Dr. Ana".to_string()),
            ..BundleEdits::default()
        };
        let tenant = set_tenant(&store, "acme", second).await.unwrap();
        assert_eq!(tenant.landing.0.headline, "Change in 21 days");
        assert_eq!(tenant.landing.0.highlights, vec!["One".to_string()]);
        assert_eq!(tenant.branding.0.expert_name, "Dr. Ana");
        assert_eq!(store.list_tenants().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_bad_slug_and_color() {
        let store = MemoryStore::new();
        assert!(set_tenant(&store, "Not A Slug", BundleEdits::default()).await.is_err());

        let edits = BundleEdits {
            accent_color: Some("yellow".to_string()),
            ..BundleEdits::default()
        };
        assert!(set_tenant(&store, "acme", edits).await.is_err());
        assert!(store.list_tenants().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_logo_clears_it() {
        let store = MemoryStore::new();
        let edits = BundleEdits {
            logo_url: Some("https://cdn.example.com/logo.png".to_string()),
            ..BundleEdits::default()
        };
        set_tenant(&store, "acme", edits).await.unwrap();
        let edits = BundleEdits {
            logo_url: Some(String::new()),
            ..BundleEdits::default()
        };
        let tenant = set_tenant(&store, "acme", edits).await.unwrap();
        assert!(tenant.branding.0.logo_url.is_none());
        assert!(!format_tenant(&tenant).contains("Logo"));
    }
}
