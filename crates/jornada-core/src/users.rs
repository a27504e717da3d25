//! Account registration and per-user settings.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use jornada_db::models::{BrandingSettings, TenantConfig, User, UserRole};
use jornada_db::queries::users::NewUser;
use jornada_db::store::RecordStore;

use crate::error::{ServiceError, ValidationError};
use crate::session::Session;

/// Registration form for a mentor or a student.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
    /// Required for students.
    #[serde(default)]
    pub mentor_id: Option<Uuid>,
}

fn check_identity(display_name: &str, email: &str) -> Result<(), ValidationError> {
    if display_name.trim().is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if !email.contains('@') {
        return Err(ValidationError::Invalid(format!("{email:?} is not an email address")));
    }
    Ok(())
}

/// Register a mentor or student under `tenant`.
///
/// Mentors start with `signup_credits` and a copy of the tenant's
/// branding. Students start with no credits and must name a mentor of the
/// same tenant. Admin accounts are not self-registered; see
/// [`create_admin`].
pub async fn register_user(
    store: &dyn RecordStore,
    tenant: &TenantConfig,
    account: &NewAccount,
    signup_credits: i32,
) -> Result<User, ServiceError> {
    check_identity(&account.display_name, &account.email)?;

    let (credits, branding, mentor_id) = match account.role {
        UserRole::Admin => {
            return Err(ServiceError::Forbidden(
                "admin accounts are created by an operator".to_string(),
            ));
        }
        UserRole::Mentor => (signup_credits.max(0), Some(&tenant.branding.0), None),
        UserRole::Student => {
            let mentor_id = account
                .mentor_id
                .ok_or(ValidationError::MissingSelection("a mentor"))?;
            let mentor = store
                .get_user(mentor_id)
                .await?
                .filter(|m| m.role == UserRole::Mentor && m.tenant_slug == tenant.slug)
                .ok_or_else(|| ServiceError::NotFound(format!("mentor {mentor_id}")))?;
            (0, None, Some(mentor.id))
        }
    };

    let phone = account.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let user = store
        .insert_user(&NewUser {
            tenant_slug: &tenant.slug,
            display_name: account.display_name.trim(),
            email: account.email.trim(),
            phone,
            role: account.role,
            mentor_id,
            credits,
            branding,
        })
        .await?;
    info!(user_id = %user.id, tenant = %user.tenant_slug, role = %user.role, "registered user");
    Ok(user)
}

/// Create an admin account. Operator-only.
pub async fn create_admin(
    store: &dyn RecordStore,
    tenant: &TenantConfig,
    display_name: &str,
    email: &str,
) -> Result<User, ServiceError> {
    check_identity(display_name, email)?;
    let user = store
        .insert_user(&NewUser {
            tenant_slug: &tenant.slug,
            display_name: display_name.trim(),
            email: email.trim(),
            phone: None,
            role: UserRole::Admin,
            mentor_id: None,
            credits: 0,
            branding: None,
        })
        .await?;
    info!(user_id = %user.id, tenant = %user.tenant_slug, "created admin");
    Ok(user)
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn check_color(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let ok = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor {
            field,
            value: value.to_string(),
        })
    }
}

pub fn validate_branding(branding: &BrandingSettings) -> Result<(), ValidationError> {
    check_color("primary_color", &branding.primary_color)?;
    check_color("secondary_color", &branding.secondary_color)?;
    check_color("accent_color", &branding.accent_color)?;
    if branding.program_name.trim().is_empty() {
        return Err(ValidationError::EmptyField("program name"));
    }
    if branding.expert_name.trim().is_empty() {
        return Err(ValidationError::EmptyField("expert name"));
    }
    Ok(())
}

/// Replace the session mentor's branding.
pub async fn update_branding(
    store: &dyn RecordStore,
    session: &Session,
    branding: &BrandingSettings,
) -> Result<User, ServiceError> {
    session.require_role(UserRole::Mentor)?;
    validate_branding(branding)?;
    let user = store
        .update_branding(session.user.id, branding)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;
    info!(user_id = %user.id, "updated branding");
    Ok(user)
}

pub async fn set_notifications(
    store: &dyn RecordStore,
    session: &Session,
    enabled: bool,
) -> Result<User, ServiceError> {
    store
        .set_notifications(session.user.id, enabled)
        .await?
        .ok_or_else(|| ServiceError::NotFound("user".to_string()))
}

/// Block or unblock `user_id`. Admin only, same tenant, never oneself.
pub async fn set_blocked(
    store: &dyn RecordStore,
    session: &Session,
    user_id: Uuid,
    blocked: bool,
) -> Result<User, ServiceError> {
    session.require_role(UserRole::Admin)?;
    if user_id == session.user.id {
        return Err(ServiceError::Forbidden("admins cannot block themselves".to_string()));
    }
    let target = store
        .get_user(user_id)
        .await?
        .filter(|u| u.tenant_slug == session.tenant.slug)
        .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))?;

    let user = store
        .set_blocked(target.id, blocked)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))?;
    info!(user_id = %user.id, blocked, admin_id = %session.user.id, "changed blocked flag");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_must_be_hex_triplets() {
        assert!(check_color("c", "#a1B2c3").is_ok());
        for bad in ["a1b2c3", "#abc", "#ggg000", "#1234567", ""] {
            assert!(check_color("c", bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn default_branding_is_valid() {
        assert!(validate_branding(&BrandingSettings::default()).is_ok());
    }

    #[test]
    fn identity_checks() {
        assert!(check_identity("Ana", "ana@example.com").is_ok());
        assert_eq!(check_identity(" ", "a@b"), Err(ValidationError::EmptyField("name")));
        assert!(matches!(
            check_identity("Ana", "ana.example.com"),
            Err(ValidationError::Invalid(_))
        ));
    }
}
