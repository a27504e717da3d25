//! Explicit caller context passed to every service call.

use uuid::Uuid;

use jornada_db::models::{BrandingSettings, TenantConfig, User, UserRole};
use jornada_db::store::RecordStore;

use crate::error::ServiceError;

/// The resolved tenant and the signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub tenant: TenantConfig,
    pub user: User,
}

impl Session {
    /// Load `user_id` and bind them to `tenant`.
    ///
    /// Unknown users, users registered under another tenant and blocked
    /// users are rejected.
    pub async fn open(
        store: &dyn RecordStore,
        tenant: TenantConfig,
        user_id: Uuid,
    ) -> Result<Self, ServiceError> {
        let user = store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;
        if user.tenant_slug != tenant.slug {
            return Err(ServiceError::Forbidden(format!(
                "user {} belongs to tenant {}",
                user.id, user.tenant_slug
            )));
        }
        if user.blocked {
            return Err(ServiceError::Forbidden(format!("user {} is blocked", user.id)));
        }
        Ok(Self { tenant, user })
    }

    /// The mentor whose plan this session reads and writes.
    pub fn plan_owner(&self) -> Option<Uuid> {
        match self.user.role {
            UserRole::Mentor => Some(self.user.id),
            UserRole::Student => self.user.mentor_id,
            UserRole::Admin => None,
        }
    }

    pub fn require_role(&self, role: UserRole) -> Result<(), ServiceError> {
        if self.user.role == role {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "requires role {role}, user has {}",
                self.user.role
            )))
        }
    }

    /// The user's own branding, falling back to the tenant's.
    pub fn branding(&self) -> &BrandingSettings {
        self.user
            .branding
            .as_ref()
            .map_or(&self.tenant.branding.0, |b| &b.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jornada_db::queries::users::NewUser;
    use jornada_db::store::MemoryStore;

    async fn setup(role: UserRole) -> (MemoryStore, TenantConfig, User) {
        let store = MemoryStore::with_default_tenant();
        let tenant = store.get_tenant("default").await.unwrap().unwrap();
        let user = store
            .insert_user(&NewUser {
                tenant_slug: "default",
                display_name: "Ana",
                email: "ana@example.com",
                phone: None,
                role,
                mentor_id: None,
                credits: 0,
                branding: None,
            })
            .await
            .unwrap();
        (store, tenant, user)
    }

    #[tokio::test]
    async fn open_loads_user() {
        let (store, tenant, user) = setup(UserRole::Mentor).await;
        let session = Session::open(&store, tenant, user.id).await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.plan_owner(), Some(user.id));
        assert_eq!(session.branding(), &BrandingSettings::default());
    }

    #[tokio::test]
    async fn open_rejects_unknown_user() {
        let (store, tenant, _) = setup(UserRole::Mentor).await;
        assert!(matches!(
            Session::open(&store, tenant, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn open_rejects_other_tenant() {
        let (store, mut tenant, user) = setup(UserRole::Mentor).await;
        tenant.slug = "acme".to_string();
        assert!(matches!(
            Session::open(&store, tenant, user.id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn open_rejects_blocked_user() {
        let (store, tenant, user) = setup(UserRole::Mentor).await;
        store.set_blocked(user.id, true).await.unwrap();
        assert!(matches!(
            Session::open(&store, tenant, user.id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn admins_own_no_plan() {
        let (store, tenant, user) = setup(UserRole::Admin).await;
        let session = Session::open(&store, tenant, user.id).await.unwrap();
        assert_eq!(session.plan_owner(), None);
        assert!(session.require_role(UserRole::Admin).is_ok());
        assert!(session.require_role(UserRole::Mentor).is_err());
    }
}
