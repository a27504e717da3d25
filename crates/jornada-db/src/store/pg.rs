//! PostgreSQL-backed [`RecordStore`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::RecordStore;
use crate::models::{BrandingSettings, Challenge, Comment, LandingCopy, Plan, TenantConfig, User};
use crate::queries::users::NewUser;
use crate::queries::{plans, tenants, users};

/// A [`RecordStore`] that delegates to the query functions over a pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for callers that need raw queries.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_user(&self, new: &NewUser<'_>) -> Result<User> {
        users::insert_user(&self.pool, new).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        users::get_user(&self.pool, id).await
    }

    async fn list_users(&self, tenant_slug: &str) -> Result<Vec<User>> {
        users::list_users(&self.pool, tenant_slug).await
    }

    async fn update_branding(
        &self,
        id: Uuid,
        branding: &BrandingSettings,
    ) -> Result<Option<User>> {
        users::update_branding(&self.pool, id, branding).await
    }

    async fn set_notifications(&self, id: Uuid, enabled: bool) -> Result<Option<User>> {
        users::set_notifications(&self.pool, id, enabled).await
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<Option<User>> {
        users::set_blocked(&self.pool, id, blocked).await
    }

    async fn deduct_credit(&self, id: Uuid) -> Result<Option<User>> {
        users::deduct_credit(&self.pool, id).await
    }

    async fn add_credits(&self, id: Uuid, amount: i32) -> Result<Option<User>> {
        users::add_credits(&self.pool, id, amount).await
    }

    async fn replace_current_plan(&self, plan: &Plan, challenges: &[Challenge]) -> Result<()> {
        plans::replace_current_plan(&self.pool, plan, challenges).await
    }

    async fn current_plan(&self, mentor_id: Uuid) -> Result<Option<Plan>> {
        plans::get_current_plan(&self.pool, mentor_id).await
    }

    async fn list_challenges(&self, plan_id: Uuid) -> Result<Vec<Challenge>> {
        plans::list_challenges(&self.pool, plan_id).await
    }

    async fn set_challenge_completed(
        &self,
        plan_id: Uuid,
        day: i32,
        completed: bool,
    ) -> Result<bool> {
        plans::set_challenge_completed(&self.pool, plan_id, day, completed).await
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        plans::insert_comment(&self.pool, comment).await
    }

    async fn list_comments(&self, plan_id: Uuid) -> Result<Vec<Comment>> {
        plans::list_comments(&self.pool, plan_id).await
    }

    async fn get_tenant(&self, slug: &str) -> Result<Option<TenantConfig>> {
        tenants::get_tenant(&self.pool, slug).await
    }

    async fn upsert_tenant(
        &self,
        slug: &str,
        branding: &BrandingSettings,
        landing: &LandingCopy,
    ) -> Result<TenantConfig> {
        tenants::upsert_tenant(&self.pool, slug, branding, landing).await
    }

    async fn list_tenants(&self) -> Result<Vec<TenantConfig>> {
        tenants::list_tenants(&self.pool).await
    }
}
