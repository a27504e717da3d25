//! The record store seam.
//!
//! Services never touch a pool directly; they receive an
//! `&dyn RecordStore`, so the same code runs against PostgreSQL
//! ([`PgStore`]) and the in-process [`MemoryStore`] used by tests and
//! local demos.
//!
//! ```text
//! service fn(store: &dyn RecordStore, session: &Session, ...)
//!     |
//!     +--> PgStore     --> queries::{users, plans, tenants} --> PostgreSQL
//!     +--> MemoryStore --> RwLock<HashMap ...>
//! ```

pub mod memory;
pub mod pg;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{BrandingSettings, Challenge, Comment, LandingCopy, Plan, TenantConfig, User};
use crate::queries::users::NewUser;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Key-addressed CRUD over users, plans, and tenant bundles.
///
/// Every method that finds nothing returns `Ok(None)` (or `Ok(false)`);
/// `Err` is reserved for storage failures.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // -- users --

    async fn insert_user(&self, new: &NewUser<'_>) -> Result<User>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn list_users(&self, tenant_slug: &str) -> Result<Vec<User>>;

    async fn update_branding(&self, id: Uuid, branding: &BrandingSettings)
    -> Result<Option<User>>;

    async fn set_notifications(&self, id: Uuid, enabled: bool) -> Result<Option<User>>;

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<Option<User>>;

    /// Decrement credits by one and bump the generation count, only when the
    /// balance is positive.
    async fn deduct_credit(&self, id: Uuid) -> Result<Option<User>>;

    async fn add_credits(&self, id: Uuid, amount: i32) -> Result<Option<User>>;

    // -- plans --

    /// Persist `plan` as the mentor's single current plan, discarding any
    /// previous plan of that mentor.
    async fn replace_current_plan(&self, plan: &Plan, challenges: &[Challenge]) -> Result<()>;

    async fn current_plan(&self, mentor_id: Uuid) -> Result<Option<Plan>>;

    async fn list_challenges(&self, plan_id: Uuid) -> Result<Vec<Challenge>>;

    async fn set_challenge_completed(&self, plan_id: Uuid, day: i32, completed: bool)
    -> Result<bool>;

    async fn insert_comment(&self, comment: &Comment) -> Result<()>;

    async fn list_comments(&self, plan_id: Uuid) -> Result<Vec<Comment>>;

    // -- tenants --

    async fn get_tenant(&self, slug: &str) -> Result<Option<TenantConfig>>;

    async fn upsert_tenant(
        &self,
        slug: &str,
        branding: &BrandingSettings,
        landing: &LandingCopy,
    ) -> Result<TenantConfig>;

    async fn list_tenants(&self) -> Result<Vec<TenantConfig>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn RecordStore) {}
};
