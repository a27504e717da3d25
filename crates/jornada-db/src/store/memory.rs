//! In-process [`RecordStore`] used by tests and local demos.
//!
//! Mirrors the constraints of the PostgreSQL schema that the services rely
//! on: unique `(tenant_slug, email)`, one plan per mentor, credits never
//! below zero, comments only on existing days.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::RecordStore;
use crate::models::{BrandingSettings, Challenge, Comment, LandingCopy, Plan, TenantConfig, User};
use crate::queries::users::NewUser;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    /// Keyed by mentor id.
    plans: HashMap<Uuid, Plan>,
    /// Keyed by plan id, kept sorted by day.
    challenges: HashMap<Uuid, Vec<Challenge>>,
    comments: Vec<Comment>,
    tenants: BTreeMap<String, TenantConfig>,
}

/// A [`RecordStore`] backed by hash maps behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    tenant_lookups: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store (no tenants at all).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the `default` tenant, like a freshly
    /// migrated database.
    pub fn with_default_tenant() -> Self {
        let mut inner = Inner::default();
        inner.tenants.insert(
            "default".to_string(),
            TenantConfig {
                slug: "default".to_string(),
                branding: Json(BrandingSettings::default()),
                landing: Json(LandingCopy::default()),
                updated_at: Utc::now(),
            },
        );
        Self {
            inner: RwLock::new(inner),
            tenant_lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `get_tenant` calls served so far.
    pub fn tenant_lookups(&self) -> usize {
        self.tenant_lookups.load(Ordering::SeqCst)
    }
}

fn update_user(inner: &mut Inner, id: Uuid, f: impl FnOnce(&mut User)) -> Option<User> {
    inner.users.get_mut(&id).map(|user| {
        f(user);
        user.clone()
    })
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_user(&self, new: &NewUser<'_>) -> Result<User> {
        let mut inner = self.inner.write().await;

        let duplicate = inner
            .users
            .values()
            .any(|u| u.tenant_slug == new.tenant_slug && u.email == new.email);
        if duplicate {
            bail!(
                "failed to insert user {:?}: email already registered in tenant {:?}",
                new.email,
                new.tenant_slug
            );
        }
        if new.credits < 0 {
            bail!("failed to insert user {:?}: negative credits", new.email);
        }

        let user = User {
            id: Uuid::new_v4(),
            tenant_slug: new.tenant_slug.to_string(),
            display_name: new.display_name.to_string(),
            email: new.email.to_string(),
            phone: new.phone.map(str::to_string),
            role: new.role,
            mentor_id: new.mentor_id,
            credits: new.credits,
            generation_count: 0,
            branding: new.branding.cloned().map(Json),
            notifications_enabled: true,
            blocked: false,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, tenant_slug: &str) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.tenant_slug == tenant_slug)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update_branding(
        &self,
        id: Uuid,
        branding: &BrandingSettings,
    ) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        Ok(update_user(&mut inner, id, |u| {
            u.branding = Some(Json(branding.clone()))
        }))
    }

    async fn set_notifications(&self, id: Uuid, enabled: bool) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        Ok(update_user(&mut inner, id, |u| u.notifications_enabled = enabled))
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        Ok(update_user(&mut inner, id, |u| u.blocked = blocked))
    }

    async fn deduct_credit(&self, id: Uuid) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&id) {
            Some(user) if user.credits > 0 => {
                user.credits -= 1;
                user.generation_count += 1;
                Ok(Some(user.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn add_credits(&self, id: Uuid, amount: i32) -> Result<Option<User>> {
        if amount < 0 {
            bail!("credit amount must be non-negative, got {amount}");
        }
        let mut inner = self.inner.write().await;
        Ok(update_user(&mut inner, id, |u| u.credits += amount))
    }

    async fn replace_current_plan(&self, plan: &Plan, challenges: &[Challenge]) -> Result<()> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&plan.mentor_id) {
            bail!("failed to insert plan: mentor {} does not exist", plan.mentor_id);
        }

        if let Some(previous) = inner.plans.remove(&plan.mentor_id) {
            inner.challenges.remove(&previous.id);
            inner.comments.retain(|c| c.plan_id != previous.id);
        }

        let mut rows: Vec<Challenge> = challenges
            .iter()
            .cloned()
            .map(|mut c| {
                c.plan_id = plan.id;
                c
            })
            .collect();
        rows.sort_by_key(|c| c.day);

        inner.plans.insert(plan.mentor_id, plan.clone());
        inner.challenges.insert(plan.id, rows);
        Ok(())
    }

    async fn current_plan(&self, mentor_id: Uuid) -> Result<Option<Plan>> {
        Ok(self.inner.read().await.plans.get(&mentor_id).cloned())
    }

    async fn list_challenges(&self, plan_id: Uuid) -> Result<Vec<Challenge>> {
        Ok(self
            .inner
            .read()
            .await
            .challenges
            .get(&plan_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_challenge_completed(
        &self,
        plan_id: Uuid,
        day: i32,
        completed: bool,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let challenge = inner
            .challenges
            .get_mut(&plan_id)
            .and_then(|days| days.iter_mut().find(|c| c.day == day));
        match challenge {
            Some(c) => {
                c.completed = completed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let mut inner = self.inner.write().await;
        let day_exists = inner
            .challenges
            .get(&comment.plan_id)
            .is_some_and(|days| days.iter().any(|c| c.day == comment.day));
        if !day_exists {
            bail!(
                "failed to insert comment: plan {} has no day {}",
                comment.plan_id,
                comment.day
            );
        }
        inner.comments.push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, plan_id: Uuid) -> Result<Vec<Comment>> {
        let inner = self.inner.read().await;
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.plan_id == plan_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.day, c.created_at));
        Ok(comments)
    }

    async fn get_tenant(&self, slug: &str) -> Result<Option<TenantConfig>> {
        self.tenant_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.read().await.tenants.get(slug).cloned())
    }

    async fn upsert_tenant(
        &self,
        slug: &str,
        branding: &BrandingSettings,
        landing: &LandingCopy,
    ) -> Result<TenantConfig> {
        let tenant = TenantConfig {
            slug: slug.to_string(),
            branding: Json(branding.clone()),
            landing: Json(landing.clone()),
            updated_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .tenants
            .insert(slug.to_string(), tenant.clone());
        Ok(tenant)
    }

    async fn list_tenants(&self) -> Result<Vec<TenantConfig>> {
        Ok(self.inner.read().await.tenants.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthArea, UserRole};

    fn mentor<'a>(email: &'a str) -> NewUser<'a> {
        NewUser {
            tenant_slug: "default",
            display_name: "Ana",
            email,
            phone: None,
            role: UserRole::Mentor,
            mentor_id: None,
            credits: 1,
            branding: None,
        }
    }

    fn plan_for(mentor_id: Uuid) -> Plan {
        Plan {
            id: Uuid::new_v4(),
            mentor_id,
            student_name: "Bia".to_string(),
            title: "Plan".to_string(),
            description: "desc".to_string(),
            health_areas: Json(vec![HealthArea::Physical]),
            is_group: false,
            plan_type: "21_day_journey".to_string(),
            methodology: "fire-trial-21".to_string(),
            created_at: Utc::now(),
        }
    }

    fn challenge(day: i32) -> Challenge {
        Challenge {
            plan_id: Uuid::nil(),
            day,
            title: format!("Day {day}"),
            objective: "obj".to_string(),
            instructions: vec!["step".to_string()],
            estimated_time: "10 min".to_string(),
            style_notes: "calm".to_string(),
            health_area_weights: Json(BTreeMap::from([(HealthArea::Physical, 1)])),
            xp: 100,
            is_fire_trial: false,
            completed: false,
        }
    }

    #[tokio::test]
    async fn seeded_store_has_default_tenant() {
        let store = MemoryStore::with_default_tenant();
        let tenant = store.get_tenant("default").await.unwrap();
        assert!(tenant.is_some());
        assert_eq!(store.tenant_lookups(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_per_tenant() {
        let store = MemoryStore::new();
        store.insert_user(&mentor("a@example.com")).await.unwrap();
        let err = store.insert_user(&mentor("a@example.com")).await.unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[tokio::test]
    async fn deduct_credit_stops_at_zero() {
        let store = MemoryStore::new();
        let user = store.insert_user(&mentor("a@example.com")).await.unwrap();

        let after = store.deduct_credit(user.id).await.unwrap().unwrap();
        assert_eq!(after.credits, 0);
        assert_eq!(after.generation_count, 1);

        assert!(store.deduct_credit(user.id).await.unwrap().is_none());
        let unchanged = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(unchanged.credits, 0);
        assert_eq!(unchanged.generation_count, 1);
    }

    #[tokio::test]
    async fn replacing_a_plan_drops_the_previous_one() {
        let store = MemoryStore::new();
        let user = store.insert_user(&mentor("a@example.com")).await.unwrap();

        let first = plan_for(user.id);
        store
            .replace_current_plan(&first, &[challenge(2), challenge(1)])
            .await
            .unwrap();
        let days: Vec<i32> = store
            .list_challenges(first.id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.day)
            .collect();
        assert_eq!(days, vec![1, 2]);

        let second = plan_for(user.id);
        store
            .replace_current_plan(&second, &[challenge(1)])
            .await
            .unwrap();

        assert_eq!(store.current_plan(user.id).await.unwrap().unwrap().id, second.id);
        assert!(store.list_challenges(first.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comment_requires_existing_day() {
        let store = MemoryStore::new();
        let user = store.insert_user(&mentor("a@example.com")).await.unwrap();
        let plan = plan_for(user.id);
        store
            .replace_current_plan(&plan, &[challenge(1)])
            .await
            .unwrap();

        let comment = Comment {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            day: 5,
            author_name: "Bia".to_string(),
            text: "hi".to_string(),
            created_at: Utc::now(),
        };
        assert!(store.insert_comment(&comment).await.is_err());
        assert!(
            store
                .insert_comment(&Comment { day: 1, ..comment })
                .await
                .is_ok()
        );
    }
}
