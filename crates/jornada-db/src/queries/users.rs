//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{BrandingSettings, User, UserRole};

/// Fields needed to insert a user. Server-generated columns (id,
/// generation_count, flags, created_at) take their defaults.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub tenant_slug: &'a str,
    pub display_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub role: UserRole,
    pub mentor_id: Option<Uuid>,
    pub credits: i32,
    pub branding: Option<&'a BrandingSettings>,
}

/// Insert a new user row and return it.
pub async fn insert_user(pool: &PgPool, new: &NewUser<'_>) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (tenant_slug, display_name, email, phone, role, mentor_id, credits, branding) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(new.tenant_slug)
    .bind(new.display_name)
    .bind(new.email)
    .bind(new.phone)
    .bind(new.role)
    .bind(new.mentor_id)
    .bind(new.credits)
    .bind(new.branding.map(Json))
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert user {:?}", new.email))?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// List the users of a tenant, oldest first.
pub async fn list_users(pool: &PgPool, tenant_slug: &str) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE tenant_slug = $1 ORDER BY created_at ASC",
    )
    .bind(tenant_slug)
    .fetch_all(pool)
    .await
    .context("failed to list users")?;

    Ok(users)
}

/// Replace a user's branding settings.
pub async fn update_branding(
    pool: &PgPool,
    id: Uuid,
    branding: &BrandingSettings,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET branding = $1 WHERE id = $2 RETURNING *",
    )
    .bind(Json(branding))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to update branding")?;

    Ok(user)
}

/// Set the notification preference of a user.
pub async fn set_notifications(pool: &PgPool, id: Uuid, enabled: bool) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET notifications_enabled = $1 WHERE id = $2 RETURNING *",
    )
    .bind(enabled)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to update notification preference")?;

    Ok(user)
}

/// Block or unblock a user.
pub async fn set_blocked(pool: &PgPool, id: Uuid, blocked: bool) -> Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>("UPDATE users SET blocked = $1 WHERE id = $2 RETURNING *")
            .bind(blocked)
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to update blocked flag")?;

    Ok(user)
}

/// Spend one credit and count one generation, only if the balance is
/// positive. Returns `None` when the user is missing or has no credits.
pub async fn deduct_credit(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users \
         SET credits = credits - 1, generation_count = generation_count + 1 \
         WHERE id = $1 AND credits > 0 \
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to deduct credit")?;

    Ok(user)
}

/// Add purchased credits to a user's balance.
pub async fn add_credits(pool: &PgPool, id: Uuid, amount: i32) -> Result<Option<User>> {
    if amount < 0 {
        anyhow::bail!("credit amount must be non-negative, got {amount}");
    }

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET credits = credits + $1 WHERE id = $2 RETURNING *",
    )
    .bind(amount)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to add credits")?;

    Ok(user)
}
