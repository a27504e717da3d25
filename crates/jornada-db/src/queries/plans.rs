//! Database query functions for the `plans`, `challenges`, and
//! `challenge_comments` tables.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Challenge, Comment, Plan};

/// Store `plan` as the mentor's only plan.
///
/// Deletes any previous plan of the same mentor (its challenges and comments
/// cascade) and inserts the new plan with all of its challenges inside a
/// single transaction.
pub async fn replace_current_plan(
    pool: &PgPool,
    plan: &Plan,
    challenges: &[Challenge],
) -> Result<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query("DELETE FROM plans WHERE mentor_id = $1")
        .bind(plan.mentor_id)
        .execute(&mut *tx)
        .await
        .context("failed to delete previous plan")?;

    sqlx::query(
        "INSERT INTO plans (id, mentor_id, student_name, title, description, health_areas, is_group, plan_type, methodology, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(plan.id)
    .bind(plan.mentor_id)
    .bind(&plan.student_name)
    .bind(&plan.title)
    .bind(&plan.description)
    .bind(&plan.health_areas)
    .bind(plan.is_group)
    .bind(&plan.plan_type)
    .bind(&plan.methodology)
    .bind(plan.created_at)
    .execute(&mut *tx)
    .await
    .context("failed to insert plan")?;

    for challenge in challenges {
        sqlx::query(
            "INSERT INTO challenges (plan_id, day, title, objective, instructions, estimated_time, style_notes, health_area_weights, xp, is_fire_trial, completed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(plan.id)
        .bind(challenge.day)
        .bind(&challenge.title)
        .bind(&challenge.objective)
        .bind(&challenge.instructions)
        .bind(&challenge.estimated_time)
        .bind(&challenge.style_notes)
        .bind(&challenge.health_area_weights)
        .bind(challenge.xp)
        .bind(challenge.is_fire_trial)
        .bind(challenge.completed)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert challenge for day {}", challenge.day))?;
    }

    tx.commit().await.context("failed to commit transaction")?;

    Ok(())
}

/// Fetch the most recent plan owned by a mentor.
pub async fn get_current_plan(pool: &PgPool, mentor_id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE mentor_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(mentor_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch current plan")?;

    Ok(plan)
}

/// List all challenges of a plan ordered by day.
pub async fn list_challenges(pool: &PgPool, plan_id: Uuid) -> Result<Vec<Challenge>> {
    let challenges = sqlx::query_as::<_, Challenge>(
        "SELECT * FROM challenges WHERE plan_id = $1 ORDER BY day ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list challenges")?;

    Ok(challenges)
}

/// Set the completion flag of one day. Returns `false` if no such day exists.
pub async fn set_challenge_completed(
    pool: &PgPool,
    plan_id: Uuid,
    day: i32,
    completed: bool,
) -> Result<bool> {
    let result =
        sqlx::query("UPDATE challenges SET completed = $1 WHERE plan_id = $2 AND day = $3")
            .bind(completed)
            .bind(plan_id)
            .bind(day)
            .execute(pool)
            .await
            .context("failed to update challenge completion")?;

    Ok(result.rows_affected() > 0)
}

/// Insert a comment row.
pub async fn insert_comment(pool: &PgPool, comment: &Comment) -> Result<()> {
    sqlx::query(
        "INSERT INTO challenge_comments (id, plan_id, day, author_name, text, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(comment.id)
    .bind(comment.plan_id)
    .bind(comment.day)
    .bind(&comment.author_name)
    .bind(&comment.text)
    .bind(comment.created_at)
    .execute(pool)
    .await
    .context("failed to insert comment")?;

    Ok(())
}

/// List every comment of a plan, grouped by day, oldest first.
pub async fn list_comments(pool: &PgPool, plan_id: Uuid) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        "SELECT * FROM challenge_comments WHERE plan_id = $1 ORDER BY day ASC, created_at ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list comments")?;

    Ok(comments)
}
