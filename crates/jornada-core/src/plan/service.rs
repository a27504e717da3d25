//! Plan services: creation, generation workflow, completion and comments.
//!
//! A student session reads and writes the plan of the mentor they follow;
//! a mentor session works on their own single plan.

use chrono::Utc;
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use jornada_db::models::{
    Challenge, Comment, JOURNEY_DAYS, METHODOLOGY_TAG, Plan, User, UserRole, is_fire_trial_day,
};
use jornada_db::store::RecordStore;

use super::aggregate::PlanAggregate;
use crate::credits;
use crate::error::{ServiceError, ValidationError};
use crate::generate::{GenerationProvider, generate_challenges};
use crate::session::Session;
use crate::wizard::Payload;

/// Result of a successful [`generate_plan`] call.
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub plan: PlanAggregate,
    /// The mentor after the credit deduction. `None` if the balance was
    /// already gone by the time the deduction ran.
    pub user: Option<User>,
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

fn check_challenge_set(challenges: &[Challenge]) -> Result<(), ValidationError> {
    let mut days: Vec<i32> = challenges.iter().map(|c| c.day).collect();
    days.sort_unstable();
    if days != (1..=JOURNEY_DAYS).collect::<Vec<_>>() {
        return Err(ValidationError::Invalid(format!(
            "a plan needs exactly one challenge for each day 1..={JOURNEY_DAYS}"
        )));
    }
    if let Some(c) = challenges
        .iter()
        .find(|c| c.is_fire_trial != is_fire_trial_day(c.day))
    {
        return Err(ValidationError::Invalid(format!(
            "day {} has the wrong milestone flag",
            c.day
        )));
    }
    Ok(())
}

fn describe(payload: &Payload) -> String {
    let areas: Vec<&str> = payload.health_areas.iter().map(|a| a.label()).collect();
    let audience = if payload.is_group_plan() {
        "group"
    } else {
        "personal"
    };
    format!(
        "A {JOURNEY_DAYS}-day {audience} journey for {} across {}.",
        payload.student_name.trim(),
        areas.join(", ")
    )
}

/// Store `challenges` as the session mentor's new current plan.
///
/// The previous plan, with its progress and comments, is replaced.
pub async fn create_plan(
    store: &dyn RecordStore,
    session: &Session,
    payload: &Payload,
    challenges: Vec<Challenge>,
) -> Result<PlanAggregate, ServiceError> {
    session.require_role(UserRole::Mentor)?;
    payload.validate()?;
    check_challenge_set(&challenges)?;

    let plan = Plan {
        id: Uuid::new_v4(),
        mentor_id: session.user.id,
        student_name: payload.student_name.trim().to_string(),
        title: format!(
            "{}: {}",
            session.branding().program_name,
            payload.student_name.trim()
        ),
        description: describe(payload),
        health_areas: Json(payload.health_areas.clone()),
        is_group: payload.is_group_plan(),
        plan_type: payload.plan_type.clone(),
        methodology: METHODOLOGY_TAG.to_string(),
        created_at: Utc::now(),
    };
    let challenges: Vec<Challenge> = challenges
        .into_iter()
        .map(|c| Challenge {
            plan_id: plan.id,
            completed: false,
            ..c
        })
        .collect();

    store.replace_current_plan(&plan, &challenges).await?;
    info!(plan_id = %plan.id, mentor_id = %plan.mentor_id, "created plan");

    Ok(PlanAggregate::assemble(plan, challenges, Vec::new()))
}

/// Generate and store a new plan for the session mentor, spending one
/// credit.
///
/// The balance is checked before the provider is called. A failed
/// generation stores nothing and spends nothing.
pub async fn generate_plan(
    store: &dyn RecordStore,
    provider: &dyn GenerationProvider,
    session: &Session,
    payload: &Payload,
) -> Result<GeneratedPlan, ServiceError> {
    session.require_role(UserRole::Mentor)?;
    payload.validate()?;

    let balance = store
        .get_user(session.user.id)
        .await?
        .map_or(0, |u| u.credits);
    if balance <= 0 {
        info!(user_id = %session.user.id, "generation refused: no credits");
        return Err(ServiceError::InsufficientCredit { balance });
    }

    let challenges = generate_challenges(provider, payload).await?;
    let plan = create_plan(store, session, payload, challenges).await?;

    // Not atomic with create_plan: a concurrent deduction can leave the
    // plan stored without a charge.
    let user = credits::deduct_credit(store, session).await?;
    if user.is_none() {
        warn!(user_id = %session.user.id, plan_id = %plan.plan.id, "plan stored but no credit was left to deduct");
    }

    Ok(GeneratedPlan { plan, user })
}

// ---------------------------------------------------------------------------
// Reads and updates
// ---------------------------------------------------------------------------

async fn load_aggregate(
    store: &dyn RecordStore,
    plan: Plan,
) -> Result<PlanAggregate, ServiceError> {
    let challenges = store.list_challenges(plan.id).await?;
    let comments = store.list_comments(plan.id).await?;
    Ok(PlanAggregate::assemble(plan, challenges, comments))
}

async fn owned_plan(store: &dyn RecordStore, session: &Session) -> Result<Option<Plan>, ServiceError> {
    match session.plan_owner() {
        Some(owner) => Ok(store.current_plan(owner).await?),
        None => Ok(None),
    }
}

/// The plan visible to this session, if any.
pub async fn current_plan(
    store: &dyn RecordStore,
    session: &Session,
) -> Result<Option<PlanAggregate>, ServiceError> {
    match owned_plan(store, session).await? {
        Some(plan) => Ok(Some(load_aggregate(store, plan).await?)),
        None => Ok(None),
    }
}

/// Mark `day` completed or not. `Ok(None)` when there is no plan or no
/// such day.
pub async fn toggle_challenge(
    store: &dyn RecordStore,
    session: &Session,
    day: i32,
    completed: bool,
) -> Result<Option<PlanAggregate>, ServiceError> {
    let Some(plan) = owned_plan(store, session).await? else {
        return Ok(None);
    };
    if !store.set_challenge_completed(plan.id, day, completed).await? {
        return Ok(None);
    }
    info!(plan_id = %plan.id, day, completed, "toggled challenge");
    Ok(Some(load_aggregate(store, plan).await?))
}

/// Append a comment to `day`. `Ok(None)` when there is no plan or no such
/// day.
pub async fn add_comment(
    store: &dyn RecordStore,
    session: &Session,
    day: i32,
    author_name: &str,
    text: &str,
) -> Result<Option<PlanAggregate>, ServiceError> {
    let author_name = author_name.trim();
    let text = text.trim();
    if author_name.is_empty() {
        return Err(ValidationError::EmptyField("author name").into());
    }
    if text.is_empty() {
        return Err(ValidationError::EmptyField("comment").into());
    }

    let Some(plan) = owned_plan(store, session).await? else {
        return Ok(None);
    };
    let mut aggregate = load_aggregate(store, plan).await?;
    if aggregate.day(day).is_none() {
        return Ok(None);
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        plan_id: aggregate.plan.id,
        day,
        author_name: author_name.to_string(),
        text: text.to_string(),
        created_at: Utc::now(),
    };
    store.insert_comment(&comment).await?;
    aggregate.push_comment(comment);
    Ok(Some(aggregate))
}
