//! Plan generation through an AI text-completion provider.
//!
//! ```text
//! Payload --build_request--> GenerationRequest --provider.complete--> text
//!                                                                       |
//!        Vec<Challenge> <--into_challenges-- Vec<DayRecord> <--parse----+
//! ```
//!
//! One provider call per generation. Any malformed or partial response is
//! rejected as a whole.

pub mod gemini;
pub mod parser;
pub mod prompt;
pub mod provider;

use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use jornada_db::models::{Challenge, HealthArea};

use crate::error::ServiceError;
use crate::wizard::Payload;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use parser::{DayRecord, parse_day_records};
pub use prompt::{GenerationRequest, build_request, output_schema};
pub use provider::{GenerationProvider, ProviderError};

pub const MIN_WEIGHT: i32 = 0;
pub const MAX_WEIGHT: i32 = 3;
pub const MIN_XP: i32 = 100;
pub const MAX_XP: i32 = 500;

/// Why a provider response could not become a plan.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("response is not a valid day list: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected {expected} days, got {got}")]
    WrongDayCount { expected: usize, got: usize },

    #[error("day {0} is outside 1..=21")]
    DayOutOfRange(i32),

    #[error("day {0} appears more than once")]
    DuplicateDay(i32),

    #[error("day {day} has isFireTrial={flagged}, which does not match the milestone days")]
    MilestoneMismatch { day: i32, flagged: bool },

    #[error("day {day} weighs {area} at {weight}, outside 0..=3")]
    WeightOutOfRange {
        day: i32,
        area: HealthArea,
        weight: i32,
    },

    #[error("day {day} weighs {area}, which was not selected")]
    UnexpectedArea { day: i32, area: HealthArea },

    #[error("day {day} has no weight for {area}")]
    MissingArea { day: i32, area: HealthArea },

    #[error("day {day} is worth {xp} xp, outside 100..=500")]
    XpOutOfRange { day: i32, xp: i32 },

    #[error("day {day} has an empty {field}")]
    EmptyField { day: i32, field: &'static str },
}

/// Turn validated records into uncompleted challenges, sorted by day.
///
/// `plan_id` is left nil; the plan service assigns it on creation.
pub fn into_challenges(records: Vec<DayRecord>) -> Vec<Challenge> {
    let mut challenges: Vec<Challenge> = records
        .into_iter()
        .map(|r| Challenge {
            plan_id: Uuid::nil(),
            day: r.day,
            title: r.title.trim().to_string(),
            objective: r.objective.trim().to_string(),
            instructions: r.instructions,
            estimated_time: r.estimated_time,
            style_notes: r.style_notes,
            health_area_weights: Json(r.health_area_weights),
            xp: r.xp,
            is_fire_trial: r.is_fire_trial,
            completed: false,
        })
        .collect();
    challenges.sort_by_key(|c| c.day);
    challenges
}

/// Validate `payload`, ask `provider` for a plan once, and return the 21
/// challenges.
pub async fn generate_challenges(
    provider: &dyn GenerationProvider,
    payload: &Payload,
) -> Result<Vec<Challenge>, ServiceError> {
    payload.validate()?;

    let request = build_request(payload);
    info!(
        provider = provider.name(),
        areas = payload.health_areas.len(),
        group = payload.is_group_plan(),
        "requesting plan generation"
    );

    let text = provider
        .complete(&request)
        .await
        .map_err(GenerationError::from)
        .inspect_err(|e| warn!(provider = provider.name(), error = %e, "provider call failed"))?;

    let records = parse_day_records(&text, &payload.health_areas)
        .inspect_err(|e| warn!(provider = provider.name(), error = %e, "rejected generated plan"))?;

    Ok(into_challenges(records))
}
