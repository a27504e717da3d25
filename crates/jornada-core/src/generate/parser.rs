//! Parsing and validation of the provider's day list.
//!
//! Fails closed: any structural violation rejects the whole response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use jornada_db::models::{HealthArea, JOURNEY_DAYS, is_fire_trial_day};

use super::{GenerationError, MAX_WEIGHT, MAX_XP, MIN_WEIGHT, MIN_XP};

/// One day as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DayRecord {
    pub day: i32,
    pub title: String,
    pub objective: String,
    pub instructions: Vec<String>,
    pub estimated_time: String,
    pub style_notes: String,
    pub health_area_weights: BTreeMap<HealthArea, i32>,
    pub xp: i32,
    #[serde(rename = "isFireTrial")]
    pub is_fire_trial: bool,
}

/// Parse `text` into 21 validated day records, sorted by day.
///
/// A response wrapped in a Markdown code fence is accepted.
pub fn parse_day_records(
    text: &str,
    areas: &[HealthArea],
) -> Result<Vec<DayRecord>, GenerationError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let mut records: Vec<DayRecord> = serde_json::from_str(body)?;

    let expected = JOURNEY_DAYS as usize;
    if records.len() != expected {
        return Err(GenerationError::WrongDayCount {
            expected,
            got: records.len(),
        });
    }

    let mut seen = [false; JOURNEY_DAYS as usize];
    for record in &records {
        validate_record(record, areas)?;
        let slot = &mut seen[(record.day - 1) as usize];
        if *slot {
            return Err(GenerationError::DuplicateDay(record.day));
        }
        *slot = true;
    }

    records.sort_by_key(|r| r.day);
    Ok(records)
}

fn validate_record(record: &DayRecord, areas: &[HealthArea]) -> Result<(), GenerationError> {
    let day = record.day;
    if !(1..=JOURNEY_DAYS).contains(&day) {
        return Err(GenerationError::DayOutOfRange(day));
    }
    if record.is_fire_trial != is_fire_trial_day(day) {
        return Err(GenerationError::MilestoneMismatch {
            day,
            flagged: record.is_fire_trial,
        });
    }
    if record.title.trim().is_empty() {
        return Err(GenerationError::EmptyField { day, field: "title" });
    }
    if record.objective.trim().is_empty() {
        return Err(GenerationError::EmptyField {
            day,
            field: "objective",
        });
    }
    if !(MIN_XP..=MAX_XP).contains(&record.xp) {
        return Err(GenerationError::XpOutOfRange { day, xp: record.xp });
    }

    for (area, weight) in &record.health_area_weights {
        if !areas.contains(area) {
            return Err(GenerationError::UnexpectedArea { day, area: *area });
        }
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(weight) {
            return Err(GenerationError::WeightOutOfRange {
                day,
                area: *area,
                weight: *weight,
            });
        }
    }
    if let Some(area) = areas
        .iter()
        .find(|a| !record.health_area_weights.contains_key(a))
    {
        return Err(GenerationError::MissingArea { day, area: *area });
    }
    Ok(())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
