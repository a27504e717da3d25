//! Progress statistics derived from a plan's challenges.
//!
//! Nothing here is stored; stats are recomputed on every read.

use std::collections::BTreeMap;

use serde::Serialize;

use jornada_db::models::{Challenge, HealthArea, JOURNEY_DAYS};

/// Day ranges of the three acts.
pub const ACTS: [(i32, i32); 3] = [(1, 7), (8, 14), (15, 21)];

/// Act number (1..=3) containing `day`.
pub fn act_for_day(day: i32) -> Option<u8> {
    ACTS.iter()
        .position(|(first, last)| (*first..=*last).contains(&day))
        .map(|i| i as u8 + 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActStats {
    pub act: u8,
    pub first_day: i32,
    pub last_day: i32,
    pub completed_days: usize,
    pub total_days: usize,
    /// Weight totals over every day of the act, completed or not.
    pub area_totals: BTreeMap<HealthArea, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    pub completed_days: usize,
    pub completion_percent: u32,
    /// XP earned from completed days.
    pub points: i64,
    /// XP available over the whole plan.
    pub max_points: i64,
    pub acts: Vec<ActStats>,
    pub area_totals: BTreeMap<HealthArea, i64>,
    /// First milestone day not yet completed.
    pub next_fire_trial: Option<i32>,
}

impl PlanStats {
    pub fn compute<'a>(challenges: impl IntoIterator<Item = &'a Challenge>) -> Self {
        let mut acts: Vec<ActStats> = ACTS
            .iter()
            .zip(1u8..)
            .map(|((first, last), act)| ActStats {
                act,
                first_day: *first,
                last_day: *last,
                completed_days: 0,
                total_days: 0,
                area_totals: BTreeMap::new(),
            })
            .collect();
        let mut stats = Self {
            completed_days: 0,
            completion_percent: 0,
            points: 0,
            max_points: 0,
            acts: Vec::new(),
            area_totals: BTreeMap::new(),
            next_fire_trial: None,
        };

        for c in challenges {
            stats.max_points += i64::from(c.xp);
            if c.completed {
                stats.completed_days += 1;
                stats.points += i64::from(c.xp);
            } else if c.is_fire_trial && stats.next_fire_trial.is_none_or(|d| c.day < d) {
                stats.next_fire_trial = Some(c.day);
            }

            for (area, weight) in &c.health_area_weights.0 {
                *stats.area_totals.entry(*area).or_default() += i64::from(*weight);
            }

            let Some(act) = act_for_day(c.day) else {
                continue;
            };
            let act = &mut acts[usize::from(act - 1)];
            act.total_days += 1;
            if c.completed {
                act.completed_days += 1;
            }
            for (area, weight) in &c.health_area_weights.0 {
                *act.area_totals.entry(*area).or_default() += i64::from(*weight);
            }
        }

        stats.completion_percent = completion_percent(stats.completed_days);
        stats.acts = acts;
        stats
    }
}

/// `completed / 21 * 100`, rounded half up.
pub fn completion_percent(completed: usize) -> u32 {
    let total = JOURNEY_DAYS as usize;
    let completed = completed.min(total);
    ((completed * 200 + total) / (2 * total)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use uuid::Uuid;

    use jornada_db::models::is_fire_trial_day;

    fn challenges() -> Vec<Challenge> {
        (1..=JOURNEY_DAYS)
            .map(|day| Challenge {
                plan_id: Uuid::nil(),
                day,
                title: format!("Day {day}"),
                objective: "Grow".to_string(),
                instructions: vec![],
                estimated_time: "5 min".to_string(),
                style_notes: String::new(),
                health_area_weights: Json(BTreeMap::from([
                    (HealthArea::Physical, 2),
                    (HealthArea::Mental, 1),
                ])),
                xp: 100 + day,
                is_fire_trial: is_fire_trial_day(day),
                completed: false,
            })
            .collect()
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(completion_percent(0), 0);
        assert_eq!(completion_percent(7), 33);
        assert_eq!(completion_percent(14), 67);
        assert_eq!(completion_percent(21), 100);
        assert_eq!(completion_percent(1), 5);
    }

    #[test]
    fn acts_cover_the_journey() {
        assert_eq!(act_for_day(1), Some(1));
        assert_eq!(act_for_day(7), Some(1));
        assert_eq!(act_for_day(8), Some(2));
        assert_eq!(act_for_day(21), Some(3));
        assert_eq!(act_for_day(0), None);
        assert_eq!(act_for_day(22), None);
    }

    #[test]
    fn empty_progress() {
        let stats = PlanStats::compute(&challenges());
        assert_eq!(stats.completed_days, 0);
        assert_eq!(stats.points, 0);
        assert_eq!(stats.next_fire_trial, Some(7));
        assert_eq!(stats.area_totals[&HealthArea::Physical], 42);
        assert_eq!(stats.acts.iter().map(|a| a.total_days).sum::<usize>(), 21);
        assert_eq!(stats.acts[1].area_totals[&HealthArea::Mental], 7);
    }

    #[test]
    fn completing_first_act() {
        let mut days = challenges();
        for c in days.iter_mut().take(7) {
            c.completed = true;
        }
        let stats = PlanStats::compute(&days);
        assert_eq!(stats.completion_percent, 33);
        assert_eq!(stats.acts[0].completed_days, 7);
        assert_eq!(stats.acts[0].total_days, 7);
        assert_eq!(stats.acts[1].completed_days, 0);
        assert_eq!(stats.points, (1..=7).map(|d| 100 + d as i64).sum::<i64>());
        assert_eq!(stats.next_fire_trial, Some(13));
    }

    #[test]
    fn weights_count_regardless_of_completion() {
        let mut days = challenges();
        let before = PlanStats::compute(&days).area_totals;
        days[3].completed = true;
        assert_eq!(PlanStats::compute(&days).area_totals, before);
    }
}
