//! Operator-mode CLI handler for `jornada plan show <mentor-id>`.

use anyhow::{Context, Result};
use uuid::Uuid;

use jornada_core::plan::PlanAggregate;
use jornada_db::store::RecordStore;

use crate::PlanCommands;

pub async fn run_plan_command(command: PlanCommands, store: &dyn RecordStore) -> Result<()> {
    match command {
        PlanCommands::Show { mentor_id } => {
            let id = Uuid::parse_str(&mentor_id)
                .with_context(|| format!("invalid mentor ID: {mentor_id}"))?;
            match load_plan(store, id).await? {
                Some(plan) => print!("{}", format_plan(&plan)),
                None => println!("Mentor {id} has no plan yet."),
            }
            Ok(())
        }
    }
}

/// A mentor's current plan, read straight from the store.
pub async fn load_plan(store: &dyn RecordStore, mentor_id: Uuid) -> Result<Option<PlanAggregate>> {
    let Some(plan) = store.current_plan(mentor_id).await? else {
        return Ok(None);
    };
    let challenges = store.list_challenges(plan.id).await?;
    let comments = store.list_comments(plan.id).await?;
    Ok(Some(PlanAggregate::assemble(plan, challenges, comments)))
}

fn format_plan(aggregate: &PlanAggregate) -> String {
    let plan = &aggregate.plan;
    let stats = aggregate.stats();

    let mut out = String::with_capacity(2048);
    out.push_str(&format!("Plan:     {} ({})\n", plan.title, plan.id));
    out.push_str(&format!("Student:  {}\n", plan.student_name));
    out.push_str(&format!(
        "Created:  {}\n",
        plan.created_at.format("%Y-%m-%d %H:%M")
    ));
    out.push_str(&format!(
        "Progress: {}/21 days ({}%), {}/{} xp\n",
        stats.completed_days, stats.completion_percent, stats.points, stats.max_points
    ));
    if let Some(day) = stats.next_fire_trial {
        out.push_str(&format!("Next Fire Trial: day {day}\n"));
    }
    for act in &stats.acts {
        out.push_str(&format!(
            "  Act {} (days {}-{}): {}/{}\n",
            act.act, act.first_day, act.last_day, act.completed_days, act.total_days
        ));
    }
    out.push('\n');

    for entry in &aggregate.challenges {
        let c = &entry.challenge;
        let mark = if c.completed { "x" } else { " " };
        let trial = if c.is_fire_trial { " [fire trial]" } else { "" };
        out.push_str(&format!(
            "  [{mark}] day {:>2}  {:>3} xp  {}{trial}\n",
            c.day, c.xp, c.title
        ));
        for comment in &entry.comments {
            out.push_str(&format!("        {}: {}\n", comment.author_name, comment.text));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    use jornada_db::models::{Comment, HealthArea, METHODOLOGY_TAG, Plan};
    use jornada_db::store::MemoryStore;
    use jornada_test_utils::{new_mentor, sample_challenges};

    async fn seeded(store: &MemoryStore) -> Plan {
        let mentor = store
            .insert_user(&new_mentor("ana@example.com", 1))
            .await
            .unwrap();
        let plan = Plan {
            id: Uuid::new_v4(),
            mentor_id: mentor.id,
            student_name: "Bia".to_string(),
            title: "Reset: Bia".to_string(),
            description: "A gentle reset".to_string(),
            health_areas: Json(vec![HealthArea::Physical]),
            is_group: false,
            plan_type: "21_day_journey".to_string(),
            methodology: METHODOLOGY_TAG.to_string(),
            created_at: Utc::now(),
        };
        let challenges = sample_challenges(plan.id, &[HealthArea::Physical]);
        store.replace_current_plan(&plan, &challenges).await.unwrap();
        plan
    }

    #[tokio::test]
    async fn missing_plan_is_none() {
        let store = MemoryStore::new();
        assert!(load_plan(&store, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn shows_progress_and_comments() {
        let store = MemoryStore::new();
        let plan = seeded(&store).await;
        store.set_challenge_completed(plan.id, 1, true).await.unwrap();
        store
            .insert_comment(&Comment {
                id: Uuid::new_v4(),
                plan_id: plan.id,
                day: 1,
                author_name: "Bia".to_string(),
                text: "Started!".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let aggregate = load_plan(&store, plan.mentor_id).await.unwrap().unwrap();
        let text = format_plan(&aggregate);
        assert!(text.contains("1/21 days (5%)"));
        assert!(text.contains("[x] day  1"));
        assert!(text.contains("Bia: Started!"));
        assert!(text.contains("Next Fire Trial: day 7"));
        assert!(text.contains("day 21  310 xp  Day 21 [fire trial]"));
    }
}
