use serde::Serialize;

use jornada_db::models::{Challenge, Comment, JOURNEY_DAYS, Plan};

use super::stats::PlanStats;

/// A challenge with the comments left on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEntry {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub comments: Vec<Comment>,
}

/// A plan with its days, in day order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanAggregate {
    #[serde(flatten)]
    pub plan: Plan,
    pub challenges: Vec<DayEntry>,
}

impl PlanAggregate {
    /// Group `comments` under their day. Comments for unknown days are
    /// dropped.
    pub fn assemble(plan: Plan, mut challenges: Vec<Challenge>, comments: Vec<Comment>) -> Self {
        challenges.sort_by_key(|c| c.day);
        let mut days: Vec<DayEntry> = challenges
            .into_iter()
            .map(|challenge| DayEntry {
                challenge,
                comments: Vec::new(),
            })
            .collect();
        for comment in comments {
            if let Some(entry) = days.iter_mut().find(|d| d.challenge.day == comment.day) {
                entry.comments.push(comment);
            }
        }
        for entry in &mut days {
            entry.comments.sort_by_key(|c| c.created_at);
        }
        Self {
            plan,
            challenges: days,
        }
    }

    pub fn day(&self, day: i32) -> Option<&DayEntry> {
        self.challenges.iter().find(|d| d.challenge.day == day)
    }

    /// Set the completion flag of `day`. Returns `false` if there is no
    /// such day.
    pub fn toggle(&mut self, day: i32, completed: bool) -> bool {
        match self.challenges.iter_mut().find(|d| d.challenge.day == day) {
            Some(entry) => {
                entry.challenge.completed = completed;
                true
            }
            None => false,
        }
    }

    /// Append `comment` to its day. Returns `false` if there is no such day.
    pub fn push_comment(&mut self, comment: Comment) -> bool {
        match self
            .challenges
            .iter_mut()
            .find(|d| d.challenge.day == comment.day)
        {
            Some(entry) => {
                entry.comments.push(comment);
                true
            }
            None => false,
        }
    }

    /// Exactly one entry for each day 1..=21.
    pub fn is_complete(&self) -> bool {
        self.challenges.len() == JOURNEY_DAYS as usize
            && self
                .challenges
                .iter()
                .zip(1..=JOURNEY_DAYS)
                .all(|(entry, day)| entry.challenge.day == day)
    }

    pub fn stats(&self) -> PlanStats {
        PlanStats::compute(self.challenges.iter().map(|d| &d.challenge))
    }
}
