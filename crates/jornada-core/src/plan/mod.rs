//! The 21-day plan aggregate, its derived statistics, and the services
//! that create and update it.

pub mod aggregate;
pub mod service;
pub mod stats;

pub use aggregate::{DayEntry, PlanAggregate};
pub use service::{
    GeneratedPlan, add_comment, create_plan, current_plan, generate_plan, toggle_challenge,
};
pub use stats::{ActStats, PlanStats};
