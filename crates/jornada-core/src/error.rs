//! Error taxonomy shared by every service.

use jornada_db::models::HealthArea;

use crate::generate::GenerationError;
use crate::wizard::WizardStep;

/// Input rejected before any side effect took place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please choose {0}")]
    MissingSelection(&'static str),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("select at least {min} health areas ({selected} selected)")]
    TooFewHealthAreas { selected: usize, min: usize },

    #[error("select at most {max} health areas ({selected} selected)")]
    TooManyHealthAreas { selected: usize, max: usize },

    #[error("health area {0} is selected twice")]
    DuplicateHealthArea(HealthArea),

    #[error("action {action} is not available on the {step} step")]
    UnexpectedAction {
        step: WizardStep,
        action: &'static str,
    },

    #[error("a plan is being generated, please wait")]
    Busy,

    #[error("{field} must be a #rrggbb color, got {value:?}")]
    InvalidColor { field: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Failure of a service operation, mapped one-to-one onto a message the
/// rendering layer can show.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no generation credits left (balance {balance})")]
    InsufficientCredit { balance: i32 },

    #[error("plan generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("storage failure: {0:#}")]
    Persistence(#[from] anyhow::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("payment failed: {0}")]
    Payment(String),

    #[error("no tenant configuration is available")]
    TenantUnavailable,
}

impl ServiceError {
    /// Text safe to show to an end user. Internal detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::InsufficientCredit { .. } => {
                "You have no credits left. Purchase a package to generate a new plan.".to_string()
            }
            Self::Generation(_) => {
                "We could not generate your plan. Your credits were not charged; please try again."
                    .to_string()
            }
            Self::Persistence(_) => "Something went wrong while saving. Please try again.".to_string(),
            Self::NotFound(what) => format!("{what} not found."),
            Self::Forbidden(_) => "You are not allowed to do that.".to_string(),
            Self::Payment(reason) => format!("Payment was not completed: {reason}."),
            Self::TenantUnavailable => {
                "This site is not configured yet. Please contact support.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_and_generation_failures_read_differently() {
        let credit = ServiceError::InsufficientCredit { balance: 0 };
        let generation = ServiceError::Generation(GenerationError::EmptyResponse);
        assert_ne!(credit.user_message(), generation.user_message());
        assert!(credit.user_message().contains("credits"));
    }

    #[test]
    fn persistence_message_hides_detail() {
        let err = ServiceError::Persistence(anyhow::anyhow!("connection reset by peer"));
        assert!(!err.user_message().contains("connection reset"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn validation_message_passes_through() {
        let err = ServiceError::from(ValidationError::EmptyField("mentor profile"));
        assert_eq!(err.user_message(), "mentor profile must not be empty");
    }
}
