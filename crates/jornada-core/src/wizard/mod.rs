//! Plan-creation wizard.
//!
//! A pure state machine over immutable values. Each [`transition`] returns
//! a new [`WizardState`]; nothing here touches the store or the provider.
//!
//! ```text
//! welcome -> qualification -> method -+-> content_choice -+-> material_upload -+
//!                                     |   (existing)      |                    |
//!                                     |                   +--------------------+-> avatar_creation
//!                                     +---------------------------------------+   (new / AI only)
//!
//! avatar_creation -+-> interests (individual) -+-> health_areas -> generating -+-> complete
//!                  +---------------------------+      ^                       |
//!                           (group)                   +------ failure --------+
//! ```

pub mod payload;

use std::fmt;

use serde::{Deserialize, Serialize};

use jornada_db::models::{HealthArea, MethodologyStatus, TransformationType};

use crate::error::ValidationError;

pub use payload::{
    DEFAULT_PLAN_TYPE, MAX_HEALTH_AREAS, MIN_HEALTH_AREAS, Payload, toggle_health_area,
    validate_health_areas,
};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Welcome,
    Qualification,
    Method,
    ContentChoice,
    MaterialUpload,
    AvatarCreation,
    Interests,
    HealthAreas,
    Generating,
    Complete,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::Qualification => "qualification",
            Self::Method => "method",
            Self::ContentChoice => "content_choice",
            Self::MaterialUpload => "material_upload",
            Self::AvatarCreation => "avatar_creation",
            Self::Interests => "interests",
            Self::HealthAreas => "health_areas",
            Self::Generating => "generating",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// State and actions
// ---------------------------------------------------------------------------

/// Current step plus everything collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    #[serde(default)]
    pub payload: Payload,
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Welcome,
            payload: Payload::default(),
        }
    }

    /// Whether the health-area screen may submit.
    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::HealthAreas && self.payload.validate().is_ok()
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

/// One user interaction with the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    Begin,
    Qualify {
        transformation: Option<TransformationType>,
        #[serde(default)]
        mentor_profile: String,
    },
    ChooseMethod {
        methodology: Option<MethodologyStatus>,
    },
    ChooseContent {
        upload_material: bool,
    },
    UploadMaterial {
        #[serde(default)]
        material: String,
    },
    CreateAvatar {
        #[serde(default)]
        student_name: String,
        #[serde(default)]
        student_profile: String,
    },
    SetInterests {
        #[serde(default)]
        interests: String,
    },
    ToggleHealthArea {
        area: HealthArea,
    },
    Submit,
    Back,
}

impl WizardAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Qualify { .. } => "qualify",
            Self::ChooseMethod { .. } => "choose_method",
            Self::ChooseContent { .. } => "choose_content",
            Self::UploadMaterial { .. } => "upload_material",
            Self::CreateAvatar { .. } => "create_avatar",
            Self::SetInterests { .. } => "set_interests",
            Self::ToggleHealthArea { .. } => "toggle_health_area",
            Self::Submit => "submit",
            Self::Back => "back",
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Apply `action` to `state`, returning the next state.
///
/// An action that does not belong to the current step is rejected with
/// [`ValidationError::UnexpectedAction`]. While generating, every action is
/// rejected with [`ValidationError::Busy`].
pub fn transition(state: &WizardState, action: WizardAction) -> Result<WizardState, ValidationError> {
    use WizardStep as S;

    let mut next = state.clone();
    match (state.step, action) {
        (S::Generating, _) => return Err(ValidationError::Busy),

        (step, WizardAction::Back) => {
            if step == S::Complete {
                return Err(ValidationError::UnexpectedAction { step, action: "back" });
            }
            next.step = previous_step(state);
        }

        (S::Welcome, WizardAction::Begin) => next.step = S::Qualification,

        (
            S::Qualification,
            WizardAction::Qualify {
                transformation,
                mentor_profile,
            },
        ) => {
            let transformation =
                transformation.ok_or(ValidationError::MissingSelection("a transformation type"))?;
            next.payload.mentor_profile = required(&mentor_profile, "mentor profile")?;
            next.payload.transformation = Some(transformation);
            next.step = S::Method;
        }

        (S::Method, WizardAction::ChooseMethod { methodology }) => {
            let methodology =
                methodology.ok_or(ValidationError::MissingSelection("a methodology"))?;
            next.payload.methodology = Some(methodology);
            next.step = match methodology {
                MethodologyStatus::Existing => S::ContentChoice,
                MethodologyStatus::New => {
                    next.payload.has_material = false;
                    next.payload.material = None;
                    S::AvatarCreation
                }
            };
        }

        (S::ContentChoice, WizardAction::ChooseContent { upload_material }) => {
            next.payload.has_material = upload_material;
            if upload_material {
                next.step = S::MaterialUpload;
            } else {
                next.payload.material = None;
                next.step = S::AvatarCreation;
            }
        }

        (S::MaterialUpload, WizardAction::UploadMaterial { material }) => {
            next.payload.material = Some(required(&material, "material")?);
            next.step = S::AvatarCreation;
        }

        (
            S::AvatarCreation,
            WizardAction::CreateAvatar {
                student_name,
                student_profile,
            },
        ) => {
            next.payload.student_name = required(&student_name, "student name")?;
            next.payload.student_profile = student_profile.trim().to_string();
            if next.payload.is_group_plan() {
                next.payload.interests = None;
                next.step = S::HealthAreas;
            } else {
                next.step = S::Interests;
            }
        }

        (S::Interests, WizardAction::SetInterests { interests }) => {
            let interests = interests.trim();
            next.payload.interests = (!interests.is_empty()).then(|| interests.to_string());
            next.step = S::HealthAreas;
        }

        (S::HealthAreas, WizardAction::ToggleHealthArea { area }) => {
            toggle_health_area(&mut next.payload.health_areas, area);
        }

        (S::HealthAreas, WizardAction::Submit) => {
            next.payload.validate()?;
            next.step = S::Generating;
        }

        (step, action) => {
            return Err(ValidationError::UnexpectedAction {
                step,
                action: action.name(),
            });
        }
    }
    Ok(next)
}

/// The step before the current one, given what the payload already records.
fn previous_step(state: &WizardState) -> WizardStep {
    use WizardStep as S;

    let payload = &state.payload;
    match state.step {
        S::Welcome | S::Qualification => S::Welcome,
        S::Method => S::Qualification,
        S::ContentChoice => S::Method,
        S::MaterialUpload => S::ContentChoice,
        S::AvatarCreation => match payload.methodology {
            Some(MethodologyStatus::Existing) if payload.has_material => S::MaterialUpload,
            Some(MethodologyStatus::Existing) => S::ContentChoice,
            _ => S::Method,
        },
        S::Interests => S::AvatarCreation,
        S::HealthAreas if payload.is_group_plan() => S::AvatarCreation,
        S::HealthAreas => S::Interests,
        S::Generating => S::Generating,
        S::Complete => S::Complete,
    }
}

/// Leave the generating step once the provider call has settled.
pub fn resolve_generation(
    state: &WizardState,
    succeeded: bool,
) -> Result<WizardState, ValidationError> {
    if state.step != WizardStep::Generating {
        return Err(ValidationError::UnexpectedAction {
            step: state.step,
            action: "resolve_generation",
        });
    }
    let mut next = state.clone();
    next.step = if succeeded {
        WizardStep::Complete
    } else {
        WizardStep::HealthAreas
    };
    Ok(next)
}
