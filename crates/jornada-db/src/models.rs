use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// Number of days in every journey.
pub const JOURNEY_DAYS: i32 = 21;

/// Days flagged as Fire Trials (milestone checkpoints).
pub const FIRE_TRIAL_DAYS: [i32; 3] = [7, 13, 21];

/// Methodology tag stamped on every generated plan.
pub const METHODOLOGY_TAG: &str = "fire-trial-21";

/// Whether `day` is one of the milestone days.
pub fn is_fire_trial_day(day: i32) -> bool {
    FIRE_TRIAL_DAYS.contains(&day)
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Mentor,
    Student,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mentor => "mentor",
            Self::Student => "student",
            Self::Admin => "admin",
        };
        f.write_str(s)
    }
}

impl FromStr for UserRole {
    type Err = UserRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mentor" => Ok(Self::Mentor),
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            other => Err(UserRoleParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`UserRole`] string.
#[derive(Debug, Clone)]
pub struct UserRoleParseError(pub String);

impl fmt::Display for UserRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid user role: {:?}", self.0)
    }
}

impl std::error::Error for UserRoleParseError {}

// ---------------------------------------------------------------------------

/// One of the seven life domains a challenge can weigh on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HealthArea {
    Physical,
    Mental,
    Emotional,
    Spiritual,
    Social,
    Financial,
    Professional,
}

impl HealthArea {
    /// Every area, in presentation order.
    pub const ALL: [HealthArea; 7] = [
        Self::Physical,
        Self::Mental,
        Self::Emotional,
        Self::Spiritual,
        Self::Social,
        Self::Financial,
        Self::Professional,
    ];

    /// Label shown to mentors and embedded in generation prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Physical => "Physical health",
            Self::Mental => "Mental health",
            Self::Emotional => "Emotional health",
            Self::Spiritual => "Spiritual health",
            Self::Social => "Social life",
            Self::Financial => "Financial health",
            Self::Professional => "Professional life",
        }
    }
}

impl fmt::Display for HealthArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Physical => "physical",
            Self::Mental => "mental",
            Self::Emotional => "emotional",
            Self::Spiritual => "spiritual",
            Self::Social => "social",
            Self::Financial => "financial",
            Self::Professional => "professional",
        };
        f.write_str(s)
    }
}

impl FromStr for HealthArea {
    type Err = HealthAreaParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "physical" => Ok(Self::Physical),
            "mental" => Ok(Self::Mental),
            "emotional" => Ok(Self::Emotional),
            "spiritual" => Ok(Self::Spiritual),
            "social" => Ok(Self::Social),
            "financial" => Ok(Self::Financial),
            "professional" => Ok(Self::Professional),
            other => Err(HealthAreaParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`HealthArea`] string.
#[derive(Debug, Clone)]
pub struct HealthAreaParseError(pub String);

impl fmt::Display for HealthAreaParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid health area: {:?}", self.0)
    }
}

impl std::error::Error for HealthAreaParseError {}

// ---------------------------------------------------------------------------

/// Whether a journey targets one student or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationType {
    Individual,
    Group,
}

impl fmt::Display for TransformationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Individual => "individual",
            Self::Group => "group",
        };
        f.write_str(s)
    }
}

/// Whether the mentor brings an established methodology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodologyStatus {
    Existing,
    New,
}

impl fmt::Display for MethodologyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Existing => "existing",
            Self::New => "new",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// JSON column payloads
// ---------------------------------------------------------------------------

/// Mentor-facing presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingSettings {
    pub logo_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    /// Display name of the mentoring program.
    pub program_name: String,
    /// Display name of the expert running the program.
    pub expert_name: String,
}

impl Default for BrandingSettings {
    fn default() -> Self {
        Self {
            logo_url: None,
            primary_color: "#e4572e".to_string(),
            secondary_color: "#17183b".to_string(),
            accent_color: "#ffc914".to_string(),
            program_name: "Jornada 21".to_string(),
            expert_name: "Your mentor".to_string(),
        }
    }
}

/// Copy rendered on a tenant's landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingCopy {
    pub headline: String,
    pub subheadline: String,
    pub call_to_action: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl Default for LandingCopy {
    fn default() -> Self {
        Self {
            headline: "21 days to transform a life".to_string(),
            subheadline: "Generate a gamified coaching journey for your students in minutes."
                .to_string(),
            call_to_action: "Start your journey".to_string(),
            highlights: vec![],
        }
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A user account: mentor, student, or admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub tenant_slug: String,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    /// For students: the mentor whose plan they follow.
    pub mentor_id: Option<Uuid>,
    pub credits: i32,
    pub generation_count: i32,
    pub branding: Option<Json<BrandingSettings>>,
    pub notifications_enabled: bool,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

/// A tenant bundle keyed by subdomain slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TenantConfig {
    pub slug: String,
    pub branding: Json<BrandingSettings>,
    pub landing: Json<LandingCopy>,
    pub updated_at: DateTime<Utc>,
}

/// A 21-day plan. At most one exists per mentor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub student_name: String,
    pub title: String,
    pub description: String,
    pub health_areas: Json<Vec<HealthArea>>,
    pub is_group: bool,
    pub plan_type: String,
    pub methodology: String,
    pub created_at: DateTime<Utc>,
}

/// One day of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Challenge {
    pub plan_id: Uuid,
    pub day: i32,
    pub title: String,
    pub objective: String,
    pub instructions: Vec<String>,
    pub estimated_time: String,
    pub style_notes: String,
    pub health_area_weights: Json<BTreeMap<HealthArea, i32>>,
    pub xp: i32,
    pub is_fire_trial: bool,
    pub completed: bool,
}

/// A comment left on a challenge. The author is free text, not a user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub day: i32,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_display_roundtrip() {
        for v in [UserRole::Mentor, UserRole::Student, UserRole::Admin] {
            let parsed: UserRole = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn user_role_invalid() {
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn health_area_display_matches_serde() {
        for area in HealthArea::ALL {
            let json = serde_json::to_value(area).unwrap();
            assert_eq!(json, serde_json::Value::String(area.to_string()));
            assert_eq!(area.to_string().parse::<HealthArea>().unwrap(), area);
        }
    }

    #[test]
    fn health_area_invalid() {
        let err = "cosmic".parse::<HealthArea>().unwrap_err();
        assert!(err.to_string().contains("cosmic"));
    }

    #[test]
    fn there_are_seven_health_areas() {
        let mut all = HealthArea::ALL.to_vec();
        all.dedup();
        assert_eq!(all.len(), 7);
    }

    #[test]
    fn fire_trial_days() {
        let flagged: Vec<i32> = (1..=JOURNEY_DAYS).filter(|d| is_fire_trial_day(*d)).collect();
        assert_eq!(flagged, vec![7, 13, 21]);
    }

    #[test]
    fn weights_map_serializes_with_area_keys() {
        let mut weights = BTreeMap::new();
        weights.insert(HealthArea::Physical, 3);
        weights.insert(HealthArea::Social, 0);
        let json = serde_json::to_value(&weights).unwrap();
        assert_eq!(json, serde_json::json!({"physical": 3, "social": 0}));
        let back: BTreeMap<HealthArea, i32> = serde_json::from_value(json).unwrap();
        assert_eq!(back, weights);
    }
}
