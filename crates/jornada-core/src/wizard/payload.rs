use serde::{Deserialize, Serialize};

use jornada_db::models::{HealthArea, MethodologyStatus, TransformationType};

use crate::error::ValidationError;

pub const MIN_HEALTH_AREAS: usize = 5;
pub const MAX_HEALTH_AREAS: usize = 7;

/// Plan-type tag used when the wizard is not told otherwise.
pub const DEFAULT_PLAN_TYPE: &str = "21_day_journey";

/// Everything the wizard has collected about the journey to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub mentor_profile: String,
    #[serde(default)]
    pub transformation: Option<TransformationType>,
    #[serde(default)]
    pub methodology: Option<MethodologyStatus>,
    #[serde(default)]
    pub has_material: bool,
    #[serde(default)]
    pub material: Option<String>,
    /// Student name, or the group's name for group plans.
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_profile: String,
    #[serde(default)]
    pub interests: Option<String>,
    /// Selected areas in selection order.
    #[serde(default)]
    pub health_areas: Vec<HealthArea>,
    #[serde(default = "default_plan_type")]
    pub plan_type: String,
}

fn default_plan_type() -> String {
    DEFAULT_PLAN_TYPE.to_string()
}

impl Default for Payload {
    fn default() -> Self {
        Self {
            mentor_profile: String::new(),
            transformation: None,
            methodology: None,
            has_material: false,
            material: None,
            student_name: String::new(),
            student_profile: String::new(),
            interests: None,
            health_areas: Vec::new(),
            plan_type: default_plan_type(),
        }
    }
}

impl Payload {
    pub fn is_group_plan(&self) -> bool {
        self.transformation == Some(TransformationType::Group)
    }

    /// Check that the payload is complete enough to generate from.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.transformation.is_none() {
            return Err(ValidationError::MissingSelection("a transformation type"));
        }
        if self.mentor_profile.trim().is_empty() {
            return Err(ValidationError::EmptyField("mentor profile"));
        }
        if self.methodology.is_none() {
            return Err(ValidationError::MissingSelection("a methodology"));
        }
        if self.has_material && self.material.as_deref().is_none_or(|m| m.trim().is_empty()) {
            return Err(ValidationError::EmptyField("material"));
        }
        if self.student_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("student name"));
        }
        if self.plan_type.trim().is_empty() {
            return Err(ValidationError::EmptyField("plan type"));
        }
        validate_health_areas(&self.health_areas)
    }
}

/// 5..=7 distinct areas.
pub fn validate_health_areas(areas: &[HealthArea]) -> Result<(), ValidationError> {
    for (i, area) in areas.iter().enumerate() {
        if areas[..i].contains(area) {
            return Err(ValidationError::DuplicateHealthArea(*area));
        }
    }
    let selected = areas.len();
    if selected < MIN_HEALTH_AREAS {
        return Err(ValidationError::TooFewHealthAreas {
            selected,
            min: MIN_HEALTH_AREAS,
        });
    }
    if selected > MAX_HEALTH_AREAS {
        return Err(ValidationError::TooManyHealthAreas {
            selected,
            max: MAX_HEALTH_AREAS,
        });
    }
    Ok(())
}

/// Deselect `area` if selected, otherwise add it unless the cap is reached.
/// Additions beyond the cap are ignored.
pub fn toggle_health_area(areas: &mut Vec<HealthArea>, area: HealthArea) {
    if let Some(pos) = areas.iter().position(|a| *a == area) {
        areas.remove(pos);
    } else if areas.len() < MAX_HEALTH_AREAS {
        areas.push(area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_payload() -> Payload {
        Payload {
            mentor_profile: "Yoga teacher, 10 years".to_string(),
            transformation: Some(TransformationType::Individual),
            methodology: Some(MethodologyStatus::New),
            student_name: "Bia".to_string(),
            student_profile: "Busy nurse".to_string(),
            health_areas: HealthArea::ALL[..5].to_vec(),
            ..Payload::default()
        }
    }

    #[test]
    fn default_plan_type_is_journey() {
        assert_eq!(Payload::default().plan_type, "21_day_journey");
        let parsed: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.plan_type, "21_day_journey");
    }

    #[test]
    fn complete_payload_validates() {
        assert!(complete_payload().validate().is_ok());
    }

    #[test]
    fn group_flag_follows_transformation() {
        let mut p = complete_payload();
        assert!(!p.is_group_plan());
        p.transformation = Some(TransformationType::Group);
        assert!(p.is_group_plan());
    }

    #[test]
    fn material_required_when_flagged() {
        let mut p = complete_payload();
        p.has_material = true;
        p.material = Some("   ".to_string());
        assert_eq!(p.validate(), Err(ValidationError::EmptyField("material")));
    }

    #[test]
    fn area_bounds() {
        assert!(matches!(
            validate_health_areas(&HealthArea::ALL[..4]),
            Err(ValidationError::TooFewHealthAreas { selected: 4, .. })
        ));
        assert!(validate_health_areas(&HealthArea::ALL).is_ok());
        let dup = [
            HealthArea::Physical,
            HealthArea::Mental,
            HealthArea::Social,
            HealthArea::Financial,
            HealthArea::Physical,
        ];
        assert_eq!(
            validate_health_areas(&dup),
            Err(ValidationError::DuplicateHealthArea(HealthArea::Physical))
        );
    }

    #[test]
    fn toggle_removes_then_readds() {
        let mut areas = HealthArea::ALL.to_vec();
        toggle_health_area(&mut areas, HealthArea::Mental);
        assert_eq!(areas.len(), 6);
        toggle_health_area(&mut areas, HealthArea::Mental);
        assert_eq!(areas.len(), 7);
        assert_eq!(areas.last(), Some(&HealthArea::Mental));
    }
}
