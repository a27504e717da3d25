//! Generation request construction. Pure logic, no I/O.

use serde_json::{Value, json};

use jornada_db::models::{FIRE_TRIAL_DAYS, HealthArea, JOURNEY_DAYS, MethodologyStatus};

use super::{MAX_WEIGHT, MAX_XP, MIN_WEIGHT, MIN_XP};
use crate::wizard::Payload;

/// Instruction plus the structured-output schema sent to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub instruction: String,
    pub schema: Value,
}

/// Structural rules the provider must follow, restated in the instruction
/// because not every provider enforces the schema.
const OUTPUT_RULES: &str = "## Output rules\n\n\
- Return a JSON array with exactly 21 objects, one per day, days 1 through 21.\n\
- Days 7, 13 and 21 are Fire Trials: set `isFireTrial` to true on those days \
and false on every other day. Fire Trials are harder checkpoint challenges.\n\
- Days 1-7 form Act 1 (awakening), days 8-14 Act 2 (confrontation), \
days 15-21 Act 3 (transformation). Difficulty should rise across acts.\n\
- `health_area_weights` must contain every selected health area and nothing \
else, each with an integer weight from 0 to 3.\n\
- `xp` is an integer between 100 and 500; Fire Trials are worth more.\n\
- `instructions` is an ordered list of short, concrete steps.\n\
- Do not add fields beyond the schema.\n";

pub fn build_request(payload: &Payload) -> GenerationRequest {
    GenerationRequest {
        instruction: build_instruction(payload),
        schema: output_schema(&payload.health_areas),
    }
}

/// Build the natural-language instruction for `payload`.
pub fn build_instruction(payload: &Payload) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("# 21-day transformation journey\n\n");
    prompt.push_str(
        "You are an expert coach designing a gamified 21-day journey. \
         Each day has one challenge the student completes and checks off.\n\n",
    );

    prompt.push_str("## Mentor\n\n");
    prompt.push_str(&format!("{}\n\n", payload.mentor_profile.trim()));
    match payload.methodology {
        Some(MethodologyStatus::Existing) => prompt.push_str(
            "The mentor already has an established methodology; stay faithful to it.\n",
        ),
        _ => prompt.push_str("The mentor is building a new methodology; propose one.\n"),
    }
    if payload.has_material {
        if let Some(material) = payload.material.as_deref() {
            prompt.push_str("\n### Mentor material\n\n");
            prompt.push_str(material.trim());
            prompt.push('\n');
        }
    }
    prompt.push('\n');

    if payload.is_group_plan() {
        prompt.push_str("## Group\n\n");
        prompt.push_str(&format!(
            "This journey is for a group called \"{}\". Challenges must work for \
             every member and may include shared activities.\n",
            payload.student_name.trim()
        ));
    } else {
        prompt.push_str("## Student\n\n");
        prompt.push_str(&format!("Name: {}\n", payload.student_name.trim()));
    }
    if !payload.student_profile.trim().is_empty() {
        prompt.push_str(&format!("Profile: {}\n", payload.student_profile.trim()));
    }
    if let Some(interests) = payload.interests.as_deref() {
        prompt.push_str(&format!("Interests: {}\n", interests.trim()));
    }
    prompt.push('\n');

    prompt.push_str("## Health areas\n\n");
    for area in &payload.health_areas {
        prompt.push_str(&format!("- `{area}`: {}\n", area.label()));
    }
    prompt.push('\n');

    prompt.push_str(&format!("Plan type: {}\n\n", payload.plan_type));
    prompt.push_str(OUTPUT_RULES);

    prompt
}

/// JSON schema for the day list, with one weight property per selected area.
///
/// Uses the upper-case type names of the `responseSchema` dialect.
pub fn output_schema(areas: &[HealthArea]) -> Value {
    let weight_properties: serde_json::Map<String, Value> = areas
        .iter()
        .map(|area| {
            (
                area.to_string(),
                json!({
                    "type": "INTEGER",
                    "minimum": MIN_WEIGHT,
                    "maximum": MAX_WEIGHT,
                }),
            )
        })
        .collect();
    let weight_required: Vec<String> = areas.iter().map(ToString::to_string).collect();

    json!({
        "type": "ARRAY",
        "minItems": JOURNEY_DAYS,
        "maxItems": JOURNEY_DAYS,
        "items": {
            "type": "OBJECT",
            "properties": {
                "day": { "type": "INTEGER", "minimum": 1, "maximum": JOURNEY_DAYS },
                "title": { "type": "STRING" },
                "objective": { "type": "STRING" },
                "instructions": { "type": "ARRAY", "items": { "type": "STRING" } },
                "estimated_time": { "type": "STRING" },
                "style_notes": { "type": "STRING" },
                "health_area_weights": {
                    "type": "OBJECT",
                    "properties": weight_properties,
                    "required": weight_required,
                },
                "xp": { "type": "INTEGER", "minimum": MIN_XP, "maximum": MAX_XP },
                "isFireTrial": {
                    "type": "BOOLEAN",
                    "description": format!("true only on days {FIRE_TRIAL_DAYS:?}"),
                },
            },
            "required": [
                "day", "title", "objective", "instructions", "estimated_time",
                "style_notes", "health_area_weights", "xp", "isFireTrial"
            ],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jornada_db::models::TransformationType;

    fn payload() -> Payload {
        Payload {
            mentor_profile: "Breathwork coach".to_string(),
            transformation: Some(TransformationType::Individual),
            methodology: Some(MethodologyStatus::Existing),
            has_material: true,
            material: Some("The box-breathing ladder".to_string()),
            student_name: "Bia".to_string(),
            student_profile: "Night-shift nurse".to_string(),
            interests: Some("hiking".to_string()),
            health_areas: vec![
                HealthArea::Physical,
                HealthArea::Mental,
                HealthArea::Emotional,
                HealthArea::Social,
                HealthArea::Spiritual,
            ],
            ..Payload::default()
        }
    }

    #[test]
    fn instruction_embeds_every_payload_field() {
        let text = build_instruction(&payload());
        for needle in [
            "Breathwork coach",
            "established methodology",
            "box-breathing ladder",
            "Name: Bia",
            "Night-shift nurse",
            "Interests: hiking",
            "`physical`",
            "`spiritual`",
            "21_day_journey",
            "exactly 21 objects",
            "Days 7, 13 and 21",
        ] {
            assert!(text.contains(needle), "instruction missing {needle:?}");
        }
        assert!(!text.contains("`financial`"));
    }

    #[test]
    fn group_instruction_names_the_group() {
        let mut p = payload();
        p.transformation = Some(TransformationType::Group);
        p.student_name = "Morning circle".to_string();
        let text = build_instruction(&p);
        assert!(text.contains("group called \"Morning circle\""));
        assert!(!text.contains("Name: "));
    }

    #[test]
    fn material_left_out_when_not_flagged() {
        let mut p = payload();
        p.has_material = false;
        assert!(!build_instruction(&p).contains("box-breathing"));
    }

    #[test]
    fn schema_lists_selected_areas_only() {
        let schema = output_schema(&[HealthArea::Physical, HealthArea::Financial]);
        let weights = &schema["items"]["properties"]["health_area_weights"];
        let props = weights["properties"].as_object().unwrap();
        assert_eq!(props.len(), 2);
        assert!(props.contains_key("financial"));
        assert_eq!(weights["required"], json!(["physical", "financial"]));
        assert_eq!(schema["minItems"], json!(21));
        assert_eq!(
            schema["items"]["required"],
            json!([
                "day", "title", "objective", "instructions", "estimated_time",
                "style_notes", "health_area_weights", "xp", "isFireTrial"
            ])
        );
    }

    #[test]
    fn build_request_pairs_instruction_and_schema() {
        let p = payload();
        let req = build_request(&p);
        assert_eq!(req.schema, output_schema(&p.health_areas));
        assert_eq!(req.instruction, build_instruction(&p));
    }
}
