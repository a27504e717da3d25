//! Helpers shared by the jornada-core integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use jornada_core::generate::{GenerationProvider, GenerationRequest, ProviderError};
use jornada_core::session::Session;
use jornada_core::users::{NewAccount, register_user};
use jornada_core::wizard::Payload;
use jornada_db::models::{
    HealthArea, MethodologyStatus, TenantConfig, TransformationType, UserRole, is_fire_trial_day,
};
use jornada_db::store::{MemoryStore, RecordStore};

/// A provider that replays a fixed answer and counts calls.
pub struct ScriptedProvider {
    answer: Result<String, u16>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            answer: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider answering with a valid 21-day plan over `areas`.
    pub fn valid(areas: &[HealthArea]) -> Self {
        Self::replying(valid_response(areas))
    }

    pub fn failing(status: u16) -> Self {
        Self {
            answer: Err(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &GenerationRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(ProviderError::Api {
                status: *status,
                body: "unavailable".to_string(),
            }),
        }
    }
}

/// Day `d` is worth `100 + 10 * d` xp; every area weighs `d % 4`.
pub fn valid_response(areas: &[HealthArea]) -> String {
    let days: Vec<Value> = (1..=21)
        .map(|d| {
            let weights: serde_json::Map<String, Value> =
                areas.iter().map(|a| (a.to_string(), json!(d % 4))).collect();
            json!({
                "day": d,
                "title": format!("Day {d}"),
                "objective": format!("Objective {d}"),
                "instructions": ["Breathe", "Journal"],
                "estimated_time": "15 min",
                "style_notes": "warm",
                "health_area_weights": weights,
                "xp": 100 + 10 * d,
                "isFireTrial": is_fire_trial_day(d),
            })
        })
        .collect();
    Value::Array(days).to_string()
}

pub fn five_areas() -> Vec<HealthArea> {
    HealthArea::ALL[..5].to_vec()
}

pub fn individual_payload(areas: Vec<HealthArea>) -> Payload {
    Payload {
        mentor_profile: "Breathwork coach".to_string(),
        transformation: Some(TransformationType::Individual),
        methodology: Some(MethodologyStatus::New),
        student_name: "Bia".to_string(),
        student_profile: "Night-shift nurse".to_string(),
        interests: Some("hiking".to_string()),
        health_areas: areas,
        ..Payload::default()
    }
}

pub async fn default_tenant(store: &MemoryStore) -> TenantConfig {
    store.get_tenant("default").await.unwrap().unwrap()
}

pub async fn mentor_session(store: &MemoryStore, email: &str, credits: i32) -> Session {
    let tenant = default_tenant(store).await;
    let user = register_user(
        store,
        &tenant,
        &NewAccount {
            display_name: "Ana".to_string(),
            email: email.to_string(),
            phone: None,
            role: UserRole::Mentor,
            mentor_id: None,
        },
        credits,
    )
    .await
    .unwrap();
    Session::open(store, tenant, user.id).await.unwrap()
}

pub async fn student_session(store: &MemoryStore, mentor: &Session) -> Session {
    let tenant = default_tenant(store).await;
    let user = register_user(
        store,
        &tenant,
        &NewAccount {
            display_name: "Bia".to_string(),
            email: "bia@example.com".to_string(),
            phone: Some("+55 11 99999-0000".to_string()),
            role: UserRole::Student,
            mentor_id: Some(mentor.user.id),
        },
        10,
    )
    .await
    .unwrap();
    Session::open(store, tenant, user.id).await.unwrap()
}
