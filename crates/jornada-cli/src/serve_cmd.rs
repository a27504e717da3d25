//! `jornada serve`: the JSON API consumed by the browser client.
//!
//! Every request resolves its tenant from the `Host` header. Authenticated
//! routes read `Authorization: Bearer <session token>`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use jornada_core::credits::{CreditPackage, PaymentGateway, purchase_credits};
use jornada_core::generate::GenerationProvider;
use jornada_core::plan::{self, PlanAggregate, PlanStats};
use jornada_core::session::Session;
use jornada_core::tenant::resolve_tenant;
use jornada_core::token::{self, TokenConfig};
use jornada_core::users::{self, NewAccount};
use jornada_core::wizard::{self, Payload, WizardAction, WizardState};
use jornada_core::{ServiceError, ValidationError};
use jornada_db::models::{BrandingSettings, TenantConfig, User};
use jornada_db::store::RecordStore;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub provider: Arc<dyn GenerationProvider>,
    pub payments: Arc<dyn PaymentGateway>,
    pub tokens: Arc<TokenConfig>,
    pub signup_credits: i32,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InsufficientCredit { .. } | ServiceError::Payment(_) => {
                StatusCode::PAYMENT_REQUIRED
            }
            ServiceError::Generation(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::TenantUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::debug!(error = %err, "request rejected");
        }
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        ServiceError::from(err).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub plan: PlanAggregate,
    pub stats: PlanStats,
}

impl From<PlanAggregate> for PlanResponse {
    fn from(plan: PlanAggregate) -> Self {
        let stats = plan.stats();
        Self { plan, stats }
    }
}

#[derive(Debug, Serialize)]
pub struct GeneratedResponse {
    pub plan: PlanResponse,
    /// Remaining balance after the deduction.
    pub credits: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct RegisteredResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub branding: BrandingSettings,
}

#[derive(Debug, Deserialize)]
pub struct WizardRequest {
    #[serde(default)]
    pub state: Option<WizardState>,
    #[serde(flatten)]
    pub action: WizardAction,
}

#[derive(Debug, Serialize)]
pub struct WizardResponse {
    pub state: WizardState,
    pub can_submit: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    /// Defaults to the caller's display name.
    #[serde(default)]
    pub author_name: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct NotificationsRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub package: CreditPackage,
}

#[derive(Debug, Deserialize)]
pub struct BlockedRequest {
    pub blocked: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/tenant", get(get_tenant))
        .route("/api/users", post(register))
        .route("/api/me", get(me))
        .route("/api/me/branding", put(put_branding))
        .route("/api/me/notifications", put(put_notifications))
        .route("/api/wizard", post(wizard_step))
        .route("/api/plans", post(generate))
        .route("/api/plan", get(get_plan))
        .route("/api/plan/challenges/{day}", put(put_challenge))
        .route("/api/plan/challenges/{day}/comments", post(post_comment))
        .route("/api/credits/purchase", post(purchase))
        .route("/api/admin/users/{id}/blocked", put(put_blocked))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("jornada serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("jornada serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

fn host(headers: &HeaderMap) -> &str {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn tenant(state: &AppState, headers: &HeaderMap) -> Result<TenantConfig, AppError> {
    Ok(resolve_tenant(state.store.as_ref(), host(headers)).await?)
}

async fn session(state: &AppState, headers: &HeaderMap) -> Result<Session, AppError> {
    let tenant = tenant(state, headers).await?;
    let token = bearer(headers).ok_or_else(|| AppError::unauthorized("missing bearer token"))?;
    let user_id = token::validate_token(&state.tokens, token)
        .map_err(|e| AppError::unauthorized(e.to_string()))?;
    Ok(Session::open(state.store.as_ref(), tenant, user_id).await?)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_landing(tenant: &TenantConfig) -> String {
    let branding = &tenant.branding.0;
    let landing = &tenant.landing.0;

    let highlights: String = landing
        .highlights
        .iter()
        .map(|h| format!("<li>{}</li>", escape_html(h)))
        .collect();
    let logo = branding
        .logo_url
        .as_deref()
        .map(|url| format!("<img src=\"{}\" alt=\"logo\">", escape_html(url)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\
<html><head><title>{program}</title>\
<style>body{{background:{secondary};color:#fff;font-family:sans-serif}}\
h1{{color:{primary}}}a.cta{{background:{accent};color:{secondary};padding:.5em 1em}}</style>\
</head><body>{logo}\
<h1>{headline}</h1><p>{subheadline}</p><ul>{highlights}</ul>\
<a class=\"cta\" href=\"/api/tenant\">{cta}</a>\
<footer>{program} by {expert}</footer>\
</body></html>",
        program = escape_html(&branding.program_name),
        expert = escape_html(&branding.expert_name),
        primary = escape_html(&branding.primary_color),
        secondary = escape_html(&branding.secondary_color),
        accent = escape_html(&branding.accent_color),
        headline = escape_html(&landing.headline),
        subheadline = escape_html(&landing.subheadline),
        cta = escape_html(&landing.call_to_action),
    )
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let tenant = tenant(&state, &headers).await?;
    Ok(Html(render_landing(&tenant)).into_response())
}

async fn get_tenant(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TenantConfig>, AppError> {
    Ok(Json(tenant(&state, &headers).await?))
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(account): Json<NewAccount>,
) -> Result<Response, AppError> {
    let tenant = tenant(&state, &headers).await?;
    let user =
        users::register_user(state.store.as_ref(), &tenant, &account, state.signup_credits)
            .await?;
    let token = token::generate_token(&state.tokens, user.id)
        .map_err(|e| AppError::internal(e.into()))?;
    Ok((StatusCode::CREATED, Json(RegisteredResponse { user, token })).into_response())
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AppError> {
    let session = session(&state, &headers).await?;
    let branding = session.branding().clone();
    Ok(Json(MeResponse {
        user: session.user,
        branding,
    }))
}

async fn put_branding(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(branding): Json<BrandingSettings>,
) -> Result<Json<User>, AppError> {
    let session = session(&state, &headers).await?;
    Ok(Json(
        users::update_branding(state.store.as_ref(), &session, &branding).await?,
    ))
}

async fn put_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NotificationsRequest>,
) -> Result<Json<User>, AppError> {
    let session = session(&state, &headers).await?;
    Ok(Json(
        users::set_notifications(state.store.as_ref(), &session, body.enabled).await?,
    ))
}

async fn wizard_step(Json(body): Json<WizardRequest>) -> Result<Json<WizardResponse>, AppError> {
    let current = body.state.unwrap_or_default();
    let state = wizard::transition(&current, body.action)?;
    let can_submit = state.can_submit();
    Ok(Json(WizardResponse { state, can_submit }))
}

async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Payload>,
) -> Result<Response, AppError> {
    let session = session(&state, &headers).await?;
    let generated = plan::generate_plan(
        state.store.as_ref(),
        state.provider.as_ref(),
        &session,
        &payload,
    )
    .await?;
    let body = GeneratedResponse {
        plan: generated.plan.into(),
        credits: generated.user.map(|u| u.credits),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PlanResponse>, AppError> {
    let session = session(&state, &headers).await?;
    plan::current_plan(state.store.as_ref(), &session)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(|| AppError::not_found("no plan yet"))
}

async fn put_challenge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(day): Path<i32>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    let session = session(&state, &headers).await?;
    plan::toggle_challenge(state.store.as_ref(), &session, day, body.completed)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(|| AppError::not_found(format!("no challenge for day {day}")))
}

async fn post_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(day): Path<i32>,
    Json(body): Json<CommentRequest>,
) -> Result<Response, AppError> {
    let session = session(&state, &headers).await?;
    let author = body
        .author_name
        .unwrap_or_else(|| session.user.display_name.clone());
    let updated = plan::add_comment(state.store.as_ref(), &session, day, &author, &body.text)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no challenge for day {day}")))?;
    Ok((StatusCode::CREATED, Json(PlanResponse::from(updated))).into_response())
}

async fn purchase(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PurchaseRequest>,
) -> Result<Response, AppError> {
    let session = session(&state, &headers).await?;
    let purchase = purchase_credits(
        state.store.as_ref(),
        state.payments.as_ref(),
        &session,
        body.package,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(purchase)).into_response())
}

async fn put_blocked(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<BlockedRequest>,
) -> Result<Json<User>, AppError> {
    let session = session(&state, &headers).await?;
    Ok(Json(
        users::set_blocked(state.store.as_ref(), &session, id, body.blocked).await?,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
