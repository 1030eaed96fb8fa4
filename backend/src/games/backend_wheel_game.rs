use axum::{
    debug_handler,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use prize_wheel::coupon::RevealedReward;
use prize_wheel::{SpinOutcome, SpinPhase, WheelGeometry, WheelSession};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/campaign", get(get_campaign))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/spin", post(spin_wheel))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SegmentResponse {
    pub label: String,
    pub offset_degrees: f64,
}

/// Public wheel face. Reward codes stay server-side until a reveal.
#[derive(Debug, Serialize, Deserialize)]
pub struct CampaignResponse {
    pub name: String,
    pub timezone: String,
    pub segments: Vec<SegmentResponse>,
    pub full_rotations: u32,
    pub reveal_delay_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub phase: SpinPhase,
    pub ready: bool,
    pub rotation_angle: f64,
    pub reveal_delay_ms: u64,
    /// Present only once the phase is `revealed`.
    pub reward: Option<RevealedReward>,
}

fn session_response(state: &AppState, id: Uuid, wheel: &WheelSession) -> SessionResponse {
    let campaign = &state.campaign;
    wheel.with(|session| SessionResponse {
        session_id: id,
        phase: session.phase(),
        ready: session.is_ready(),
        rotation_angle: session.rotation_angle(),
        reveal_delay_ms: campaign.spin_settings().reveal_delay_ms,
        reward: campaign.actions().reveal(session, campaign.catalog()),
    })
}

#[debug_handler]
async fn get_campaign(State(state): State<AppState>) -> Json<CampaignResponse> {
    let campaign = &state.campaign;
    let catalog = campaign.catalog();
    let segments = catalog
        .iter()
        .zip(WheelGeometry::segment_offsets(catalog))
        .map(|(reward, offset)| SegmentResponse {
            label: reward.label.clone(),
            offset_degrees: offset,
        })
        .collect();

    Json(CampaignResponse {
        name: campaign.name().to_string(),
        timezone: campaign.clock().label().to_string(),
        segments,
        full_rotations: campaign.spin_settings().full_rotations,
        reveal_delay_ms: campaign.spin_settings().reveal_delay_ms,
    })
}

#[debug_handler]
async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let wheel = state.campaign.new_session();
    let id = state.sessions.insert(wheel.clone());
    debug!("Created wheel session {}", id);
    Json(session_response(&state, id, &wheel))
}

#[debug_handler]
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let entry = state.sessions.get(id)?;
    Ok(Json(session_response(&state, id, &entry.wheel)))
}

#[debug_handler]
async fn spin_wheel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let entry = state.sessions.get(id)?;
    let today = state.campaign.clock().date_at(Utc::now());

    let outcome = entry
        .wheel
        .spin(&state.campaign.engine(), today, &mut OsRng, &state.scheduler);

    match outcome {
        SpinOutcome::Started { rotation_angle } => {
            info!("🎡 WHEEL SPIN: session {} on {} lands at {}°", id, today, rotation_angle);
        }
        SpinOutcome::AlreadySpun => debug!("Session {} already spun", id),
        SpinOutcome::NotReady => return Err(Error::NotReady),
    }

    Ok(Json(session_response(&state, id, &entry.wheel)))
}
