use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use moveline_agent::runtime::{AgentRuntime, InboundEvent, OutputAction};

#[derive(Clone)]
pub struct VoiceState {
    runtime: Arc<AgentRuntime>,
}

/// Telephony gateway boundary: the gateway posts one JSON event per caller
/// interaction and renders the returned action (speak and gather, transfer,
/// or hang up).
pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/voice/events", post(handle_event))
        .with_state(VoiceState { runtime })
}

pub async fn handle_event(
    State(state): State<VoiceState>,
    Json(event): Json<InboundEvent>,
) -> Json<OutputAction> {
    let call_id = match &event {
        InboundEvent::CallStart { call_id, .. }
        | InboundEvent::Turn { call_id, .. }
        | InboundEvent::CallEnd { call_id } => call_id.clone(),
    };
    info!(
        event_name = "ingress.voice.event_received",
        correlation_id = %call_id,
        call_id = %call_id,
        booking_id = "unknown",
        kind = event_kind(&event),
        "voice event received"
    );

    Json(state.runtime.handle_event(event).await)
}

fn event_kind(event: &InboundEvent) -> &'static str {
    match event {
        InboundEvent::CallStart { .. } => "call-start",
        InboundEvent::Turn { .. } => "turn",
        InboundEvent::CallEnd { .. } => "call-end",
    }
}
