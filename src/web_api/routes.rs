//! API Routes

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::frame_hub::Subscription;
use crate::ingestion;
use crate::models::{FrameEvent, IngestSummary};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(super::health_check))
        .route("/ingest", post(ingest))
        .route("/state/:camera_id", get(camera_state))
        .route("/sse/cameras/:camera_id", get(stream_camera))
        .with_state(state)
}

// ========================================
// Ingestion Handler
// ========================================

/// Accept a batch of pre-scored detections
async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestSummary>> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidPayload(format!("invalid JSON body: {e}")))?;

    let summary = ingestion::process_batch(&state.hub, payload)?;

    tracing::info!(
        cameras = summary.cameras,
        events_emitted = summary.events_emitted,
        "Ingested detection batch"
    );

    Ok(Json(summary))
}

// ========================================
// State Query Handler
// ========================================

/// Last-known FrameEvent for a camera, or a placeholder if none exists
async fn camera_state(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Response {
    match state.store.get(&camera_id) {
        Some(event) => Json(event.as_ref()).into_response(),
        None => Json(json!({
            "camera_id": camera_id,
            "message": "no data yet"
        }))
        .into_response(),
    }
}

// ========================================
// Streaming Handler
// ========================================

/// Replay-then-live event sequence for one subscriber.
///
/// Owns the `Subscription` guard: when axum drops the response body the
/// stream drops, the guard drops, and the hub entry is released. That is
/// the only cleanup path and it covers normal close, client disconnect
/// and server shutdown alike.
struct CameraEventStream {
    replay: Option<Arc<FrameEvent>>,
    subscription: Subscription,
}

impl Stream for CameraEventStream {
    type Item = Arc<FrameEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(event) = this.replay.take() {
            return Poll::Ready(Some(event));
        }
        this.subscription.poll_recv(cx)
    }
}

/// Subscribe to a camera's FrameEvent stream over SSE
async fn stream_camera(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let (subscription, replay) = state.hub.clone().subscribe(&camera_id);

    tracing::info!(
        camera_id = %subscription.camera_id(),
        replaying = replay.is_some(),
        "SSE stream opened"
    );

    let stream = CameraEventStream {
        replay,
        subscription,
    }
    .map(|event| Event::default().json_data(event.as_ref()));

    let sse = Sse::new(stream);
    match state.config.sse_keep_alive_secs {
        Some(secs) => {
            sse.keep_alive(KeepAlive::new().interval(Duration::from_secs(secs)))
        }
        None => sse,
    }
}
