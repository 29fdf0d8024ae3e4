//! Ingestion - Detection Batch Processing
//!
//! ## Responsibilities
//!
//! - Validate the inbound batch payload
//! - Group detections by camera, dropping empty camera ids
//! - Enrich, aggregate and compose one FrameEvent per camera group
//! - Publish through the hub, which commits state and fans out atomically

use crate::aggregator::summarize;
use crate::enrichment::enrich;
use crate::error::{Error, Result};
use crate::frame_hub::FrameHub;
use crate::models::{FrameEvent, IngestSummary, RawDetection};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Process one ingestion batch.
///
/// Exactly one FrameEvent is stored and one broadcast issued per camera
/// group; the hub commits the store write and the fan-out as one step.
/// A detection element that cannot be decoded even leniently is skipped
/// so one malformed record cannot discard the rest of the batch.
pub fn process_batch(hub: &FrameHub, payload: Value) -> Result<IngestSummary> {
    let detections = payload
        .get("detections")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::InvalidPayload("expected an object with a detections array".to_string())
        })?;

    // Group by coerced camera id, preserving first-seen camera order
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<RawDetection>> =
        std::collections::HashMap::new();

    for element in detections {
        let raw: RawDetection = match serde_json::from_value(element.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable detection element");
                continue;
            }
        };
        if raw.camera_id.is_empty() {
            // Documented edge case: dropped, not an error
            tracing::debug!(roi_id = %raw.roi_id, "Dropping detection without camera id");
            continue;
        }
        let camera_id = raw.camera_id.clone();
        groups
            .entry(camera_id.clone())
            .or_insert_with(|| {
                order.push(camera_id);
                Vec::new()
            })
            .push(raw);
    }

    if groups.is_empty() {
        return Ok(IngestSummary {
            status: "ok",
            cameras: 0,
            events_emitted: 0,
        });
    }

    let observed_at = Utc::now();
    let cameras = groups.len();
    let mut events_emitted = 0usize;

    for camera_id in order {
        let Some(batch) = groups.remove(&camera_id) else {
            continue;
        };

        let enriched: Vec<_> = batch.iter().map(|raw| enrich(&camera_id, raw)).collect();
        let summary = summarize(&enriched);

        tracing::debug!(
            camera_id = %camera_id,
            detections = enriched.len(),
            products = summary.len(),
            "Composed frame event"
        );

        let event = Arc::new(FrameEvent::new(
            camera_id.clone(),
            observed_at,
            enriched,
            summary,
        ));
        hub.publish(&camera_id, event);
        events_emitted += 1;
    }

    Ok(IngestSummary {
        status: "ok",
        cameras,
        events_emitted,
    })
}
