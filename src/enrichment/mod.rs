//! Enrichment - Raw Detection Normalization
//!
//! ## Responsibilities
//!
//! - Derive the synthetic detection id and shelf status
//! - Attach presentation metadata (status color)
//! - Normalize the named-corner ROI quad into an ordered 4-tuple
//!
//! Pure transform, no shared state. Scores are not clamped here; the
//! vision pipeline is expected to emit 0..=100 already.

use crate::models::{EnrichedDetection, RawDetection, ShelfStatus, UiHints};

/// Enrich one raw detection for the given camera group.
///
/// `camera_id` is the coerced grouping key, not the raw field, so the
/// resulting detection always matches the FrameEvent that carries it.
pub fn enrich(camera_id: &str, raw: &RawDetection) -> EnrichedDetection {
    let score = raw.pontuacao_total;
    let status = ShelfStatus::from_score(score);

    let quad = match &raw.roi_quad_px {
        Some(q) => [q.top_left, q.top_right, q.bottom_right, q.bottom_left],
        None => [None; 4],
    };

    EnrichedDetection {
        id: format!("{}|{}", camera_id, raw.roi_id),
        camera_id: camera_id.to_string(),
        image_name: raw.image_name.clone(),
        roi_id: raw.roi_id.clone(),
        product_id: raw.product_id.clone(),
        product_name: raw.product_name.clone(),
        fruit_type: raw.fruit_type.clone(),
        quantidade_pct: raw.quantidade_pct,
        qualidade_pct: raw.qualidade_pct,
        organizacao_pct: raw.organizacao_pct,
        contexto_pct: raw.contexto_pct,
        indice_var: raw.indice_var,
        score,
        status,
        confidence: raw.confidence,
        insights: raw.insights.clone(),
        quad,
        ui: UiHints {
            color: status.color(),
        },
    }
}
