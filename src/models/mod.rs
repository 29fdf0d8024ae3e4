//! Shared data models
//!
//! Wire types for the ingestion payload and the broadcast FrameEvent.
//! Upstream producers enforce no schema, so `RawDetection` deserializes
//! leniently: absent/null/mistyped numerics become 0, strings become "".

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shelf fill status derived from a detection score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShelfStatus {
    Empty,
    Low,
    Ok,
    Full,
}

impl ShelfStatus {
    /// Classify a score. Total over all of `i64`; out-of-range values
    /// (upstream is expected to clamp to 0..=100) still classify.
    pub fn from_score(score: i64) -> Self {
        if score <= 0 {
            ShelfStatus::Empty
        } else if score <= 20 {
            ShelfStatus::Low
        } else if score >= 60 {
            ShelfStatus::Full
        } else {
            ShelfStatus::Ok
        }
    }

    /// Presentation color for the status
    pub fn color(&self) -> &'static str {
        match self {
            ShelfStatus::Empty => "#E53935",
            ShelfStatus::Low => "#FB8C00",
            ShelfStatus::Ok => "#FDD835",
            ShelfStatus::Full => "#43A047",
        }
    }
}

/// Named-corner ROI quadrilateral as supplied by the producer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoiQuad {
    #[serde(default)]
    pub top_left: Option<[f64; 2]>,
    #[serde(default)]
    pub top_right: Option<[f64; 2]>,
    #[serde(default)]
    pub bottom_right: Option<[f64; 2]>,
    #[serde(default)]
    pub bottom_left: Option<[f64; 2]>,
}

/// Pre-scored detection as posted by the vision pipeline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDetection {
    #[serde(default, deserialize_with = "lenient_string")]
    pub camera_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub roi_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fruit_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantidade_pct: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub qualidade_pct: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub organizacao_pct: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub contexto_pct: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub indice_var: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub pontuacao_total: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: f64,
    #[serde(default)]
    pub insights: Option<Value>,
    #[serde(default)]
    pub roi_quad_px: Option<RoiQuad>,
}

/// Presentation hints attached to every enriched detection
#[derive(Debug, Clone, Serialize)]
pub struct UiHints {
    pub color: &'static str,
}

/// Detection after enrichment; immutable once composed into a FrameEvent
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedDetection {
    /// Synthetic identifier `{camera_id}|{roi_id}`
    pub id: String,
    pub camera_id: String,
    pub image_name: String,
    pub roi_id: String,
    pub product_id: String,
    pub product_name: String,
    pub fruit_type: String,
    pub quantidade_pct: f64,
    pub qualidade_pct: f64,
    pub organizacao_pct: f64,
    pub contexto_pct: f64,
    pub indice_var: f64,
    pub score: i64,
    pub status: ShelfStatus,
    pub confidence: f64,
    pub insights: Option<Value>,
    /// Ordered corners: top_left, top_right, bottom_right, bottom_left
    pub quad: [Option<[f64; 2]>; 4],
    pub ui: UiHints,
}

/// Per-product aggregate over one camera's batch
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub product_name: String,
    pub count: usize,
    pub avg_score: f64,
    pub min_score: i64,
    pub max_score: i64,
    pub avg_quantidade_pct: f64,
    pub avg_qualidade_pct: f64,
    pub avg_organizacao_pct: f64,
    pub avg_contexto_pct: f64,
    pub empties: usize,
    pub lows: usize,
    pub oks: usize,
    pub fulls: usize,
}

/// The atomic unit of stored state and broadcast
#[derive(Debug, Clone, Serialize)]
pub struct FrameEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub version: &'static str,
    pub camera_id: String,
    pub observed_at: DateTime<Utc>,
    /// Image metadata placeholder (reserved on the wire)
    pub image: Value,
    pub detections: Vec<EnrichedDetection>,
    pub summary: Vec<ProductSummary>,
}

impl FrameEvent {
    /// Compose a frame event for one camera's ingestion batch
    pub fn new(
        camera_id: String,
        observed_at: DateTime<Utc>,
        detections: Vec<EnrichedDetection>,
        summary: Vec<ProductSummary>,
    ) -> Self {
        Self {
            event_type: "frame",
            version: "1.0",
            camera_id,
            observed_at,
            image: Value::Object(serde_json::Map::new()),
            detections,
            summary,
        }
    }
}

/// Response body for a successful ingest call
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub status: &'static str,
    pub cameras: usize,
    pub events_emitted: usize,
}

// ========================================
// Lenient field decoding
// ========================================

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .or_else(|_| s.trim().parse::<f64>().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    })
}
