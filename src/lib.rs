//! Shelfcast - Realtime Shelf-Camera Backend
//!
//! Ingests pre-scored visual detection batches, tracks the latest known
//! condition of each monitored camera and streams live updates to any
//! number of SSE subscribers.
//!
//! ## Architecture (6 Components)
//!
//! 1. Enrichment - raw detection normalization (pure)
//! 2. Aggregator - per-product summary statistics (pure)
//! 3. FrameStore - last-known FrameEvent per camera
//! 4. FrameHub - subscriber registry and fan-out
//! 5. Ingestion - batch validation, grouping, composition
//! 6. WebAPI - HTTP surface (/ingest, /state, /sse, /health)
//!
//! ## Design Principles
//!
//! - Store and hub are explicitly constructed and passed into handlers,
//!   never ambient globals, so tests build them in isolation
//! - Subscriber registration is a scoped guard released on every exit path

pub mod aggregator;
pub mod enrichment;
pub mod error;
pub mod frame_hub;
pub mod frame_store;
pub mod ingestion;
pub mod models;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::{AppConfig, AppState};
