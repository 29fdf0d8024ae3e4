//! Application state
//!
//! Holds the shared components and configuration

use crate::frame_hub::FrameHub;
use crate::frame_store::FrameStore;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// SSE keep-alive comment interval; disabled when unset
    pub sse_keep_alive_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            sse_keep_alive_secs: std::env::var("SSE_KEEP_ALIVE_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Last-known FrameEvent per camera
    pub store: Arc<FrameStore>,
    /// Subscriber fan-out hub
    pub hub: Arc<FrameHub>,
}

impl AppState {
    /// Construct the state with a fresh store/hub pair
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(FrameStore::new());
        let hub = Arc::new(FrameHub::new(store.clone()));
        Self { config, store, hub }
    }
}
