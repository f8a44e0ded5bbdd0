//! Clip Server
//!
//! HTTP backend for the clip studio. It stores uploaded audio clips on local
//! disk and serves a paginated feed of trending stock videos for a hashtag
//! query.
//!
//! ## Features
//!
//! - **Audio Upload**: single-file multipart upload, filtered to audio types
//!   and stored under timestamp-derived names
//! - **Trending Feed**: hashtag search against Pexels (or a simulated demo
//!   source), 20 records per page with a next-page cursor
//! - **Graceful Degradation**: upstream failures turn into empty pages, never
//!   into errors for the feed client
//!
//! ## Architecture
//!
//! ```text
//!  Browser / clip-studio           clip-server                    Upstream
//! ┌──────────────────┐      ┌─────────────────────┐         ┌──────────────┐
//! │ POST /api/upload │─────▶│ Upload Store        │──▶ disk │              │
//! │ GET  /uploads/*  │◀─────│   (uploads/)        │         │              │
//! │                  │      └─────────────────────┘         │ Pexels video │
//! │ GET  /api/videos │─────▶┌─────────────────────┐────────▶│ search       │
//! │                  │◀─────│ Trend Source        │◀────────│              │
//! └──────────────────┘      └─────────────────────┘         └──────────────┘
//! ```

pub mod api;
pub mod config;
pub mod trends;
pub mod upload_store;

pub use api::{create_router, start_api_server, AppState};
pub use config::{Config, ConfigError, TrendProvider};
pub use trends::{
    build_source, PexelsSource, SimulatedSource, SyntheticEngagement, TrendError, TrendSource,
};
pub use upload_store::{StoredUpload, UploadError, UploadStore};
