use crate::config::Config;
use crate::trends::TrendSource;
use crate::upload_store::{UploadStore, UPLOAD_ROUTE};
use anyhow::{Context, Result};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clip_studio::{is_audio_upload, ErrorResponse, FeedPage, UploadResponse, AUDIO_FIELD};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub uploads: Arc<UploadStore>,
    pub trends: Arc<dyn TrendSource>,
}

/// Query parameters for the video feed
#[derive(Debug, Deserialize)]
pub struct VideoFeedQuery {
    /// Zero-based page cursor
    #[serde(default)]
    pub page: u32,
    /// Comma-separated hashtags
    pub hashtags: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: Some(code.to_string()),
        }),
    )
}

/// Keep the framework's status, so an over-limit body stays a 413
fn multipart_error(e: MultipartError) -> ApiError {
    api_error(e.status(), e.body_text(), "MULTIPART_ERROR")
}

/// Create the API router
pub fn create_router(state: AppState, config: &Config) -> Router {
    let cors = if config.api.cors_enabled {
        if config.api.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .api
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    let uploads_dir = ServeDir::new(state.uploads.root());

    Router::new()
        .route("/health", get(health_check))
        .route("/api/upload", post(upload_audio))
        .route("/api/videos", get(list_videos))
        .nest_service(UPLOAD_ROUTE, uploads_dir)
        .layer(DefaultBodyLimit::max(config.upload.max_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "clip-server"
    }))
}

/// Accept one audio file from the `audio` multipart field
#[instrument(skip(state, multipart))]
async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, status = %e.status(), "Failed to read multipart body");
        multipart_error(e)
    })? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);

        if !is_audio_upload(&file_name, content_type.as_deref()) {
            debug!(
                file = %file_name,
                content_type = ?content_type,
                "Ignoring non-audio upload"
            );
            metrics::counter!("clip_upload_rejections_total").increment(1);
            continue;
        }

        let bytes = field.bytes().await.map_err(|e| {
            warn!(error = %e, status = %e.status(), "Failed to read upload body");
            multipart_error(e)
        })?;

        let stored = state.uploads.store(&file_name, &bytes).await.map_err(|e| {
            error!(error = %e, "Failed to store upload");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store upload",
                "STORAGE_ERROR",
            )
        })?;

        metrics::counter!("clip_uploads_total").increment(1);

        return Ok(Json(UploadResponse {
            url: stored.url,
            duration: 0,
        }));
    }

    Err(api_error(
        StatusCode::BAD_REQUEST,
        "No audio file provided",
        "NO_FILE",
    ))
}

/// One page of trending videos for the given hashtags
#[instrument(skip(state))]
async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<VideoFeedQuery>,
) -> Json<FeedPage> {
    let tags = parse_hashtags(params.hashtags.as_deref());
    if tags.is_empty() {
        debug!("No hashtags given, serving empty page");
        return Json(FeedPage::empty());
    }

    let videos = state.trends.trending(&tags, params.page).await;
    let page = FeedPage::for_page(params.page, videos);

    metrics::counter!("clip_feed_pages_total").increment(1);
    debug!(
        page = params.page,
        records = page.videos.len(),
        next_cursor = ?page.next_cursor,
        "Serving feed page"
    );

    Json(page)
}

/// Split the comma-separated `hashtags` parameter, dropping blanks
pub fn parse_hashtags(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Start the API server
pub async fn start_api_server(state: AppState, config: &Config) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.api.host, config.api.port);

    info!(address = %addr, "Starting clip API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .await
        .context("API server error")?;

    Ok(())
}
