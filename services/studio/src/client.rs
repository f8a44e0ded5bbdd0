//! HTTP client for the studio API.

use crate::feed::FeedSource;
use crate::media::is_audio_upload;
use crate::types::{ErrorResponse, FeedPage, UploadResponse};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Multipart field carrying the audio file
pub const AUDIO_FIELD: &str = "audio";

/// Default timeout for API requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors returned by [`StudioClient`]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("File is not an accepted audio upload: {0}")]
    NotAudio(String),
}

/// Client for `POST /api/upload` and `GET /api/videos`
#[derive(Debug, Clone)]
pub struct StudioClient {
    client: Client,
    base_url: String,
}

impl StudioClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client sharing an existing connection pool
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload an audio file. Files outside the allow-list are refused before
    /// any request is made.
    #[instrument(skip(self, bytes), fields(size_bytes = bytes.len()))]
    pub async fn upload_audio(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        if !is_audio_upload(file_name, content_type) {
            return Err(ClientError::NotAudio(file_name.to_string()));
        }

        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(ct) = content_type {
            part = part.mime_str(ct)?;
        }
        let form = Form::new().part(AUDIO_FIELD, part);

        let response = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response).await?;
        let uploaded: UploadResponse = response.json().await?;

        debug!(url = %uploaded.url, "Audio uploaded");
        Ok(uploaded)
    }

    /// Fetch one feed page for the given hashtags
    #[instrument(skip(self))]
    pub async fn fetch_videos(&self, hashtags: &[String], page: u32) -> Result<FeedPage, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/videos", self.base_url))
            .query(&[("page", page.to_string()), ("hashtags", hashtags.join(","))])
            .send()
            .await?;

        let response = check_status(response).await?;
        let feed_page: FeedPage = response.json().await?;

        debug!(
            page = page,
            records = feed_page.videos.len(),
            next_cursor = ?feed_page.next_cursor,
            "Feed page received"
        );
        Ok(feed_page)
    }
}

#[async_trait]
impl FeedSource for StudioClient {
    async fn fetch_page(&self, hashtags: &[String], page: u32) -> Result<FeedPage, ClientError> {
        self.fetch_videos(hashtags, page).await
    }
}

/// Turn non-success responses into errors, keeping the server's message when it sent one
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    warn!(status = status.as_u16(), message = %message, "Studio API request failed");

    if status == StatusCode::BAD_REQUEST {
        Err(ClientError::Rejected(message))
    } else {
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
