//! Trending video sources.
//!
//! A [`TrendSource`] turns a hashtag query and a zero-based page into at most
//! [`PAGE_SIZE`] [`VideoRecord`]s. Sources never fail outward: an upstream
//! error is logged, counted, and served as an empty page so the feed degrades
//! instead of breaking.
//!
//! Engagement numbers are synthetic. Neither source has access to real usage
//! data, so every record's score comes from [`SyntheticEngagement`].

use crate::config::{TrendProvider, TrendsConfig};
use async_trait::async_trait;
use chrono::Utc;
use clip_studio::{Platform, VideoRecord, PAGE_SIZE};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Upper bound (exclusive) of synthetic engagement scores
pub const ENGAGEMENT_CEILING: u32 = 100_000;

const DEMO_VIDEO_URL: &str = "https://example.com/video.mp4";
const DEMO_THUMBNAIL_URL: &str = "https://images.unsplash.com/photo-1516035069371-29a1b244cc32";
const SIMULATED_PLATFORMS: [Platform; 3] = [Platform::TikTok, Platform::Instagram, Platform::YouTube];

/// Errors from an upstream search. Only ever logged.
#[derive(Error, Debug)]
pub enum TrendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Malformed upstream payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Upstream video {0} has no playable files")]
    MissingVideoFile(u64),
}

impl TrendError {
    /// Short label for the failure metric
    pub fn reason(&self) -> &'static str {
        match self {
            TrendError::Http(_) => "network",
            TrendError::Status(_) => "status",
            TrendError::Malformed(_) | TrendError::MissingVideoFile(_) => "malformed",
        }
    }
}

/// Source of trending videos for a hashtag query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Records for zero-based `page`. Empty on any upstream failure.
    async fn trending(&self, tags: &[String], page: u32) -> Vec<VideoRecord>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Simulated engagement score generator
pub struct SyntheticEngagement {
    rng: Mutex<StdRng>,
}

impl SyntheticEngagement {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic scores for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// A score in `[0, ENGAGEMENT_CEILING)`
    pub fn score(&self) -> u32 {
        self.rng.lock().random_range(0..ENGAGEMENT_CEILING)
    }

    /// Pick one of `items` uniformly
    fn pick<T: Copy>(&self, items: &[T]) -> T {
        let index = self.rng.lock().random_range(0..items.len());
        items[index]
    }
}

impl Default for SyntheticEngagement {
    fn default() -> Self {
        Self::new()
    }
}

/// Pexels search response, reduced to the fields we map
#[derive(Debug, Deserialize)]
struct PexelsSearchResponse {
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    image: String,
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    link: String,
}

/// Pexels video search
pub struct PexelsSource {
    client: Client,
    base_url: String,
    api_key: String,
    engagement: SyntheticEngagement,
}

impl PexelsSource {
    pub fn new(config: &TrendsConfig, api_key: impl Into<String>) -> Result<Self, TrendError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            api_key,
            SyntheticEngagement::new(),
        ))
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        engagement: SyntheticEngagement,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            engagement,
        }
    }

    /// One search request, failures propagated
    #[instrument(skip(self))]
    pub async fn search(&self, tags: &[String], page: u32) -> Result<Vec<VideoRecord>, TrendError> {
        // Pexels pages are 1-based
        let Some(upstream_page) = page.checked_add(1) else {
            debug!(page = page, "Page beyond upstream range, serving empty page");
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(format!("{}/videos/search", self.base_url))
            .header(AUTHORIZATION, &self.api_key)
            .query(&[
                ("query", tags.join(" ")),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", upstream_page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrendError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let parsed: PexelsSearchResponse = serde_json::from_slice(&body)?;

        let records = parsed
            .videos
            .into_iter()
            .map(|video| self.to_record(video))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(page = page, records = records.len(), "Pexels search complete");
        Ok(records)
    }

    fn to_record(&self, video: PexelsVideo) -> Result<VideoRecord, TrendError> {
        let file = video
            .video_files
            .into_iter()
            .next()
            .ok_or(TrendError::MissingVideoFile(video.id))?;

        Ok(VideoRecord {
            id: video.id.to_string(),
            url: file.link,
            thumbnail: video.image,
            platform: Platform::Pexels,
            engagement: self.engagement.score(),
        })
    }
}

#[async_trait]
impl TrendSource for PexelsSource {
    async fn trending(&self, tags: &[String], page: u32) -> Vec<VideoRecord> {
        match self.search(tags, page).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, page = page, "Trend search failed, serving empty page");
                metrics::counter!("clip_upstream_failures_total", "reason" => e.reason())
                    .increment(1);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "pexels"
    }
}

/// Demo source producing full pages of placeholder videos
pub struct SimulatedSource {
    engagement: SyntheticEngagement,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self::with_engagement(SyntheticEngagement::new())
    }

    pub fn with_engagement(engagement: SyntheticEngagement) -> Self {
        Self { engagement }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrendSource for SimulatedSource {
    async fn trending(&self, _tags: &[String], _page: u32) -> Vec<VideoRecord> {
        let now_ms = Utc::now().timestamp_millis();
        (0..PAGE_SIZE)
            .map(|i| VideoRecord {
                id: format!("{}-{}", now_ms, i),
                url: DEMO_VIDEO_URL.to_string(),
                thumbnail: DEMO_THUMBNAIL_URL.to_string(),
                platform: self.engagement.pick(&SIMULATED_PLATFORMS),
                engagement: self.engagement.score(),
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Build the source selected by configuration
pub fn build_source(config: &TrendsConfig) -> Result<Arc<dyn TrendSource>, TrendError> {
    let source: Arc<dyn TrendSource> = match config.provider {
        TrendProvider::Pexels => {
            let api_key = config.api_key.clone().unwrap_or_default();
            Arc::new(PexelsSource::new(config, api_key)?)
        }
        TrendProvider::Simulated => Arc::new(SimulatedSource::new()),
    };

    info!(provider = source.name(), "Trend source initialized");
    Ok(source)
}
