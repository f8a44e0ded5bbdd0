//! Wire types shared by the studio client and the API server.
//!
//! These mirror the JSON payloads exchanged over `/api/upload` and
//! `/api/videos`, so field names follow the camelCase the browser UI expects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of records in a full feed page. A shorter page is the last one.
pub const PAGE_SIZE: usize = 20;

/// Platform label attached to a video record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    TikTok,
    Instagram,
    YouTube,
    Pexels,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::YouTube => "YouTube",
            Platform::Pexels => "Pexels",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single video in the trending feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Upstream identifier, unique within one feed session
    pub id: String,
    /// Playable/downloadable video URL
    pub url: String,
    /// Preview image URL
    pub thumbnail: String,
    /// Where the video came from
    pub platform: Platform,
    /// Synthetic popularity score, not derived from real usage data
    pub engagement: u32,
}

/// One page of the feed as returned by `GET /api/videos`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub videos: Vec<VideoRecord>,
    /// Page to request next; absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u32>,
}

impl FeedPage {
    /// Build the response for `page`, deriving the cursor from the page size.
    /// The last representable page is always terminal.
    pub fn for_page(page: u32, videos: Vec<VideoRecord>) -> Self {
        let next_cursor = if videos.len() == PAGE_SIZE {
            page.checked_add(1)
        } else {
            None
        };
        Self {
            videos,
            next_cursor,
        }
    }

    /// A terminal page with no records
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Response body of `POST /api/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Relative reference to the stored file, e.g. `/uploads/1700000000000.mp3`
    pub url: String,
    /// Always 0: duration is reported by the decoder on the client, not probed here
    pub duration: u64,
}

/// Error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
