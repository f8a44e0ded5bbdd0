//! Clip Studio - client-side state for the clip studio
//!
//! This library holds everything the studio UI keeps between interactions:
//!
//! - The selected window over an uploaded audio clip (at most 30 seconds)
//! - The hashtag set built up from free-text input
//! - The trending-video feed, paginated on demand
//!
//! It also carries the wire types shared with `clip-server` and a typed HTTP
//! client for the server's API.
//!
//! # Example
//!
//! ```rust,no_run
//! use clip_studio::{StudioClient, StudioSession, SubmitTrigger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StudioClient::new("http://localhost:3000")?;
//!     let mut session = StudioSession::new(client);
//!
//!     let audio = std::fs::read("song.mp3")?;
//!     session.upload_audio("song.mp3", Some("audio/mpeg"), audio).await?;
//!     session.audio_ready(184.0).await;
//!
//!     session.set_hashtag_input("#summer");
//!     session.submit_hashtag(SubmitTrigger::Enter).await;
//!
//!     while session.load_more().await {}
//!     println!("{} videos", session.feed().records().len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod feed;
pub mod hashtags;
pub mod media;
pub mod range;
pub mod session;
pub mod types;

// Re-export main types
pub use client::{ClientError, StudioClient, AUDIO_FIELD};
pub use feed::{FeedPaginator, FeedSource, FeedStatus, FetchTicket, QueryKey, Resolution};
pub use hashtags::{normalize_tag, HashtagEditor, HashtagSet, SubmitTrigger};
pub use media::{is_audio_upload, AUDIO_EXTENSIONS};
pub use range::{format_time, AudioClipSelection, RangeSelector, MAX_WINDOW_SECS};
pub use session::{StudioBackend, StudioSession};
pub use types::{ErrorResponse, FeedPage, Platform, UploadResponse, VideoRecord, PAGE_SIZE};
