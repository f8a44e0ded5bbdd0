//! Studio session: the audio selection, hashtags and feed composed together.
//!
//! The session derives the feed's query key from the current clip selection
//! and hashtag set. The feed only runs when both an uploaded clip and at least
//! one hashtag are present; every mutation that changes the key restarts it.

use crate::client::{ClientError, StudioClient};
use crate::feed::{FeedPaginator, FeedSource, FetchTicket, QueryKey, Resolution};
use crate::hashtags::{HashtagEditor, HashtagSet, SubmitTrigger};
use crate::media::is_audio_upload;
use crate::range::RangeSelector;
use crate::types::UploadResponse;
use async_trait::async_trait;
use tracing::{debug, info};

/// Backend a session talks to: feed pages plus audio uploads
#[async_trait]
pub trait StudioBackend: FeedSource {
    async fn upload_audio(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError>;
}

#[async_trait]
impl StudioBackend for StudioClient {
    async fn upload_audio(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        StudioClient::upload_audio(self, file_name, content_type, bytes).await
    }
}

pub struct StudioSession<B> {
    backend: B,
    audio: Option<RangeSelector>,
    hashtags: HashtagEditor,
    feed: FeedPaginator,
}

impl<B: StudioBackend> StudioSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            audio: None,
            hashtags: HashtagEditor::new(),
            feed: FeedPaginator::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn selector(&self) -> Option<&RangeSelector> {
        self.audio.as_ref()
    }

    pub fn hashtags(&self) -> &HashtagSet {
        self.hashtags.tags()
    }

    pub fn hashtag_input(&self) -> &str {
        self.hashtags.input()
    }

    pub fn feed(&self) -> &FeedPaginator {
        &self.feed
    }

    /// Query key for the current state, if the feed should be shown at all
    pub fn query_key(&self) -> Option<QueryKey> {
        let audio = self.audio.as_ref()?;
        if self.hashtags.tags().is_empty() {
            return None;
        }
        Some(QueryKey {
            hashtags: self.hashtags.tags().as_slice().to_vec(),
            clip: audio.selection(),
        })
    }

    /// Upload a new clip, replacing any previous selection.
    ///
    /// Files outside the audio allow-list are ignored and `Ok(false)` is returned.
    pub async fn upload_audio(
        &mut self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<bool, ClientError> {
        if !is_audio_upload(file_name, content_type) {
            debug!(file = %file_name, "Ignoring non-audio file");
            return Ok(false);
        }

        let uploaded = self
            .backend
            .upload_audio(file_name, content_type, bytes)
            .await?;

        info!(url = %uploaded.url, "Audio clip replaced");
        self.audio = Some(RangeSelector::new(uploaded.url));
        self.sync_feed().await;
        Ok(true)
    }

    /// The decoder reported the clip duration
    pub async fn audio_ready(&mut self, duration: f64) {
        if let Some(selector) = self.audio.as_mut() {
            selector.on_ready(duration);
            self.sync_feed().await;
        }
    }

    pub async fn set_start(&mut self, value: f64) -> bool {
        let applied = self
            .audio
            .as_mut()
            .map(|s| s.set_start(value))
            .unwrap_or(false);
        if applied {
            self.sync_feed().await;
        }
        applied
    }

    pub async fn set_end(&mut self, value: f64) -> bool {
        let applied = self
            .audio
            .as_mut()
            .map(|s| s.set_end(value))
            .unwrap_or(false);
        if applied {
            self.sync_feed().await;
        }
        applied
    }

    pub fn set_hashtag_input(&mut self, input: impl Into<String>) {
        self.hashtags.set_input(input);
    }

    pub async fn submit_hashtag(&mut self, trigger: SubmitTrigger) -> bool {
        let added = self.hashtags.submit(trigger);
        if added {
            self.sync_feed().await;
        }
        added
    }

    pub async fn remove_hashtag(&mut self, tag: &str) -> bool {
        let removed = self.hashtags.remove(tag);
        if removed {
            self.sync_feed().await;
        }
        removed
    }

    /// Fetch the next page if one is available and nothing is in flight
    pub async fn load_more(&mut self) -> bool {
        match self.feed.load_more() {
            Some(ticket) => {
                self.fetch(ticket).await;
                true
            }
            None => false,
        }
    }

    /// Refetch the page that last failed
    pub async fn retry(&mut self) -> bool {
        match self.feed.retry() {
            Some(ticket) => {
                self.fetch(ticket).await;
                true
            }
            None => false,
        }
    }

    async fn sync_feed(&mut self) {
        let key = self.query_key();
        if let Some(ticket) = self.feed.set_query(key) {
            self.fetch(ticket).await;
        }
    }

    async fn fetch(&mut self, ticket: FetchTicket) -> Resolution {
        let outcome = self
            .backend
            .fetch_page(ticket.hashtags(), ticket.page())
            .await;
        self.feed.resolve(&ticket, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedStatus;
    use crate::types::{FeedPage, Platform, VideoRecord, PAGE_SIZE};
    use std::sync::Mutex;

    /// Backend serving pages of the configured sizes and recording every request
    #[derive(Default)]
    struct FakeBackend {
        page_sizes: Vec<usize>,
        requests: Mutex<Vec<(Vec<String>, u32)>>,
        uploads: Mutex<u32>,
        fail_pages: Vec<u32>,
    }

    impl FakeBackend {
        fn with_pages(page_sizes: Vec<usize>) -> Self {
            Self {
                page_sizes,
                ..Default::default()
            }
        }

        fn requests(&self) -> Vec<(Vec<String>, u32)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedSource for FakeBackend {
        async fn fetch_page(&self, hashtags: &[String], page: u32) -> Result<FeedPage, ClientError> {
            self.requests
                .lock()
                .unwrap()
                .push((hashtags.to_vec(), page));

            if self.fail_pages.contains(&page) {
                return Err(ClientError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }

            let count = self.page_sizes.get(page as usize).copied().unwrap_or(0);
            let videos = (0..count)
                .map(|i| VideoRecord {
                    id: format!("{page}-{i}"),
                    url: "https://example.com/v.mp4".to_string(),
                    thumbnail: "https://example.com/t.jpg".to_string(),
                    platform: Platform::Pexels,
                    engagement: 1,
                })
                .collect();
            Ok(FeedPage::for_page(page, videos))
        }
    }

    #[async_trait]
    impl StudioBackend for FakeBackend {
        async fn upload_audio(
            &self,
            file_name: &str,
            _content_type: Option<&str>,
            _bytes: Vec<u8>,
        ) -> Result<UploadResponse, ClientError> {
            let mut uploads = self.uploads.lock().unwrap();
            *uploads += 1;
            Ok(UploadResponse {
                url: format!("/uploads/{}-{}", *uploads, file_name),
                duration: 0,
            })
        }
    }

    async fn session_with_clip(page_sizes: Vec<usize>) -> StudioSession<FakeBackend> {
        let mut session = StudioSession::new(FakeBackend::with_pages(page_sizes));
        assert!(session
            .upload_audio("song.mp3", Some("audio/mpeg"), vec![0; 8])
            .await
            .unwrap());
        session.audio_ready(120.0).await;
        session
    }

    async fn add_tag<B: StudioBackend>(session: &mut StudioSession<B>, tag: &str) -> bool {
        session.set_hashtag_input(tag);
        session.submit_hashtag(SubmitTrigger::Enter).await
    }

    #[tokio::test]
    async fn test_feed_gated_on_audio_and_hashtags() {
        let mut session = StudioSession::new(FakeBackend::with_pages(vec![PAGE_SIZE]));
        add_tag(&mut session, "#music").await;
        assert!(session.query_key().is_none());
        assert_eq!(session.feed().status(), FeedStatus::Idle);
        assert!(session.backend().requests().is_empty());

        session
            .upload_audio("song.wav", None, vec![1, 2])
            .await
            .unwrap();
        assert_eq!(session.feed().status(), FeedStatus::Loaded);
        assert_eq!(session.backend().requests(), vec![(vec!["music".to_string()], 0)]);
    }

    #[tokio::test]
    async fn test_non_audio_upload_ignored() {
        let mut session = StudioSession::new(FakeBackend::default());
        let accepted = session
            .upload_audio("clip.mov", Some("video/quicktime"), vec![0; 4])
            .await
            .unwrap();
        assert!(!accepted);
        assert!(session.selector().is_none());
        assert_eq!(*session.backend().uploads.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_infinite_scroll_to_last_page() {
        let mut session = session_with_clip(vec![PAGE_SIZE, PAGE_SIZE, 15]).await;
        add_tag(&mut session, "music").await;

        assert!(session.load_more().await);
        assert!(session.load_more().await);
        assert!(!session.load_more().await);

        assert_eq!(session.feed().records().len(), 55);
        assert!(!session.feed().has_next_page());
        let pages: Vec<u32> = session.backend().requests().iter().map(|r| r.1).collect();
        assert_eq!(pages, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_hashtag_change_restarts_feed() {
        let mut session = session_with_clip(vec![PAGE_SIZE; 5]).await;
        add_tag(&mut session, "music").await;
        session.load_more().await;
        session.load_more().await;
        assert_eq!(session.feed().pages_loaded(), 3);

        add_tag(&mut session, "dance").await;
        assert_eq!(session.feed().pages_loaded(), 1);
        assert_eq!(session.feed().records().len(), PAGE_SIZE);

        let last = session.backend().requests().last().cloned().unwrap();
        assert_eq!(last, (vec!["music".to_string(), "dance".to_string()], 0));

        assert!(session.remove_hashtag("music").await);
        let last = session.backend().requests().last().cloned().unwrap();
        assert_eq!(last, (vec!["dance".to_string()], 0));
    }

    #[tokio::test]
    async fn test_duplicate_hashtag_does_not_refetch() {
        let mut session = session_with_clip(vec![PAGE_SIZE]).await;
        add_tag(&mut session, "#Music").await;
        assert!(!add_tag(&mut session, "Music").await);

        assert_eq!(session.hashtags().as_slice(), ["Music".to_string()]);
        assert_eq!(session.backend().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_range_change_restarts_feed() {
        let mut session = session_with_clip(vec![PAGE_SIZE; 3]).await;
        add_tag(&mut session, "music").await;
        session.load_more().await;

        assert!(session.set_start(10.0).await);
        assert_eq!(session.feed().pages_loaded(), 1);
        assert_eq!(session.query_key().unwrap().clip.start, 10.0);

        // Rejected adjustments leave the feed alone
        let before = session.backend().requests().len();
        assert!(!session.set_end(90.0).await);
        assert_eq!(session.backend().requests().len(), before);
    }

    #[tokio::test]
    async fn test_new_upload_replaces_selection() {
        let mut session = session_with_clip(vec![PAGE_SIZE]).await;
        session.set_end(20.0).await;
        let first_url = session.selector().unwrap().source_url().to_string();

        session.upload_audio("other.m4a", None, vec![9]).await.unwrap();
        let selector = session.selector().unwrap();
        assert_ne!(selector.source_url(), first_url);
        assert!(!selector.is_ready());
        assert_eq!((selector.start(), selector.end()), (0.0, 30.0));
    }

    #[tokio::test]
    async fn test_failed_page_can_be_retried() {
        let backend = FakeBackend {
            page_sizes: vec![PAGE_SIZE, PAGE_SIZE],
            fail_pages: vec![1],
            ..Default::default()
        };
        let mut session = StudioSession::new(backend);
        session.upload_audio("a.mp3", None, vec![0]).await.unwrap();
        add_tag(&mut session, "music").await;

        assert!(session.load_more().await);
        assert_eq!(session.feed().status(), FeedStatus::Error);
        assert_eq!(session.feed().records().len(), PAGE_SIZE);

        assert!(session.retry().await);
        let pages: Vec<u32> = session.backend().requests().iter().map(|r| r.1).collect();
        assert_eq!(pages, vec![0, 1, 1]);
    }
}
