//! Cursor-driven feed pagination.
//!
//! [`FeedPaginator`] is a pure state machine. It never performs I/O itself:
//! [`FeedPaginator::set_query`], [`FeedPaginator::load_more`] and
//! [`FeedPaginator::retry`] hand out a [`FetchTicket`] describing the one page
//! the caller should fetch, and [`FeedPaginator::resolve`] folds the outcome
//! back in.
//!
//! ```text
//!            set_query(Some)          first page
//!   Idle ───────────────────▶ Loading ──────────▶ Loaded ◀───────┐
//!     ▲                          │                 │ load_more   │ next page
//!     │ set_query(None)          │ failure         ▼             │
//!     └──── (any state)          └──────▶ Error  LoadingMore ────┘
//!                                          ▲  │       │ failure
//!                                          │  └───────┘ retry
//!                                          └──────────┘
//! ```
//!
//! Only one ticket is outstanding at a time. Every ticket carries the
//! generation it was issued for; changing the query key bumps the generation
//! so a late response for an old key is dropped instead of being appended to
//! the new feed.

use crate::client::ClientError;
use crate::range::AudioClipSelection;
use crate::types::{FeedPage, VideoRecord};
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, warn};

/// Identity of one feed session
#[derive(Debug, Clone, PartialEq)]
pub struct QueryKey {
    pub hashtags: Vec<String>,
    pub clip: AudioClipSelection,
}

/// Source of feed pages
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(&self, hashtags: &[String], page: u32) -> Result<FeedPage, ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    LoadingMore,
    Loaded,
    Error,
}

/// A page the caller has been told to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    generation: u64,
    key: QueryKey,
    page: u32,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn hashtags(&self) -> &[String] {
        &self.key.hashtags
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`FeedPaginator::resolve`] did with an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Page appended
    Applied,
    /// Fetch failed, paginator is in `Error`
    Failed,
    /// Ticket no longer matches the current key or the outstanding page; ignored
    Stale,
}

#[derive(Debug, Clone)]
pub struct FeedPaginator {
    key: Option<QueryKey>,
    status: FeedStatus,
    records: Vec<VideoRecord>,
    pages_loaded: u32,
    next_cursor: Option<u32>,
    generation: u64,
    in_flight: Option<u32>,
    failed_page: Option<u32>,
    last_error: Option<String>,
}

impl Default for FeedPaginator {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedPaginator {
    pub fn new() -> Self {
        Self {
            key: None,
            status: FeedStatus::Idle,
            records: Vec::new(),
            pages_loaded: 0,
            next_cursor: None,
            generation: 0,
            in_flight: None,
            failed_page: None,
            last_error: None,
        }
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn key(&self) -> Option<&QueryKey> {
        self.key.as_ref()
    }

    /// All records fetched for the current key, in fetch order
    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.status, FeedStatus::Loading | FeedStatus::LoadingMore)
    }

    /// Whether "load more" should be offered to the user
    pub fn can_load_more(&self) -> bool {
        self.status == FeedStatus::Loaded && self.has_next_page()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Point the feed at `key`. An unchanged key is a no-op; any other key
    /// flushes records and cursor and, when present, starts again from page 0.
    pub fn set_query(&mut self, key: Option<QueryKey>) -> Option<FetchTicket> {
        if key == self.key {
            return None;
        }

        self.generation += 1;
        self.records.clear();
        self.pages_loaded = 0;
        self.next_cursor = None;
        self.in_flight = None;
        self.failed_page = None;
        self.last_error = None;
        self.key = key;

        match self.key {
            Some(_) => {
                debug!(generation = self.generation, "Feed query changed, loading first page");
                self.status = FeedStatus::Loading;
                self.issue(0)
            }
            None => {
                self.status = FeedStatus::Idle;
                None
            }
        }
    }

    /// Request the next page. Ignored while a fetch is outstanding or once the
    /// last page has arrived.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if !self.can_load_more() {
            debug!(status = ?self.status, "Ignoring load more");
            return None;
        }
        let page = self.next_cursor?;
        self.status = FeedStatus::LoadingMore;
        self.issue(page)
    }

    /// Reissue the page that failed
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.status != FeedStatus::Error {
            return None;
        }
        let page = self.failed_page.take()?;
        self.last_error = None;
        self.status = if page == 0 {
            FeedStatus::Loading
        } else {
            FeedStatus::LoadingMore
        };
        self.issue(page)
    }

    /// Fold a fetch outcome back into the feed
    pub fn resolve<E: fmt::Display>(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<FeedPage, E>,
    ) -> Resolution {
        if ticket.generation != self.generation || self.in_flight != Some(ticket.page) {
            warn!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                page = ticket.page,
                "Discarding stale feed response"
            );
            return Resolution::Stale;
        }
        self.in_flight = None;

        match outcome {
            Ok(page) => {
                debug!(
                    page = ticket.page,
                    records = page.videos.len(),
                    next_cursor = ?page.next_cursor,
                    "Feed page applied"
                );
                self.records.extend(page.videos);
                self.next_cursor = page.next_cursor;
                self.pages_loaded += 1;
                self.status = FeedStatus::Loaded;
                Resolution::Applied
            }
            Err(e) => {
                warn!(page = ticket.page, error = %e, "Feed page failed");
                self.failed_page = Some(ticket.page);
                self.last_error = Some(e.to_string());
                self.status = FeedStatus::Error;
                Resolution::Failed
            }
        }
    }

    fn issue(&mut self, page: u32) -> Option<FetchTicket> {
        let key = self.key.clone()?;
        self.in_flight = Some(page);
        Some(FetchTicket {
            generation: self.generation,
            key,
            page,
        })
    }
}
