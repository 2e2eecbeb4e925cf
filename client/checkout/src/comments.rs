//! Paged comment thread for a project.
//!
//! At most one page request is in flight per pager. A trigger that arrives
//! while a request is outstanding is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pledge_domain::{Comment, CommentsPage};

use crate::collaborators::CommentsSource;
use crate::errors::{CheckoutError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentsUiState {
    pub comments: Vec<Comment>,
    pub has_more: bool,
    pub is_loading: bool,
    /// Last failure, cleared by the next successful load.
    pub error: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Another request was in flight, or there is nothing more to load.
    Skipped,
    Failed,
    Canceled,
}

struct Inner<S> {
    source: S,
    project_slug: String,
    page_size: u32,
    in_flight: AtomicBool,
    cancel: CancellationToken,
    ui: watch::Sender<CommentsUiState>,
}

/// Clears the in-flight flag however the request ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CommentsPager<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for CommentsPager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CommentsSource> CommentsPager<S> {
    pub fn new(source: S, project_slug: impl Into<String>, page_size: u32) -> Self {
        let (ui, _) = watch::channel(CommentsUiState {
            has_more: true,
            ..CommentsUiState::default()
        });
        Self {
            inner: Arc::new(Inner {
                source,
                project_slug: project_slug.into(),
                page_size,
                in_flight: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                ui,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CommentsUiState> {
        self.inner.ui.subscribe()
    }

    pub fn state(&self) -> CommentsUiState {
        self.inner.ui.borrow().clone()
    }

    /// Reload from the first page, replacing whatever is shown.
    pub async fn refresh(&self) -> LoadOutcome {
        self.load(None).await
    }

    /// Fetch the page after the last one loaded.
    pub async fn load_more(&self) -> LoadOutcome {
        let (has_more, cursor) = {
            let state = self.inner.ui.borrow();
            (state.has_more, state.cursor.clone())
        };
        if !has_more {
            debug!("No more comments for {}", self.inner.project_slug);
            return LoadOutcome::Skipped;
        }
        self.load(cursor).await
    }

    /// Stop the pager. An in-flight request is abandoned without touching
    /// the state.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    async fn load(&self, cursor: Option<String>) -> LoadOutcome {
        let inner = &self.inner;
        if inner.cancel.is_cancelled() {
            return LoadOutcome::Canceled;
        }
        if inner.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Comments request already in flight, ignoring trigger");
            return LoadOutcome::Skipped;
        }
        let _guard = InFlight(&inner.in_flight);

        inner.ui.send_modify(|state| state.is_loading = true);

        let fetch = inner
            .source
            .fetch_page(&inner.project_slug, cursor.as_deref(), inner.page_size);
        let result: Result<CommentsPage> = tokio::select! {
            biased;
            _ = inner.cancel.cancelled() => {
                info!("Comments pager for {} canceled", inner.project_slug);
                return LoadOutcome::Canceled;
            }
            result = fetch => result,
        };

        let first_page = cursor.is_none();
        match result {
            Ok(page) => {
                debug!(
                    "Loaded {} comments for {} (more={})",
                    page.comments.len(),
                    inner.project_slug,
                    page.has_next_page
                );
                inner.ui.send_modify(|state| {
                    if first_page {
                        state.comments = page.comments;
                    } else {
                        state.comments.extend(page.comments);
                    }
                    state.has_more = page.has_next_page;
                    state.cursor = page.end_cursor;
                    state.is_loading = false;
                    state.error = None;
                });
                LoadOutcome::Loaded
            }
            Err(e) => {
                warn!("Comments fetch failed for {}: {e}", inner.project_slug);
                inner.ui.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.to_string());
                });
                LoadOutcome::Failed
            }
        }
    }
}

/// Comment thread held in memory, paged by offset cursors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryComments {
    comments: Vec<Comment>,
}

impl InMemoryComments {
    pub fn new(comments: Vec<Comment>) -> Self {
        Self { comments }
    }
}

impl CommentsSource for InMemoryComments {
    async fn fetch_page(
        &self,
        _project_slug: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<CommentsPage> {
        let start = match cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| CheckoutError::Comments(format!("invalid cursor {cursor:?}")))?,
            None => 0,
        };
        let total = self.comments.len();
        let end = start.saturating_add(limit as usize).min(total);
        let comments = self.comments.get(start..end).unwrap_or_default().to_vec();
        Ok(CommentsPage {
            comments,
            end_cursor: Some(end.to_string()),
            has_next_page: end < total,
            total_count: u32::try_from(total).unwrap_or(u32::MAX),
        })
    }
}
