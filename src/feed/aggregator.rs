use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use super::model::{FeedPage, PostSummary, RawPage};
use super::normalize::normalize_page;
use crate::content::FetchError;

/// Errors from paging through the post listing.
#[derive(Debug, Error)]
pub enum FeedError {
    /// `load_next` was called after the last page. The UI should have hidden
    /// the "load more" action.
    #[error("No more pages to load")]
    Exhausted,
    /// A previous `load_next` on the same aggregator has not completed yet.
    #[error("A page load is already in progress")]
    LoadInProgress,
    /// The continuation fetch failed. The feed is unchanged and can be retried.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Anything that can fetch the page behind a continuation token.
pub trait PageSource {
    fn fetch_page(&self, token: &str) -> impl Future<Output = Result<RawPage, FetchError>> + Send;
}

/// The accumulated listing.
///
/// Posts are append-only in first-seen order. No de-duplication happens:
/// if the CMS returns the same `uid` on two pages, both copies stay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    accumulated: Vec<PostSummary>,
    next_page: Option<String>,
}

impl FeedState {
    /// Builds the listing from the first page.
    pub fn initialize(first_page: FeedPage) -> Self {
        Self {
            accumulated: first_page.results,
            next_page: first_page.next_page_token,
        }
    }

    /// Whether the most recently applied page carried a continuation token.
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn accumulated(&self) -> &[PostSummary] {
        &self.accumulated
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    /// Consumes the state, yielding the posts in display order.
    pub fn into_posts(self) -> Vec<PostSummary> {
        self.accumulated
    }

    /// Appends `page` and takes over its continuation token. Returns the
    /// number of posts appended.
    fn apply(&mut self, page: FeedPage) -> usize {
        let appended = page.results.len();
        self.accumulated.extend(page.results);
        self.next_page = page.next_page_token;
        appended
    }
}

/// Shorthand for [`FeedState::initialize`].
pub fn initialize(first_page: FeedPage) -> FeedState {
    FeedState::initialize(first_page)
}

/// Fetches the page behind the state's continuation token and appends it.
///
/// Issues exactly one fetch. No retry happens here; on error the state is
/// left as it was, so `has_more` stays true and the caller may try again.
///
/// # Errors
///
/// - [`FeedError::Exhausted`] when `state.has_more()` is false (no request is made)
/// - [`FeedError::Fetch`] when the source fails
pub async fn load_next<S: PageSource>(
    state: &mut FeedState,
    source: &S,
) -> Result<usize, FeedError> {
    let Some(token) = state.next_page.clone() else {
        tracing::warn!(posts = state.len(), "load_next called on exhausted feed");
        return Err(FeedError::Exhausted);
    };

    let page = fetch_normalized(source, &token).await?;
    let appended = state.apply(page);
    tracing::debug!(
        appended = appended,
        total = state.len(),
        has_more = state.has_more(),
        "Appended feed page"
    );
    Ok(appended)
}

/// Calls [`load_next`] until the feed is exhausted or `max_pages` further
/// pages have been loaded. Returns the number of posts appended.
pub async fn load_all<S: PageSource>(
    state: &mut FeedState,
    source: &S,
    max_pages: usize,
) -> Result<usize, FeedError> {
    let mut appended = 0;
    let mut pages = 0;

    while state.has_more() {
        if pages >= max_pages {
            tracing::warn!(
                max_pages = max_pages,
                posts = state.len(),
                "Stopped paging at page limit"
            );
            break;
        }
        appended += load_next(state, source).await?;
        pages += 1;
    }

    Ok(appended)
}

async fn fetch_normalized<S: PageSource>(source: &S, token: &str) -> Result<FeedPage, FeedError> {
    match source.fetch_page(token).await {
        Ok(raw) => Ok(normalize_page(raw)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch next feed page");
            Err(FeedError::Fetch(e))
        }
    }
}

/// A shareable listing that serializes "load more" requests.
///
/// While one [`FeedAggregator::load_next`] is awaiting its fetch, any other
/// call fails fast with [`FeedError::LoadInProgress`] instead of issuing a
/// second request. This keeps a double-clicked "load more" from appending
/// the same page twice.
#[derive(Debug)]
pub struct FeedAggregator {
    state: Mutex<FeedState>,
    in_flight: AtomicBool,
}

impl FeedAggregator {
    pub fn new(first_page: FeedPage) -> Self {
        Self {
            state: Mutex::new(FeedState::initialize(first_page)),
            in_flight: AtomicBool::new(false),
        }
    }

    /// A copy of the current listing.
    pub fn snapshot(&self) -> FeedState {
        self.lock_state().clone()
    }

    pub fn has_more(&self) -> bool {
        self.lock_state().has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Loads and appends the next page.
    ///
    /// # Errors
    ///
    /// - [`FeedError::LoadInProgress`] if another load has not finished
    /// - [`FeedError::Exhausted`] if there is no next page
    /// - [`FeedError::Fetch`] if the source fails; the listing is unchanged
    pub async fn load_next<S: PageSource>(&self, source: &S) -> Result<usize, FeedError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            tracing::debug!("Rejected load_next while another load is in flight");
            FeedError::LoadInProgress
        })?;

        let token = {
            let state = self.lock_state();
            match state.next_page_token() {
                Some(token) => token.to_string(),
                None => {
                    tracing::warn!(posts = state.len(), "load_next called on exhausted feed");
                    return Err(FeedError::Exhausted);
                }
            }
        };

        let page = fetch_normalized(source, &token).await?;

        let mut state = self.lock_state();
        let appended = state.apply(page);
        tracing::debug!(
            appended = appended,
            total = state.len(),
            has_more = state.has_more(),
            "Appended feed page"
        );
        Ok(appended)
    }

    fn lock_state(&self) -> MutexGuard<'_, FeedState> {
        // State is only mutated by `apply`, which cannot panic halfway.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears the in-flight flag when dropped, including on error and cancellation.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
