//! Paginated enumeration protocol for directory emulation
//!
//! Flat-key backends list at most a host-imposed page of keys per call,
//! returning a continuation cursor and a truncation flag. Every bulk
//! directory operation (recursive delete, copy, move) is the same loop
//! with a different per-page action, so this module is the single place
//! where cursor mechanics live: [`Pages`] is a lazy sequence of pages and
//! [`for_each_page`] drives an action over it.

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::adapter::check_cancelled;
use crate::error::Result;
use crate::path::StoragePath;

/// Page size used by backends that impose their own cap server-side.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Matching keys, in the backend's listing order
    pub keys: Vec<String>,
    /// Opaque continuation cursor for the next request
    pub cursor: Option<String>,
    /// True when further pages remain
    pub truncated: bool,
}

/// A backend's paged prefix-listing primitive.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page following `cursor` (`None` for the first page).
    async fn next_page(&self, prefix: &str, cursor: Option<&str>) -> Result<ObjectPage>;
}

/// Whether a per-page action wants further pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFlow {
    Continue,
    Stop,
}

/// Lazy sequence of listing pages under a prefix.
///
/// Each `try_next` call checks the cancellation token, fetches one page,
/// and advances the cursor. The sequence ends on an empty page or after a
/// page the backend reported as not truncated. Pages are fetched strictly
/// in order and never refetched; errors end the sequence immediately.
pub struct Pages<'a, S: PageSource + ?Sized> {
    source: &'a S,
    prefix: String,
    cancel: &'a CancellationToken,
    cursor: Option<String>,
    done: bool,
}

impl<'a, S: PageSource + ?Sized> Pages<'a, S> {
    /// Start a page sequence under the directory `prefix`.
    pub fn new(source: &'a S, prefix: &StoragePath, cancel: &'a CancellationToken) -> Self {
        Self {
            source,
            prefix: prefix.as_directory().as_str().to_string(),
            cancel,
            cursor: None,
            done: false,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    pub async fn try_next(&mut self) -> Result<Option<ObjectPage>> {
        if self.done {
            return Ok(None);
        }
        check_cancelled(self.cancel)?;
        let page = self.source.next_page(&self.prefix, self.cursor.as_deref()).await?;
        if page.keys.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.cursor = page.cursor.clone();
        if !page.truncated {
            self.done = true;
        }
        tracing::debug!(prefix = %self.prefix, keys = page.keys.len(), truncated = page.truncated, "Fetched listing page");
        Ok(Some(page))
    }
}

/// Run `action` once per non-empty page under `prefix`, in listing order.
///
/// The action may end the enumeration early by returning
/// [`PageFlow::Stop`]; no further listing call is made after a stop. An
/// error from the action or the backend aborts the loop immediately and
/// propagates; partially processed pages are not retried.
pub async fn for_each_page<S, F, Fut>(
    source: &S,
    prefix: &StoragePath,
    cancel: &CancellationToken,
    mut action: F,
) -> Result<()>
where
    S: PageSource + ?Sized,
    F: FnMut(ObjectPage) -> Fut,
    Fut: Future<Output = Result<PageFlow>>,
{
    let mut pages = Pages::new(source, prefix, cancel);
    while let Some(page) = pages.try_next().await? {
        if action(page).await? == PageFlow::Stop {
            break;
        }
    }
    Ok(())
}
