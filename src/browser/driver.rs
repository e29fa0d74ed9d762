use crate::error::Result;
use crate::models::Locator;
use async_trait::async_trait;

/// Narrow seam over the live document. The cascade extractor, the page loader,
/// and the orchestrator only speak this trait, so they can run against a fake
/// document in tests and against Chromium in production.
///
/// Lookup methods return `Ok(None)` when nothing matches; `Err` is reserved
/// for driver-level faults (dead session, script failure).
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn set_session_cookie(&self, name: &str, value: &str, domain: &str) -> Result<()>;

    /// Value of the first element matching `locator`, if any.
    async fn lookup(&self, locator: &Locator) -> Result<Option<String>>;

    /// Number of elements matching `locator`.
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Value of the first element matching `nested` inside the `index`-th
    /// element matching `container`.
    async fn lookup_within(
        &self,
        container: &Locator,
        index: usize,
        nested: &Locator,
    ) -> Result<Option<String>>;

    /// `src` of every descendant image of the `index`-th `container` match,
    /// in document order, unfiltered.
    async fn image_urls_within(&self, container: &Locator, index: usize) -> Result<Vec<String>>;

    /// Click the first match if present. `Ok(false)` when nothing matched.
    async fn click(&self, locator: &Locator) -> Result<bool>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Current page extent (document scroll height).
    async fn content_extent(&self) -> Result<i64>;
}

/// A driver backed by a session that must be released when the scrape is
/// over, whatever the outcome.
#[async_trait]
pub trait PageSession: PageDriver {
    async fn close(&mut self) -> Result<()>;
}
