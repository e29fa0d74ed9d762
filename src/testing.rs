//! Testing utilities: in-memory fakes for the browser and downloader seams.
//!
//! Useful for exercising cascade, loader, and orchestrator logic without a
//! Chromium process or network access.

use crate::browser::{PageDriver, PageSession};
use crate::download::{persist_bytes, MediaFetcher};
use crate::error::{AppError, Result};
use crate::models::Locator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

/// A scripted document driver.
///
/// Lookups are answered from preloaded maps keyed by locator query; page
/// extents are replayed from a fixed sequence (the last value repeats once the
/// sequence is exhausted). Navigation, cookie, and click calls are recorded
/// for assertions.
#[derive(Default)]
pub struct FakeDriver {
    values: RwLock<HashMap<String, String>>,
    scoped_values: RwLock<HashMap<(String, usize, String), String>>,
    images: RwLock<HashMap<(String, usize), Vec<String>>>,
    counts: RwLock<HashMap<String, usize>>,
    failing: RwLock<HashSet<String>>,
    failing_images: RwLock<HashSet<(String, usize)>>,
    clickable: RwLock<HashSet<String>>,
    redirects: RwLock<HashMap<String, String>>,
    extents: RwLock<Vec<i64>>,
    extent_cursor: Mutex<usize>,

    current_url: RwLock<String>,
    visited: Arc<Mutex<Vec<String>>>,
    clicks: Arc<Mutex<Vec<String>>>,
    cookies: Arc<Mutex<Vec<(String, String, String)>>>,
    close_calls: Mutex<usize>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer whole-document lookups for `query` with `value`.
    pub fn with_value(self, query: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.write().unwrap().insert(query.into(), value.into());
        self
    }

    /// Make every lookup for `query` fail at the driver level.
    pub fn with_failing_query(self, query: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(query.into());
        self
    }

    /// Answer scoped lookups inside the `index`-th `container` match.
    pub fn with_scoped_value(
        self,
        container: impl Into<String>,
        index: usize,
        nested: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.scoped_values
            .write()
            .unwrap()
            .insert((container.into(), index, nested.into()), value.into());
        self
    }

    /// Set descendant image sources for the `index`-th `container` match.
    pub fn with_images(
        self,
        container: impl Into<String>,
        index: usize,
        urls: Vec<&str>,
    ) -> Self {
        self.images.write().unwrap().insert(
            (container.into(), index),
            urls.into_iter().map(String::from).collect(),
        );
        self
    }

    /// Make the image sweep of the `index`-th `container` match fail.
    pub fn with_failing_images(self, container: impl Into<String>, index: usize) -> Self {
        self.failing_images
            .write()
            .unwrap()
            .insert((container.into(), index));
        self
    }

    /// Set the match count for `query`.
    pub fn with_count(self, query: impl Into<String>, count: usize) -> Self {
        self.counts.write().unwrap().insert(query.into(), count);
        self
    }

    /// Make clicks on `query` succeed.
    pub fn with_clickable(self, query: impl Into<String>) -> Self {
        self.clickable.write().unwrap().insert(query.into());
        self
    }

    /// Replay this extent sequence from `content_extent`.
    pub fn with_extents(self, extents: Vec<i64>) -> Self {
        *self.extents.write().unwrap() = extents;
        self
    }

    pub fn with_current_url(self, url: impl Into<String>) -> Self {
        *self.current_url.write().unwrap() = url.into();
        self
    }

    /// Navigating to `requested` lands on `actual` instead (login bounces).
    pub fn with_redirect(self, requested: impl Into<String>, actual: impl Into<String>) -> Self {
        self.redirects
            .write()
            .unwrap()
            .insert(requested.into(), actual.into());
        self
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn cookies(&self) -> Vec<(String, String, String)> {
        self.cookies.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> usize {
        *self.close_calls.lock().unwrap()
    }

    fn fail_if_marked(&self, query: &str) -> Result<()> {
        if self.failing.read().unwrap().contains(query) {
            return Err(AppError::Browser(format!("lookup failed: {}", query)));
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        let landed = self
            .redirects
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        *self.current_url.write().unwrap() = landed;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.current_url.read().unwrap().clone())
    }

    async fn set_session_cookie(&self, name: &str, value: &str, domain: &str) -> Result<()> {
        self.cookies
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string(), domain.to_string()));
        Ok(())
    }

    async fn lookup(&self, locator: &Locator) -> Result<Option<String>> {
        self.fail_if_marked(&locator.query)?;
        Ok(self.values.read().unwrap().get(&locator.query).cloned())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        self.fail_if_marked(&locator.query)?;
        Ok(self
            .counts
            .read()
            .unwrap()
            .get(&locator.query)
            .copied()
            .unwrap_or(0))
    }

    async fn lookup_within(
        &self,
        container: &Locator,
        index: usize,
        nested: &Locator,
    ) -> Result<Option<String>> {
        self.fail_if_marked(&nested.query)?;
        Ok(self
            .scoped_values
            .read()
            .unwrap()
            .get(&(container.query.clone(), index, nested.query.clone()))
            .cloned())
    }

    async fn image_urls_within(&self, container: &Locator, index: usize) -> Result<Vec<String>> {
        if self
            .failing_images
            .read()
            .unwrap()
            .contains(&(container.query.clone(), index))
        {
            return Err(AppError::Browser(format!(
                "image sweep failed in {}[{}]",
                container.query, index
            )));
        }
        Ok(self
            .images
            .read()
            .unwrap()
            .get(&(container.query.clone(), index))
            .cloned()
            .unwrap_or_default())
    }

    async fn click(&self, locator: &Locator) -> Result<bool> {
        self.clicks.lock().unwrap().push(locator.query.clone());
        Ok(self.clickable.read().unwrap().contains(&locator.query))
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn content_extent(&self) -> Result<i64> {
        let extents = self.extents.read().unwrap();
        if extents.is_empty() {
            return Ok(0);
        }
        let mut cursor = self.extent_cursor.lock().unwrap();
        let value = extents[(*cursor).min(extents.len() - 1)];
        *cursor += 1;
        Ok(value)
    }
}

#[async_trait]
impl PageSession for FakeDriver {
    async fn close(&mut self) -> Result<()> {
        *self.close_calls.lock().unwrap() += 1;
        Ok(())
    }
}

/// A downloader that writes canned bytes instead of hitting the network.
#[derive(Default)]
pub struct FakeFetcher {
    failing_urls: RwLock<HashSet<String>>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_url(self, url: impl Into<String>) -> Self {
        self.failing_urls.write().unwrap().insert(url.into());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> bool {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing_urls.read().unwrap().contains(url) {
            return false;
        }
        persist_bytes(destination, url.as_bytes()).is_ok()
    }
}
