//! Chromium session over CDP.
//!
//! Launch, cookie injection, navigation, and teardown follow the lifecycle of
//! a single scrape: one browser, one page, exclusively owned, closed on every
//! exit path (`close` explicitly, `Drop` as the fallback).

use crate::browser::{PageDriver, PageSession};
use crate::config::BrowserConfig as BrowserSettings;
use crate::error::{AppError, Result};
use crate::models::{Locator, LocatorKind, ValueSource};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct BrowserSession {
    browser: Option<Browser>,
    page: Option<Page>,
    user_data_dir: Option<String>,
}

impl BrowserSession {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let user_data_dir = std::env::temp_dir()
            .join(format!("profilegrab-session-{}", timestamp))
            .to_string_lossy()
            .to_string();
        debug!(%user_data_dir, headless = settings.headless, "launching Chromium");

        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .user_data_dir(&user_data_dir)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", USER_AGENT));

        if settings.headless {
            builder = builder.arg("--headless").arg("--disable-gpu");
        } else {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let text = format!("{:?}", e);
                    // CDP sends events chromiumoxide cannot deserialize; those
                    // are noise, not faults.
                    if !text.contains("data did not match any variant") {
                        warn!("browser handler error: {}", e);
                    }
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::Browser(format!("Failed to create page: {}", e)))?;

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            user_data_dir: Some(user_data_dir),
        })
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| AppError::Browser("No page available".into()))
    }

    async fn eval_value<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let page = self.page()?;
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| AppError::Browser(format!("Script evaluation failed: {}", e)))?;
        result
            .into_value()
            .map_err(|e| AppError::Browser(format!("Script result mismatch: {}", e)))
    }

}

#[async_trait]
impl PageSession for BrowserSession {
    async fn close(&mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            browser
                .close()
                .await
                .map_err(|e| AppError::Browser(format!("Failed to close browser: {}", e)))?;
        }
        self.page = None;

        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                debug!(%dir, error = %e, "could not remove session profile dir");
            }
        }
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            let browser = self.browser.take();
            let user_data_dir = self.user_data_dir.take();
            tokio::spawn(async move {
                if let Some(mut browser) = browser {
                    let _ = browser.close().await;
                }
                if let Some(dir) = user_data_dir {
                    let _ = std::fs::remove_dir_all(&dir);
                }
            });
        }
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(%url, "navigating");
        let page = self.page()?;
        page.goto(url)
            .await
            .map_err(|e| AppError::Browser(format!("Failed to navigate: {}", e)))?;

        // Best effort; heavy pages routinely overrun the navigation event.
        match tokio::time::timeout(Duration::from_secs(10), page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!(error = %e, "navigation wait error, continuing"),
            Err(_) => debug!("navigation wait timed out, continuing"),
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let page = self.page()?;
        let url = page
            .url()
            .await
            .map_err(|e| AppError::Browser(format!("Failed to read URL: {}", e)))?;
        Ok(url.unwrap_or_default())
    }

    async fn set_session_cookie(&self, name: &str, value: &str, domain: &str) -> Result<()> {
        let page = self.page()?;
        let cookie = CookieParam::builder()
            .name(name)
            .value(value)
            .domain(domain)
            .path("/")
            .secure(true)
            .http_only(true)
            .build()
            .map_err(|e| AppError::Browser(format!("Invalid cookie: {}", e)))?;
        page.set_cookie(cookie)
            .await
            .map_err(|e| AppError::Browser(format!("Failed to set cookie: {}", e)))?;
        Ok(())
    }

    async fn lookup(&self, locator: &Locator) -> Result<Option<String>> {
        let script = format!(
            "(function() {{ const els = {}; if (els.length === 0) return null; \
             const el = els[0]; return {}; }})()",
            js_match_all(locator),
            js_read_value(&locator.value),
        );
        self.eval_value(&script).await
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let script = format!("(function() {{ return {}.length; }})()", js_match_all(locator));
        self.eval_value(&script).await
    }

    async fn lookup_within(
        &self,
        container: &Locator,
        index: usize,
        nested: &Locator,
    ) -> Result<Option<String>> {
        let script = format!(
            "(function() {{ const root = {}[{}]; if (!root) return null; \
             const els = {}; if (els.length === 0) return null; \
             const el = els[0]; return {}; }})()",
            js_match_all(container),
            index,
            js_match_all_scoped(nested),
            js_read_value(&nested.value),
        );
        self.eval_value(&script).await
    }

    async fn image_urls_within(&self, container: &Locator, index: usize) -> Result<Vec<String>> {
        let script = format!(
            "(function() {{ const root = {}[{}]; if (!root) return []; \
             return Array.from(root.querySelectorAll('img')) \
                 .map(img => img.getAttribute('src')) \
                 .filter(src => !!src); }})()",
            js_match_all(container),
            index,
        );
        self.eval_value(&script).await
    }

    async fn click(&self, locator: &Locator) -> Result<bool> {
        let script = format!(
            "(function() {{ const els = {}; if (els.length === 0) return false; \
             els[0].scrollIntoView({{ block: 'center' }}); els[0].click(); \
             return true; }})()",
            js_match_all(locator),
        );
        self.eval_value(&script).await
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let _: i64 = self
            .eval_value(
                "(function() { window.scrollTo(0, document.body.scrollHeight); \
                 return document.body.scrollHeight; })()",
            )
            .await?;
        Ok(())
    }

    async fn content_extent(&self) -> Result<i64> {
        self.eval_value("document.body.scrollHeight").await
    }
}

/// JS expression evaluating to an array of elements matching the locator
/// against the whole document.
fn js_match_all(locator: &Locator) -> String {
    let query = js_str(&locator.query);
    match locator.kind {
        LocatorKind::Css => format!("Array.from(document.querySelectorAll({}))", query),
        LocatorKind::XPath => format!(
            "(function() {{ const out = []; const it = document.evaluate({}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
             for (let i = 0; i < it.snapshotLength; i++) out.push(it.snapshotItem(i)); \
             return out; }})()",
            query
        ),
    }
}

/// Same as [`js_match_all`] but relative to a `root` element in scope.
/// XPath queries are expected in relative form (`.//...`).
fn js_match_all_scoped(locator: &Locator) -> String {
    let query = js_str(&locator.query);
    match locator.kind {
        LocatorKind::Css => format!("Array.from(root.querySelectorAll({}))", query),
        LocatorKind::XPath => format!(
            "(function() {{ const out = []; const it = document.evaluate({}, root, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
             for (let i = 0; i < it.snapshotLength; i++) out.push(it.snapshotItem(i)); \
             return out; }})()",
            query
        ),
    }
}

/// JS expression reading the requested value off `el`.
fn js_read_value(value: &ValueSource) -> String {
    match value {
        ValueSource::Text => "(el.textContent || '').trim()".to_string(),
        ValueSource::Attribute(attr) => format!("el.getAttribute({})", js_str(attr)),
    }
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str("a'b\"c"), r#""a'b\"c""#);
    }

    #[test]
    fn test_css_locator_script_shape() {
        let locator = Locator::css("h1.text-heading-xlarge");
        let script = js_match_all(&locator);
        assert!(script.contains("querySelectorAll"));
        assert!(script.contains("h1.text-heading-xlarge"));
    }

    #[test]
    fn test_xpath_locator_script_shape() {
        let locator = Locator::xpath("//span[text()='Images']/ancestor::button");
        let script = js_match_all(&locator);
        assert!(script.contains("document.evaluate"));
        assert!(script.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
    }

    #[test]
    fn test_attribute_read_expression() {
        let expr = js_read_value(&ValueSource::Attribute("src".to_string()));
        assert_eq!(expr, "el.getAttribute(\"src\")");
    }
}
