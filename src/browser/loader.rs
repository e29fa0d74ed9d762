//! Scroll-driven lazy-load expansion with a stabilization check.
//!
//! Replaces the source scripts' fixed sleeps: after each scroll we wait one
//! poll interval and re-measure the page extent. An unchanged extent means the
//! feed has stopped producing content; the attempt cap bounds runaway scraping
//! of infinite feeds either way.

use crate::browser::PageDriver;
use crate::error::Result;
use crate::models::{LoadProgress, Locator};
use std::time::Duration;
use tracing::debug;

pub struct IncrementalPageLoader {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl IncrementalPageLoader {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }

    /// Expand lazy-loaded content. `trigger` is clicked at most once before
    /// scrolling begins; a missing trigger is not an error. Terminates within
    /// `max_attempts * poll_interval` regardless of whether the page ever
    /// stabilizes.
    pub async fn expand<D>(&self, driver: &D, trigger: Option<&Locator>) -> Result<LoadProgress>
    where
        D: PageDriver + ?Sized,
    {
        if let Some(locator) = trigger {
            match driver.click(locator).await {
                Ok(true) => {
                    debug!(query = %locator.query, "expansion trigger clicked");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Ok(false) => debug!(query = %locator.query, "expansion trigger absent"),
                Err(e) => debug!(query = %locator.query, error = %e, "expansion trigger failed"),
            }
        }

        let mut extent = driver.content_extent().await?;
        let mut attempts = 0;
        let mut stabilized = false;

        while attempts < self.max_attempts {
            attempts += 1;
            driver.scroll_to_bottom().await?;
            tokio::time::sleep(self.poll_interval).await;

            let measured = driver.content_extent().await?;
            if measured == extent {
                stabilized = true;
                break;
            }
            extent = measured;
        }

        debug!(extent, attempts, stabilized, "expansion finished");
        Ok(LoadProgress {
            extent,
            attempts,
            stabilized,
        })
    }
}
