//! Profile scrape orchestration.
//!
//! A linear state machine over one exclusively-owned browser session:
//! Authenticating → ResolvingIdentity → ResolvingAvatar → ExpandingContent →
//! EnumeratingPosts → Done, with Aborted reachable from Authenticating only.
//! Everything past authentication degrades instead of failing: a missed
//! cascade becomes a placeholder or a skip, a failed download an absent file,
//! a broken post a logged gap in the enumeration.

use crate::artifacts::ArtifactStore;
use crate::browser::{resolve, resolve_within, validators, IncrementalPageLoader, PageDriver};
use crate::config::Config;
use crate::download::MediaFetcher;
use crate::error::{AppError, Result};
use crate::models::{
    ExtractionResult, LoadProgress, Locator, Post, ScrapeOutcome, ScrapePhase, ScrapeReport,
};
use crate::selectors::{SiteProfile, PLACEHOLDER_IDENTITY};
use chrono::Utc;
use tracing::{debug, info, warn};

pub struct ProfileScrapeOrchestrator<'a, D, F> {
    driver: &'a D,
    fetcher: &'a F,
    site: SiteProfile,
    config: Config,
}

impl<'a, D, F> ProfileScrapeOrchestrator<'a, D, F>
where
    D: PageDriver,
    F: MediaFetcher,
{
    pub fn new(driver: &'a D, fetcher: &'a F, site: SiteProfile, config: Config) -> Self {
        Self {
            driver,
            fetcher,
            site,
            config,
        }
    }

    pub async fn run(&self) -> Result<ScrapeReport> {
        let started_at = Utc::now();
        let profile_url = self.site.profile_url(&self.config.session.target);

        info!(target_profile = %self.config.session.target, "phase: authenticating");
        if let Err(e) = self.authenticate().await {
            return match e {
                AppError::Authentication(msg) => {
                    warn!("scrape aborted: {}", msg);
                    Ok(ScrapeReport {
                        identity: self.config.session.target.clone(),
                        profile_url,
                        outcome: ScrapeOutcome::Aborted,
                        phase: ScrapePhase::Aborted,
                        avatar_saved: false,
                        posts_saved: 0,
                        posts_skipped: 0,
                        images_saved: 0,
                        load: None,
                        started_at,
                        finished_at: Utc::now(),
                    })
                }
                other => Err(other),
            };
        }

        info!("phase: resolving identity");
        self.driver.navigate(&profile_url).await?;
        let identity =
            match resolve(self.driver, &self.site.display_name, validators::non_empty).await? {
                ExtractionResult::Found {
                    value,
                    locator_index,
                } => {
                    info!(name = %value, locator_index, "display name resolved");
                    value
                }
                ExtractionResult::NotFound => {
                    warn!("display name cascade exhausted, using placeholder");
                    PLACEHOLDER_IDENTITY.to_string()
                }
            };

        let store = ArtifactStore::create(&self.config.scrape.output_root, &identity)?;
        store.write_profile_summary(&identity, &profile_url)?;

        info!("phase: resolving avatar");
        let avatar_saved =
            match resolve(self.driver, &self.site.avatar, validators::absolute_url).await? {
                ExtractionResult::Found { value, .. } => {
                    self.fetcher.fetch(&value, &store.avatar_path()).await
                }
                ExtractionResult::NotFound => {
                    info!("avatar not found, skipping");
                    false
                }
            };

        info!("phase: expanding content");
        let load = self.expand_content().await;

        info!("phase: enumerating posts");
        let (posts_saved, posts_skipped, images_saved) = self.enumerate_posts(&store).await;

        let outcome = if posts_skipped > 0 {
            ScrapeOutcome::Partial { posts_skipped }
        } else {
            ScrapeOutcome::Completed
        };

        let report = ScrapeReport {
            identity,
            profile_url,
            outcome,
            phase: ScrapePhase::Done,
            avatar_saved,
            posts_saved,
            posts_skipped,
            images_saved,
            load,
            started_at,
            finished_at: Utc::now(),
        };
        info!("scrape {}", report.summary());
        Ok(report)
    }

    /// Inject the session cookie and verify it sticks. The only fatal check in
    /// the whole pipeline: a bounce to the login page means the credential is
    /// invalid or expired.
    async fn authenticate(&self) -> Result<()> {
        self.driver.navigate(&self.site.base_url).await?;
        self.driver
            .set_session_cookie(
                &self.site.cookie_name,
                &self.config.session.cookie,
                &self.site.cookie_domain,
            )
            .await?;
        self.driver.navigate(&self.site.landing_url).await?;

        let url = self.driver.current_url().await?;
        if url.contains(&self.site.login_marker) {
            return Err(AppError::Authentication(
                "session cookie rejected; redirected to login page".to_string(),
            ));
        }
        Ok(())
    }

    /// Activate the posts view if a navigation control exists, then expand
    /// lazy-loaded content until it stabilizes. Failures here are non-fatal:
    /// enumeration proceeds over whatever the page currently shows.
    async fn expand_content(&self) -> Option<LoadProgress> {
        let mut nav_activated = false;
        for locator in &self.site.posts_nav {
            match self.driver.click(locator).await {
                Ok(true) => {
                    debug!(query = %locator.query, "posts navigation activated");
                    nav_activated = true;
                    break;
                }
                Ok(false) => {}
                Err(e) => debug!(query = %locator.query, error = %e, "navigation click failed"),
            }
        }
        if nav_activated {
            tokio::time::sleep(self.config.poll_interval()).await;
        } else {
            info!("posts navigation not found; expanding current page");
        }

        let loader = IncrementalPageLoader::new(
            self.config.scrape.max_scroll_attempts,
            self.config.poll_interval(),
        );
        match loader
            .expand(self.driver, self.site.expand_trigger.as_ref())
            .await
        {
            Ok(progress) => Some(progress),
            Err(e) => {
                warn!("content expansion failed: {}", e);
                None
            }
        }
    }

    async fn enumerate_posts(&self, store: &ArtifactStore) -> (usize, usize, usize) {
        let Some((container, found)) = self.locate_post_containers().await else {
            info!("no post containers found");
            return (0, 0, 0);
        };

        let limit = found.min(self.config.scrape.max_posts);
        if found > limit {
            info!(found, limit, "capping enumerated posts");
        }

        let mut posts_saved = 0;
        let mut posts_skipped = 0;
        let mut images_saved = 0;
        for index in 0..limit {
            let ordinal = index + 1;
            match self.scrape_post(store, container, index, ordinal).await {
                Ok(saved) => {
                    posts_saved += 1;
                    images_saved += saved;
                }
                Err(e) => {
                    warn!(ordinal, error = %e, "post skipped");
                    posts_skipped += 1;
                }
            }
        }
        (posts_saved, posts_skipped, images_saved)
    }

    /// Container cascade: the first locator matching at least one element
    /// decides the shape of the whole enumeration.
    async fn locate_post_containers(&self) -> Option<(&Locator, usize)> {
        for locator in &self.site.post_containers {
            match self.driver.count(locator).await {
                Ok(n) if n > 0 => {
                    debug!(query = %locator.query, count = n, "post containers located");
                    return Some((locator, n));
                }
                Ok(_) => {}
                Err(e) => debug!(query = %locator.query, error = %e, "container count failed"),
            }
        }
        None
    }

    /// One post, in isolation. A text miss is not a failure; only driver or
    /// storage faults bubble up, and the caller converts those to a skip.
    async fn scrape_post(
        &self,
        store: &ArtifactStore,
        container: &Locator,
        index: usize,
        ordinal: usize,
    ) -> Result<usize> {
        let text = resolve_within(
            self.driver,
            container,
            index,
            &self.site.post_text,
            validators::min_len(self.site.min_text_len),
        )
        .await?
        .into_value();

        let raw_urls = self.driver.image_urls_within(container, index).await?;
        let post = Post {
            ordinal,
            text,
            image_urls: self.site.filter_image_urls(&raw_urls),
        };

        match &post.text {
            Some(value) => store.write_post_text(post.ordinal, value)?,
            None => debug!(ordinal, "post text cascade exhausted"),
        }

        let mut saved = 0;
        for (position, url) in post.image_urls.iter().enumerate() {
            let destination = store.image_path(post.ordinal, position + 1);
            if self.fetcher.fetch(url, &destination).await {
                saved += 1;
            }
        }
        Ok(saved)
    }
}
