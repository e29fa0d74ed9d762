pub mod artifacts;
pub mod browser;
pub mod config;
pub mod download;
pub mod error;
pub mod models;
pub mod scrape;
pub mod selectors;
pub mod testing;

use browser::{BrowserSession, PageSession};
use download::{MediaDownloader, MediaFetcher};
use scrape::ProfileScrapeOrchestrator;
use selectors::SiteProfile;
use tracing::warn;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::{ScrapeOutcome, ScrapeReport};

/// Run one full profile scrape with a scoped browser session. The session is
/// closed on every exit path, including aborts and errors.
pub async fn run_scrape(config: Config) -> Result<ScrapeReport> {
    config
        .validate()
        .map_err(|errors| AppError::Configuration(errors.join("; ")))?;

    let downloader = MediaDownloader::new(config.download_timeout())?;
    let mut session = BrowserSession::launch(&config.browser).await?;
    run_with_session(&mut session, &downloader, SiteProfile::linkedin(), config).await
}

/// Drive one scrape over an already-acquired session and release it whatever
/// the outcome: success, abort, or orchestrator error.
pub async fn run_with_session<S, F>(
    session: &mut S,
    fetcher: &F,
    site: SiteProfile,
    config: Config,
) -> Result<ScrapeReport>
where
    S: PageSession,
    F: MediaFetcher,
{
    let result = {
        let orchestrator = ProfileScrapeOrchestrator::new(&*session, fetcher, site, config);
        orchestrator.run().await
    };

    if let Err(e) = session.close().await {
        warn!("browser shutdown failed: {}", e);
    }
    result
}
