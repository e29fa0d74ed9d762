use profilegrab::{AppError, Config, ScrapeOutcome};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match profilegrab::run_scrape(Config::from_env()).await {
        Ok(report) => {
            info!(
                identity = %report.identity,
                profile_url = %report.profile_url,
                "{}",
                report.summary()
            );
            if report.outcome == ScrapeOutcome::Aborted {
                std::process::exit(1);
            }
        }
        Err(AppError::Configuration(msg)) => {
            error!("invalid configuration: {}", msg);
            std::process::exit(2);
        }
        Err(e) => {
            error!("scrape failed: {}", e);
            std::process::exit(1);
        }
    }
}
