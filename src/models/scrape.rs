use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How to find one element or attribute value in a rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub kind: LocatorKind,
    pub query: String,
    pub value: ValueSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorKind {
    Css,
    XPath,
}

/// What to read off a matched element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
    Text,
    Attribute(String),
}

impl Locator {
    pub fn css(query: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Css,
            query: query.into(),
            value: ValueSource::Text,
        }
    }

    pub fn css_attr(query: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Css,
            query: query.into(),
            value: ValueSource::Attribute(attr.into()),
        }
    }

    pub fn xpath(query: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::XPath,
            query: query.into(),
            value: ValueSource::Text,
        }
    }

    pub fn xpath_attr(query: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::XPath,
            query: query.into(),
            value: ValueSource::Attribute(attr.into()),
        }
    }
}

/// Outcome of running a cascade. Never partially populated: a hit carries both
/// the value and the index of the locator that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Found { value: String, locator_index: usize },
    NotFound,
}

impl ExtractionResult {
    pub fn into_value(self) -> Option<String> {
        match self {
            ExtractionResult::Found { value, .. } => Some(value),
            ExtractionResult::NotFound => None,
        }
    }
}

/// One enumerated post. `text: None` means the text cascade missed, which is
/// distinct from an empty extracted string. Posts carry no cross-run identity,
/// only their ordinal within this scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub ordinal: usize,
    pub text: Option<String>,
    pub image_urls: Vec<String>,
}

/// Final state of a lazy-load expansion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProgress {
    /// Last measured page extent (scroll height in CSS pixels).
    pub extent: i64,
    /// Scroll iterations performed.
    pub attempts: u32,
    /// Whether the extent held steady across two consecutive polls, as opposed
    /// to the attempt cap being hit on a still-growing feed.
    pub stabilized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrapePhase {
    Authenticating,
    ResolvingIdentity,
    ResolvingAvatar,
    ExpandingContent,
    EnumeratingPosts,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrapeOutcome {
    Completed,
    Partial { posts_skipped: usize },
    Aborted,
}

/// End-of-run summary handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub identity: String,
    pub profile_url: String,
    pub outcome: ScrapeOutcome,
    pub phase: ScrapePhase,
    pub avatar_saved: bool,
    pub posts_saved: usize,
    pub posts_skipped: usize,
    pub images_saved: usize,
    pub load: Option<LoadProgress>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScrapeReport {
    pub fn summary(&self) -> String {
        match &self.outcome {
            ScrapeOutcome::Completed => format!(
                "fully succeeded: {} posts, {} images, avatar {}",
                self.posts_saved,
                self.images_saved,
                if self.avatar_saved { "saved" } else { "missing" },
            ),
            ScrapeOutcome::Partial { posts_skipped } => format!(
                "partially succeeded: {} posts saved, {} skipped, {} images",
                self.posts_saved, posts_skipped, self.images_saved,
            ),
            ScrapeOutcome::Aborted => "aborted before any content".to_string(),
        }
    }
}
