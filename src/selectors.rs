//! Site-specific locator cascades and URL shapes.
//!
//! Everything brittle lives here: the scraping engine only sees ordered
//! `Locator` lists, so layout drift is absorbed by appending fallbacks rather
//! than touching the state machine.

use crate::models::Locator;

/// Placeholder identity used when every display-name locator misses.
pub const PLACEHOLDER_IDENTITY: &str = "unknown_user";

#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Visited before cookie injection so the cookie store accepts the domain.
    pub base_url: String,
    /// Authenticated landing page; a redirect away from it means the session
    /// credential is invalid.
    pub landing_url: String,
    /// Substring of the current URL that indicates a bounce to the login page.
    pub login_marker: String,
    pub cookie_name: String,
    pub cookie_domain: String,

    pub display_name: Vec<Locator>,
    pub avatar: Vec<Locator>,
    /// Navigation controls that open the posts/activity view. Optional: when
    /// the whole cascade misses we fall back to scrolling the current page.
    pub posts_nav: Vec<Locator>,
    /// "Show more" style control clicked once before scroll expansion.
    pub expand_trigger: Option<Locator>,
    /// Repeated post container elements, tried in order.
    pub post_containers: Vec<Locator>,
    /// Post body text, resolved within one container.
    pub post_text: Vec<Locator>,

    /// Image URLs must contain this host substring to qualify as content.
    pub trusted_host: String,
    /// Qualifying URLs matching any of these substrings are still rejected
    /// (logos, avatars, sprite sheets).
    pub excluded_url_patterns: Vec<String>,
    /// Post text shorter than this is treated as a cascade miss.
    pub min_text_len: usize,
}

impl SiteProfile {
    pub fn linkedin() -> Self {
        Self {
            base_url: "https://www.linkedin.com".to_string(),
            landing_url: "https://www.linkedin.com/feed/".to_string(),
            login_marker: "login".to_string(),
            cookie_name: "li_at".to_string(),
            cookie_domain: ".linkedin.com".to_string(),

            display_name: vec![
                Locator::css("h1.text-heading-xlarge"),
                Locator::xpath("//main//section[1]//h1"),
                Locator::css("main h1"),
            ],
            avatar: vec![
                Locator::css_attr("img.pv-top-card-profile-picture__image", "src"),
                Locator::css_attr("img.pv-top-card-profile-picture__image--show", "src"),
                Locator::css_attr("img.profile-photo-edit__preview", "src"),
            ],
            posts_nav: vec![
                Locator::xpath("//a[contains(@href, 'recent-activity')]"),
                Locator::xpath("//span[normalize-space()='Show all posts']/ancestor::a"),
                Locator::xpath("//span[normalize-space()='Images']/ancestor::button"),
            ],
            expand_trigger: Some(Locator::xpath(
                "//a[.//span[normalize-space()='Show all images']]",
            )),
            post_containers: vec![
                Locator::css("li.profile-creator-shared-feed-update__container"),
                Locator::css("div.feed-shared-update-v2"),
                Locator::css("ul.display-flex.flex-wrap.list-style-none li"),
            ],
            post_text: vec![
                Locator::css("div.update-components-text span.break-words"),
                Locator::css("span.break-words"),
                Locator::xpath(".//div[contains(@class, 'update-components-text')]"),
            ],

            trusted_host: "media.licdn.com".to_string(),
            excluded_url_patterns: vec![
                "company-logo".to_string(),
                "profile-displayphoto".to_string(),
                "ghost-person".to_string(),
            ],
            min_text_len: 5,
        }
    }

    /// Canonical profile URL for a handle; spaces become dashes, as the site
    /// does for vanity URLs.
    pub fn profile_url(&self, handle: &str) -> String {
        let slug = handle.trim().to_lowercase().replace(' ', "-");
        format!("{}/in/{}/", self.base_url, slug)
    }

    /// Trusted-host filter with exclusion patterns. Order-preserving, exact
    /// string dedup within the input.
    pub fn filter_image_urls(&self, urls: &[String]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        urls.iter()
            .filter(|url| url.contains(&self.trusted_host))
            .filter(|url| {
                !self
                    .excluded_url_patterns
                    .iter()
                    .any(|pattern| url.contains(pattern))
            })
            .filter(|url| seen.insert((*url).clone()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_url_slugging() {
        let site = SiteProfile::linkedin();
        assert_eq!(
            site.profile_url("Jane Doe"),
            "https://www.linkedin.com/in/jane-doe/"
        );
    }

    #[test]
    fn test_image_filter_rejects_untrusted_host() {
        let site = SiteProfile::linkedin();
        let urls = vec![
            "https://media.licdn.com/dms/image/abc.jpg".to_string(),
            "https://cdn.evil.example/abc.jpg".to_string(),
        ];
        assert_eq!(site.filter_image_urls(&urls).len(), 1);
    }

    #[test]
    fn test_image_filter_excluded_pattern_beats_trusted_host() {
        let site = SiteProfile::linkedin();
        let urls = vec!["https://media.licdn.com/dms/image/company-logo_200.jpg".to_string()];
        assert!(site.filter_image_urls(&urls).is_empty());
    }

    #[test]
    fn test_image_filter_dedupes_exact_strings() {
        let site = SiteProfile::linkedin();
        let url = "https://media.licdn.com/dms/image/abc.jpg".to_string();
        let urls = vec![url.clone(), url.clone()];
        assert_eq!(site.filter_image_urls(&urls), vec![url]);
    }
}
