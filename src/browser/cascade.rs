//! First-valid-match resolution over an ordered locator cascade.
//!
//! The one deliberate design idea carried over from the source scripts:
//! resilience to layout drift comes from racing several selector heuristics in
//! declaration order instead of committing to one. A failing lookup is a
//! non-match, never an error; only an empty cascade is a caller bug.

use crate::browser::PageDriver;
use crate::error::{AppError, Result};
use crate::models::{ExtractionResult, Locator};
use tracing::debug;

/// Resolve `cascade` against the whole document. Returns the value from the
/// first locator whose lookup yields a value accepted by `validate`.
pub async fn resolve<D>(
    driver: &D,
    cascade: &[Locator],
    validate: impl Fn(&str) -> bool,
) -> Result<ExtractionResult>
where
    D: PageDriver + ?Sized,
{
    if cascade.is_empty() {
        return Err(AppError::Configuration(
            "selector cascade must not be empty".to_string(),
        ));
    }

    for (locator_index, locator) in cascade.iter().enumerate() {
        match driver.lookup(locator).await {
            Ok(Some(value)) if validate(&value) => {
                return Ok(ExtractionResult::Found {
                    value,
                    locator_index,
                });
            }
            Ok(Some(value)) => {
                debug!(query = %locator.query, %value, "candidate rejected by validator");
            }
            Ok(None) => {}
            Err(e) => {
                // Lookup faults are non-matches; the next locator gets its turn.
                debug!(query = %locator.query, error = %e, "locator lookup failed");
            }
        }
    }

    Ok(ExtractionResult::NotFound)
}

/// Same contract as [`resolve`], scoped to the `index`-th element matching
/// `container`.
pub async fn resolve_within<D>(
    driver: &D,
    container: &Locator,
    index: usize,
    cascade: &[Locator],
    validate: impl Fn(&str) -> bool,
) -> Result<ExtractionResult>
where
    D: PageDriver + ?Sized,
{
    if cascade.is_empty() {
        return Err(AppError::Configuration(
            "selector cascade must not be empty".to_string(),
        ));
    }

    for (locator_index, locator) in cascade.iter().enumerate() {
        match driver.lookup_within(container, index, locator).await {
            Ok(Some(value)) if validate(&value) => {
                return Ok(ExtractionResult::Found {
                    value,
                    locator_index,
                });
            }
            Ok(_) => {}
            Err(e) => {
                debug!(query = %locator.query, error = %e, "scoped locator lookup failed");
            }
        }
    }

    Ok(ExtractionResult::NotFound)
}

pub mod validators {
    /// Non-empty after trimming.
    pub fn non_empty(value: &str) -> bool {
        !value.trim().is_empty()
    }

    /// Absolute http(s) URL, the validity check for avatar and media sources.
    pub fn absolute_url(value: &str) -> bool {
        url::Url::parse(value)
            .map(|u| u.scheme() == "http" || u.scheme() == "https")
            .unwrap_or(false)
    }

    /// Trimmed character count strictly above `min`.
    pub fn min_len(min: usize) -> impl Fn(&str) -> bool {
        move |value: &str| value.trim().chars().count() > min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    #[tokio::test]
    async fn test_first_valid_locator_wins() {
        let driver = FakeDriver::new()
            .with_value("h1.primary", "Jane Doe")
            .with_value("h1.secondary", "Other Name");

        let cascade = vec![
            Locator::css("h1.missing"),
            Locator::css("h1.primary"),
            Locator::css("h1.secondary"),
        ];

        let result = resolve(&driver, &cascade, validators::non_empty)
            .await
            .unwrap();
        assert_eq!(
            result,
            ExtractionResult::Found {
                value: "Jane Doe".to_string(),
                locator_index: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_value_falls_through_to_next_locator() {
        let driver = FakeDriver::new()
            .with_value("h1.primary", "   ")
            .with_value("h1.secondary", "Jane Doe");

        let cascade = vec![Locator::css("h1.primary"), Locator::css("h1.secondary")];

        let result = resolve(&driver, &cascade, validators::non_empty)
            .await
            .unwrap();
        assert_eq!(
            result,
            ExtractionResult::Found {
                value: "Jane Doe".to_string(),
                locator_index: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_lookup_error_is_a_non_match() {
        let driver = FakeDriver::new()
            .with_failing_query("h1.broken")
            .with_value("h1.fallback", "Jane Doe");

        let cascade = vec![Locator::css("h1.broken"), Locator::css("h1.fallback")];

        let result = resolve(&driver, &cascade, validators::non_empty)
            .await
            .unwrap();
        assert!(matches!(result, ExtractionResult::Found { .. }));
    }

    #[tokio::test]
    async fn test_exhausted_cascade_is_not_found() {
        let driver = FakeDriver::new();
        let cascade = vec![Locator::css("h1.a"), Locator::css("h1.b")];

        let result = resolve(&driver, &cascade, validators::non_empty)
            .await
            .unwrap();
        assert_eq!(result, ExtractionResult::NotFound);
    }

    #[tokio::test]
    async fn test_empty_cascade_is_a_configuration_error() {
        let driver = FakeDriver::new();
        let err = resolve(&driver, &[], validators::non_empty)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_scoped_resolution_reads_container_values() {
        let driver = FakeDriver::new().with_scoped_value("div.post", 1, "span.body", "second post");

        let cascade = vec![Locator::css("span.body")];
        let result = resolve_within(
            &driver,
            &Locator::css("div.post"),
            1,
            &cascade,
            validators::min_len(3),
        )
        .await
        .unwrap();

        assert_eq!(
            result,
            ExtractionResult::Found {
                value: "second post".to_string(),
                locator_index: 0,
            }
        );
    }

    #[test]
    fn test_min_len_counts_characters_not_bytes() {
        // "日本語" is three characters in nine bytes.
        assert!(validators::min_len(2)("日本語"));
        assert!(!validators::min_len(3)("日本語"));
        assert!(!validators::min_len(5)("  ab  "));
    }

    #[test]
    fn test_absolute_url_validator() {
        assert!(validators::absolute_url("https://media.licdn.com/a.jpg"));
        assert!(validators::absolute_url("http://example.com/a.jpg"));
        assert!(!validators::absolute_url("data:image/png;base64,AAAA"));
        assert!(!validators::absolute_url("/relative/path.jpg"));
        assert!(!validators::absolute_url("not a url"));
    }
}
