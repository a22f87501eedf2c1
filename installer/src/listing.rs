//! Listing page retrieval and anchor selection.
//!
//! Mirrors and the canonical archive publish plain HTML directory listings.
//! A [`SelectionRule`] names the anchors that represent candidate entries,
//! and [`fetch_anchor_texts`] returns their inner HTML in document order.
//! Page retrieval sits behind [`PageFetcher`] so callers can substitute a
//! stub in tests.

use log::debug;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Errors arising from listing retrieval and selection.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The URL is not a syntactically valid absolute URL.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The request failed or the server returned an error status.
    #[error("failed to fetch {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The page does not exist (HTTP 404).
    #[error("page not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// A configured selection rule is not a valid CSS selector.
    #[error("invalid selection rule \"{rule}\": {reason}")]
    InvalidSelector {
        /// The rejected selector text.
        rule: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// Network settings for [`HttpFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    /// Maximum time to establish a connection.
    pub connect: Duration,
    /// Maximum time for a whole listing request, body included.
    pub listing: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            listing: Duration::from_secs(60),
        }
    }
}

/// A validated CSS selector identifying entries in a listing page.
///
/// The selector text is kept alongside the compiled form so errors and logs
/// can name the rule that was applied.
///
/// # Examples
///
/// ```
/// use solr_installer::listing::SelectionRule;
///
/// let rule = SelectionRule::parse("body > pre > a").expect("valid selector");
/// let anchors = rule.select_inner_html(
///     "<html><body><pre><a href=\"../\">../</a><a href=\"8.5.1/\">8.5.1/</a></pre></body></html>",
/// );
/// assert_eq!(anchors, ["../", "8.5.1/"]);
/// ```
#[derive(Debug, Clone)]
pub struct SelectionRule {
    text: String,
    selector: Selector,
}

impl SelectionRule {
    /// Compile a selection rule.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidSelector`] when the text is not a valid
    /// CSS selector.
    pub fn parse(text: &str) -> Result<Self, FetchError> {
        let selector = Selector::parse(text).map_err(|e| FetchError::InvalidSelector {
            rule: text.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            text: text.to_owned(),
            selector,
        })
    }

    /// The selector text as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Inner HTML of every matching element, in document order.
    #[must_use]
    pub fn select_inner_html(&self, document: &str) -> Vec<String> {
        Html::parse_document(document)
            .select(&self.selector)
            .map(|element| element.inner_html())
            .collect()
    }

    /// Text content of the first matching element, trimmed.
    #[must_use]
    pub fn select_first_text(&self, document: &str) -> Option<String> {
        Html::parse_document(document)
            .select(&self.selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_owned())
    }
}

/// Trait for retrieving listing documents, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait PageFetcher {
    /// Retrieve the document at `url` as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server responds with a
    /// non-success status.
    fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the given timeouts.
    #[must_use]
    pub fn new(timeouts: FetchTimeouts) -> Self {
        Self {
            agent: http_agent(timeouts.connect, Some(timeouts.listing)),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchTimeouts::default())
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        validate_url(url)?;
        debug!("fetching listing {url}");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Http {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Fetch `url` and return the inner HTML of anchors matched by `rule`.
///
/// # Errors
///
/// Propagates any [`FetchError`] from the fetcher.
pub fn fetch_anchor_texts(
    fetcher: &dyn PageFetcher,
    url: &str,
    rule: &SelectionRule,
) -> Result<Vec<String>, FetchError> {
    let document = fetcher.fetch_page(url)?;
    let anchors = rule.select_inner_html(&document);
    debug!(
        "{} anchor(s) matched \"{}\" at {url}",
        anchors.len(),
        rule.as_str()
    );
    Ok(anchors)
}

/// Check that `url` is an absolute URL.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] for relative or malformed input.
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Build a `ureq` agent with a connect timeout and an optional whole-request
/// timeout. Artefact downloads pass `None` so large archives are not cut off.
pub(crate) fn http_agent(connect: Duration, global: Option<Duration>) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(connect))
        .timeout_global(global)
        .build();
    ureq::Agent::new_with_config(config)
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use rstest::rstest;

    const ARCHIVE_PAGE: &str = concat!(
        "<html><head><title>Index of /dist/lucene/solr</title></head><body>",
        "<h1>Index of /dist/lucene/solr</h1>",
        "<pre><img src=\"/icons/blank.gif\"> Name</pre>",
        "<hr>",
        "<pre>",
        "<a href=\"/dist/lucene/\">Parent Directory</a>\n",
        "<a href=\"8.5.0/\">8.5.0/</a>\n",
        "<a href=\"8.5.1/\">8.5.1/</a>\n",
        "<a href=\"KEYS\">KEYS</a>\n",
        "</pre>",
        "</body></html>",
    );

    #[test]
    fn selects_anchors_in_document_order() {
        let rule = SelectionRule::parse("body > pre:nth-child(4) > a").expect("rule");
        let anchors = rule.select_inner_html(ARCHIVE_PAGE);
        assert_eq!(anchors, ["Parent Directory", "8.5.0/", "8.5.1/", "KEYS"]);
    }

    #[test]
    fn unmatched_rule_selects_nothing() {
        let rule = SelectionRule::parse("body > table a").expect("rule");
        assert!(rule.select_inner_html(ARCHIVE_PAGE).is_empty());
    }

    #[test]
    fn first_text_is_trimmed() {
        let rule = SelectionRule::parse("p > a > strong").expect("rule");
        let html = "<p><a href=\"#\"><strong>\n  https://m.example/solr/ \n</strong></a></p>";
        assert_eq!(
            rule.select_first_text(html).as_deref(),
            Some("https://m.example/solr/")
        );
    }

    #[rstest]
    #[case::unbalanced("body > pre:nth-child(")]
    fn rejects_invalid_selectors(#[case] text: &str) {
        let err = SelectionRule::parse(text).expect_err("should reject");
        assert!(matches!(err, FetchError::InvalidSelector { .. }));
    }

    #[rstest]
    #[case::relative("solr/8.5.1/")]
    #[case::garbage("not a url")]
    fn rejects_relative_urls(#[case] url: &str) {
        assert!(matches!(
            validate_url(url),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn fetch_anchor_texts_uses_fetcher() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_page()
            .with(eq("https://archive.example/solr/"))
            .times(1)
            .returning(|_| Ok(ARCHIVE_PAGE.to_owned()));
        let rule = SelectionRule::parse("pre > a").expect("rule");

        let anchors =
            fetch_anchor_texts(&fetcher, "https://archive.example/solr/", &rule).expect("fetch");
        assert_eq!(anchors.len(), 4);
    }

    #[test]
    fn fetch_anchor_texts_propagates_errors() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch_page().returning(|url| {
            Err(FetchError::NotFound {
                url: url.to_owned(),
            })
        });
        let rule = SelectionRule::parse("pre > a").expect("rule");

        let err = fetch_anchor_texts(&fetcher, "https://archive.example/gone/", &rule)
            .expect_err("should fail");
        assert!(err.to_string().contains("https://archive.example/gone/"));
    }

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let mapped = map_ureq_error("https://example.test/", &ureq::Error::StatusCode(404));
        assert!(matches!(mapped, FetchError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let mapped = map_ureq_error("https://example.test/", &ureq::Error::StatusCode(503));
        assert!(matches!(mapped, FetchError::Http { .. }));
    }
}
