//! Mirror discovery through the Apache `closer.lua` redirector.
//!
//! The redirector nominates one mirror per request. A nominated mirror may
//! list no release directories at all (stale or partial mirrors are common),
//! so [`MirrorResolver::resolve`] keeps asking for fresh suggestions until a
//! mirror yields a non-empty catalog. Fetch failures are never retried.

use log::{debug, info, warn};
use std::num::NonZeroU32;

use crate::catalog::VersionCatalog;
use crate::listing::{FetchError, PageFetcher, SelectionRule, fetch_anchor_texts, validate_url};

/// Errors arising from mirror resolution.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The redirector or a mirror listing could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The redirector page did not contain a mirror URL where expected.
    #[error("no mirror URL at \"{rule}\" in {redirector_url}")]
    Parse {
        /// The redirector page that was inspected.
        redirector_url: String,
        /// The selection rule that found nothing usable.
        rule: String,
    },

    /// Every permitted suggestion listed no versions.
    #[error("no mirror with available versions after {attempts} attempt(s)")]
    Exhausted {
        /// Number of suggestions tried.
        attempts: u32,
    },
}

/// A mirror that listed at least one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMirror {
    /// Base URL of the mirror's release tree.
    pub base_url: String,
    /// Versions listed at the mirror, never empty.
    pub catalog: VersionCatalog,
}

/// Resolves a usable mirror by consulting the redirector.
///
/// # Examples
///
/// ```no_run
/// use solr_installer::listing::{HttpFetcher, SelectionRule};
/// use solr_installer::mirror::MirrorResolver;
///
/// let fetcher = HttpFetcher::default();
/// let link = SelectionRule::parse("body > div:nth-child(3) > p:nth-child(3) > a > strong")?;
/// let listing = SelectionRule::parse("body > pre:nth-child(2) > a")?;
/// let resolver = MirrorResolver::new(
///     &fetcher,
///     "https://www.apache.org/dyn/closer.lua/lucene/solr/",
///     &link,
///     &listing,
/// );
/// let mirror = resolver.resolve()?;
/// println!("{} lists {} versions", mirror.base_url, mirror.catalog.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MirrorResolver<'a> {
    fetcher: &'a dyn PageFetcher,
    redirector_url: &'a str,
    link_rule: &'a SelectionRule,
    listing_rule: &'a SelectionRule,
    max_attempts: Option<NonZeroU32>,
}

impl<'a> MirrorResolver<'a> {
    /// Create an unbounded resolver.
    #[must_use]
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        redirector_url: &'a str,
        link_rule: &'a SelectionRule,
        listing_rule: &'a SelectionRule,
    ) -> Self {
        Self {
            fetcher,
            redirector_url,
            link_rule,
            listing_rule,
            max_attempts: None,
        }
    }

    /// Cap the number of suggestions requested. `None` keeps the loop
    /// unbounded.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<NonZeroU32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Ask the redirector for one mirror base URL.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Fetch`] if the redirector cannot be fetched and
    /// [`MirrorError::Parse`] if its page has no absolute URL at the
    /// configured location.
    pub fn suggest(&self) -> Result<String, MirrorError> {
        let page = self.fetcher.fetch_page(self.redirector_url)?;
        let candidate = self
            .link_rule
            .select_first_text(&page)
            .filter(|text| validate_url(text).is_ok())
            .ok_or_else(|| MirrorError::Parse {
                redirector_url: self.redirector_url.to_owned(),
                rule: self.link_rule.as_str().to_owned(),
            })?;
        debug!("redirector suggested {candidate}");
        Ok(candidate)
    }

    /// Read the version catalog at a mirror.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Fetch`] if the listing cannot be fetched.
    pub fn catalog_at(&self, mirror_url: &str) -> Result<VersionCatalog, MirrorError> {
        let anchors = fetch_anchor_texts(self.fetcher, mirror_url, self.listing_rule)?;
        Ok(VersionCatalog::from_entries(mirror_url, anchors))
    }

    /// Keep requesting suggestions until a mirror lists at least one
    /// version.
    ///
    /// # Errors
    ///
    /// Fetch and parse failures end resolution immediately. When a bound is
    /// set, [`MirrorError::Exhausted`] is returned once it is reached.
    pub fn resolve(&self) -> Result<ResolvedMirror, MirrorError> {
        let mut attempts: u32 = 0;
        loop {
            if self.max_attempts.is_some_and(|max| attempts >= max.get()) {
                return Err(MirrorError::Exhausted { attempts });
            }
            attempts = attempts.saturating_add(1);

            let base_url = self.suggest()?;
            let catalog = self.catalog_at(&base_url)?;
            if catalog.is_empty() {
                warn!("mirror {base_url} lists no versions; requesting another");
                continue;
            }

            info!(
                "using mirror {base_url} ({} version(s), attempt {attempts})",
                catalog.len()
            );
            return Ok(ResolvedMirror { base_url, catalog });
        }
    }
}
