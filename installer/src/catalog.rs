//! Ordered version catalogs and target selection.
//!
//! A catalog keeps versions in the order their anchors appeared in the
//! listing page. That order is significant: `latest` means the final entry
//! in encounter order, which is not necessarily the numerically greatest
//! release.

use std::fmt;
use std::str::FromStr;

use crate::version::{Version, parse_versions};

/// The symbolic target that selects the last catalog entry.
pub const LATEST: &str = "latest";

/// Errors arising from catalog lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The source listed no recognisable versions.
    #[error("no versions found at {source_url}")]
    Empty {
        /// URL the catalog was read from.
        source_url: String,
    },

    /// The requested version is not in the catalog.
    #[error("version {version} is not available at {source_url}")]
    VersionNotFound {
        /// The requested version string.
        version: String,
        /// URL the catalog was read from.
        source_url: String,
    },
}

/// Which version the caller wants installed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionTarget {
    /// The last version in encounter order.
    #[default]
    Latest,
    /// A specific version string in canonical form.
    Exact(String),
}

impl FromStr for VersionTarget {
    type Err = std::convert::Infallible;

    /// Parse a target. `latest` (any case) selects [`VersionTarget::Latest`];
    /// anything resembling a version is normalised, so `8.5` becomes
    /// `8.5.0`; other strings are kept verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(LATEST) {
            return Ok(Self::Latest);
        }
        let exact = Version::from_user_input(trimmed)
            .map_or_else(|| trimmed.to_owned(), |version| version.to_string());
        Ok(Self::Exact(exact))
    }
}

impl fmt::Display for VersionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Exact(version) => f.write_str(version),
        }
    }
}

/// Versions available at one source, in encounter order.
///
/// # Examples
///
/// ```
/// use solr_installer::catalog::VersionCatalog;
///
/// let catalog = VersionCatalog::from_entries(
///     "https://archive.example/solr/",
///     ["../", "8.5.0/", "8.1.0/"],
/// );
/// assert_eq!(catalog.latest().expect("non-empty").to_string(), "8.1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCatalog {
    source_url: String,
    versions: Vec<Version>,
}

impl VersionCatalog {
    /// Build a catalog from already parsed versions.
    #[must_use]
    pub fn new(source_url: impl Into<String>, versions: Vec<Version>) -> Self {
        Self {
            source_url: source_url.into(),
            versions,
        }
    }

    /// Build a catalog from raw anchor texts, skipping non-version entries.
    pub fn from_entries<I, S>(source_url: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(source_url, parse_versions(entries))
    }

    /// URL the catalog was read from.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Versions in encounter order.
    #[must_use]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Number of versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether the source listed no versions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// The last version in encounter order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] when the catalog has no versions.
    pub fn latest(&self) -> Result<&Version, CatalogError> {
        self.versions.last().ok_or_else(|| CatalogError::Empty {
            source_url: self.source_url.clone(),
        })
    }

    /// Resolve a target against this catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Empty`] for `latest` on an empty catalog and
    /// [`CatalogError::VersionNotFound`] when an exact version is not listed.
    pub fn select(&self, target: &VersionTarget) -> Result<&Version, CatalogError> {
        match target {
            VersionTarget::Latest => self.latest(),
            VersionTarget::Exact(wanted) => self
                .versions
                .iter()
                .find(|version| version.to_string() == *wanted)
                .ok_or_else(|| CatalogError::VersionNotFound {
                    version: wanted.clone(),
                    source_url: self.source_url.clone(),
                }),
        }
    }
}
