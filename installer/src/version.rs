//! Version identifiers recognised in directory listings.
//!
//! Release directories on the Apache mirrors and archive are listed as
//! anchors such as `8.5.1/` or `9.0.0-beta/`. This module turns that raw
//! anchor text into a canonical `MAJOR.MINOR.PATCH[SUFFIX]` string, filling
//! in missing minor and patch components with `0`. Anchors that do not look
//! like a release directory (`../`, `KEYS`, `README.txt`) are skipped.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Major component required, minor, patch, and suffix optional, trailing `/`
/// required.
const VERSION_DIRECTORY_PATTERN: &str = r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(.*)/$";

/// Component used when the listing omits a minor or patch number.
const DEFAULT_COMPONENT: &str = "0";

/// A release version normalised from a listing entry.
///
/// The suffix is opaque: pre-release tags such as `-rc1` or `-beta` are kept
/// verbatim and never interpreted.
///
/// # Examples
///
/// ```
/// use solr_installer::version::Version;
///
/// let version = Version::from_listing_entry("8.5/").expect("version directory");
/// assert_eq!(version.to_string(), "8.5.0");
/// assert!(Version::from_listing_entry("../").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    major: String,
    minor: String,
    patch: String,
    suffix: String,
}

impl Version {
    /// Recognise a version directory in raw anchor text.
    ///
    /// Returns `None` when the text is not a version directory; this is the
    /// normal outcome for navigation links and files.
    #[must_use]
    pub fn from_listing_entry(raw: &str) -> Option<Self> {
        let captures = version_pattern()?.captures(raw)?;
        let component = |index: usize| {
            captures
                .get(index)
                .map_or(DEFAULT_COMPONENT, |m| m.as_str())
                .to_owned()
        };
        let major = captures.get(1)?.as_str().to_owned();

        Some(Self {
            major,
            minor: component(2),
            patch: component(3),
            suffix: captures
                .get(4)
                .map(|m| m.as_str().to_owned())
                .unwrap_or_default(),
        })
    }

    /// Normalise a user-supplied version string such as `8.5` or `9`.
    ///
    /// Uses the same rules as listing entries, so `8.5` becomes `8.5.0`.
    #[must_use]
    pub fn from_user_input(input: &str) -> Option<Self> {
        Self::from_listing_entry(&format!("{}/", input.trim()))
    }

    /// The major component.
    #[must_use]
    pub fn major(&self) -> &str {
        &self.major
    }

    /// The minor component, `0` when the listing omitted it.
    #[must_use]
    pub fn minor(&self) -> &str {
        &self.minor
    }

    /// The patch component, `0` when the listing omitted it.
    #[must_use]
    pub fn patch(&self) -> &str {
        &self.patch
    }

    /// The opaque suffix, empty when absent.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}{}",
            self.major, self.minor, self.patch, self.suffix
        )
    }
}

/// Parse every recognisable version from raw anchor texts, keeping their
/// encounter order.
pub fn parse_versions<I, S>(entries: I) -> Vec<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| Version::from_listing_entry(entry.as_ref()))
        .collect()
}

fn version_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(VERSION_DIRECTORY_PATTERN).ok())
        .as_ref()
}
