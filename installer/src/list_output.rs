//! Output formatting for version listing.
//!
//! This module provides utilities to format a resolved source's versions for
//! human-readable or JSON output.

use serde::Serialize;

use crate::pipeline::{ResolvedSource, SourceKind};

/// Format a version listing for human-readable output.
///
/// The header names the source, followed by one version per line in
/// encounter order.
///
/// # Examples
///
/// ```
/// use solr_installer::catalog::VersionCatalog;
/// use solr_installer::list_output::format_human;
/// use solr_installer::pipeline::{ResolvedSource, SourceKind};
///
/// let url = "https://mirror.example/solr/";
/// let source = ResolvedSource {
///     kind: SourceKind::Mirror,
///     base_url: url.to_owned(),
///     catalog: VersionCatalog::from_entries(url, ["8.5.0/", "8.5.1/"]),
/// };
/// assert_eq!(format_human(&source), "From mirror, https://mirror.example/solr/\n8.5.0\n8.5.1");
/// ```
#[must_use]
pub fn format_human(source: &ResolvedSource) -> String {
    let mut lines = vec![format!("From {}, {}", source.kind, source.base_url)];
    if source.catalog.is_empty() {
        lines.push("No versions found.".to_owned());
    }
    lines.extend(source.catalog.versions().iter().map(ToString::to_string));
    lines.join("\n")
}

/// Format a version listing as JSON.
///
/// # Examples
///
/// ```
/// use solr_installer::catalog::VersionCatalog;
/// use solr_installer::list_output::format_json;
/// use solr_installer::pipeline::{ResolvedSource, SourceKind};
///
/// let url = "http://archive.example/solr/";
/// let source = ResolvedSource {
///     kind: SourceKind::Archive,
///     base_url: url.to_owned(),
///     catalog: VersionCatalog::from_entries(url, ["8.5.1/"]),
/// };
/// assert!(format_json(&source).contains("\"latest\": \"8.5.1\""));
/// ```
#[must_use]
pub fn format_json(source: &ResolvedSource) -> String {
    let json_data = VersionListingJson::from_source(source);

    // Use pretty printing for readability
    serde_json::to_string_pretty(&json_data).unwrap_or_else(|_| "{}".to_owned())
}

/// JSON-serializable representation of a version listing.
#[derive(Debug, Serialize)]
pub struct VersionListingJson {
    /// Whether versions came from a mirror or the archive.
    pub source: SourceKind,
    /// Base URL of the release tree.
    pub url: String,
    /// Versions in encounter order.
    pub versions: Vec<String>,
    /// The version `latest` resolves to, if any.
    pub latest: Option<String>,
}

impl VersionListingJson {
    fn from_source(source: &ResolvedSource) -> Self {
        Self {
            source: source.kind,
            url: source.base_url.clone(),
            versions: source
                .catalog
                .versions()
                .iter()
                .map(ToString::to_string)
                .collect(),
            latest: source.catalog.latest().ok().map(ToString::to_string),
        }
    }
}
