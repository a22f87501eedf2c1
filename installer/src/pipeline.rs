//! Resolution, download, and extraction orchestration.
//!
//! This module coordinates the mirror resolver, listing fetcher, downloader,
//! and extractor. Every collaborator is injected so the whole flow can run
//! against stubs.

use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use crate::catalog::{VersionCatalog, VersionTarget};
use crate::config::InstallerConfig;
use crate::download::{ArtefactDownloader, ArtefactName, DownloadError, DownloadResult};
use crate::error::Result;
use crate::extraction::ArchiveExtractor;
use crate::listing::{PageFetcher, fetch_anchor_texts};
use crate::mirror::MirrorResolver;
use crate::output::write_stderr_line;
use crate::version::Version;

/// Where a catalog was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A mirror nominated by the redirector.
    Mirror,
    /// The canonical archive.
    Archive,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mirror => "mirror",
            Self::Archive => "archive",
        })
    }
}

/// A release tree and the versions it lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Mirror or archive.
    pub kind: SourceKind,
    /// Base URL downloads are resolved against.
    pub base_url: String,
    /// Versions listed at `base_url`.
    pub catalog: VersionCatalog,
}

/// Outcome of a completed installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// The version that was installed.
    pub version: Version,
    /// Where the archive landed.
    pub download: DownloadResult,
    /// Every path written during extraction, in archive order.
    pub extracted: Vec<PathBuf>,
}

/// Collaborators and settings for an installation.
pub struct InstallContext<'a> {
    /// Assembled configuration.
    pub config: &'a InstallerConfig,
    /// Listing page fetcher.
    pub fetcher: &'a dyn PageFetcher,
    /// Archive downloader.
    pub downloader: &'a dyn ArtefactDownloader,
    /// Archive extractor.
    pub extractor: &'a dyn ArchiveExtractor,
    /// Suppress progress output.
    pub quiet: bool,
}

/// Choose the release tree: a resolved mirror, or the canonical archive when
/// mirror mode is disabled.
///
/// A mirror source always has at least one version. The archive catalog may
/// be empty.
///
/// # Errors
///
/// Returns mirror resolution or listing fetch failures.
pub fn resolve_source(
    config: &InstallerConfig,
    fetcher: &dyn PageFetcher,
) -> Result<ResolvedSource> {
    if config.use_mirror {
        let mirror = MirrorResolver::new(
            fetcher,
            &config.redirector_url,
            &config.selectors.mirror_link,
            &config.selectors.mirror_listing,
        )
        .with_max_attempts(config.network.max_mirror_attempts)
        .resolve()?;
        return Ok(ResolvedSource {
            kind: SourceKind::Mirror,
            base_url: mirror.base_url,
            catalog: mirror.catalog,
        });
    }

    let anchors = fetch_anchor_texts(
        fetcher,
        &config.archive_url,
        &config.selectors.archive_listing,
    )?;
    let catalog = VersionCatalog::from_entries(config.archive_url.as_str(), anchors);
    debug!(
        "archive {} lists {} version(s)",
        config.archive_url,
        catalog.len()
    );
    Ok(ResolvedSource {
        kind: SourceKind::Archive,
        base_url: config.archive_url.clone(),
        catalog,
    })
}

/// Resolve the configured source for display.
///
/// # Errors
///
/// See [`resolve_source`].
pub fn list_versions(
    config: &InstallerConfig,
    fetcher: &dyn PageFetcher,
) -> Result<ResolvedSource> {
    let source = resolve_source(config, fetcher)?;
    info!(
        "{} {} lists {} version(s)",
        source.kind,
        source.base_url,
        source.catalog.len()
    );
    Ok(source)
}

/// Resolve a source, select `target`, download its archive into the
/// download directory, and extract it into the destination.
///
/// Prints progress to stderr if not in quiet mode.
///
/// # Errors
///
/// Returns the first failure from resolution, selection, download, or
/// extraction. Extraction failures carry the paths already written.
pub fn install(
    context: &InstallContext<'_>,
    target: &VersionTarget,
    stderr: &mut dyn Write,
) -> Result<InstallReport> {
    let config = context.config;
    let source = resolve_source(config, context.fetcher)?;
    let version = source.catalog.select(target)?.clone();

    let artefact = ArtefactName::new(&config.product, &version);
    let url = artefact.url_under(&source.base_url)?;
    std::fs::create_dir_all(&config.download_dir).map_err(|source| {
        DownloadError::CreateFile {
            path: config.download_dir.clone(),
            source,
        }
    })?;
    let archive_path = config.download_dir.join(artefact.filename());

    if !context.quiet {
        write_stderr_line(stderr, format!("Downloading {url}"));
    }
    let download = context.downloader.download(url.as_str(), &archive_path)?;
    if !context.quiet {
        write_stderr_line(stderr, format!("{} bytes downloaded", download.bytes));
        write_stderr_line(
            stderr,
            format!(
                "Extracting {} to {}",
                artefact,
                config.destination.display()
            ),
        );
    }

    let extracted = context
        .extractor
        .extract(&download.path, &config.destination)?;

    Ok(InstallReport {
        version,
        download,
        extracted,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
