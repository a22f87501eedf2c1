//! Error types for the Solr installer CLI.
//!
//! Each component reports its own error type with the URL, version, or path
//! involved. [`InstallerError`] gathers them at the command boundary, where
//! they are printed and mapped to an exit status.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::download::DownloadError;
use crate::extraction::ExtractionError;
use crate::listing::FetchError;
use crate::mirror::MirrorError;

/// Errors that can occur while listing or installing a release.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A listing page could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No usable mirror could be resolved.
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    /// The requested version could not be selected.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The release archive could not be downloaded.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The release archive could not be extracted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionFailure;
    use std::path::PathBuf;

    #[test]
    fn catalog_error_names_version_and_source() {
        let err = InstallerError::from(CatalogError::VersionNotFound {
            version: "9.9.9".to_owned(),
            source_url: "https://mirror.example/solr/".to_owned(),
        });
        let msg = err.to_string();
        assert!(msg.contains("9.9.9"));
        assert!(msg.contains("https://mirror.example/solr/"));
    }

    #[test]
    fn mirror_parse_error_names_redirector() {
        let err = InstallerError::from(MirrorError::Parse {
            redirector_url: "https://redirect.example/".to_owned(),
            rule: "strong".to_owned(),
        });
        assert!(err.to_string().contains("https://redirect.example/"));
    }

    #[test]
    fn extraction_error_reports_progress_and_entry() {
        let err = InstallerError::from(ExtractionError {
            extracted: vec![PathBuf::from("D/a")],
            failure: ExtractionFailure::PathTraversal {
                entry: "../escape.txt".to_owned(),
            },
        });
        let msg = err.to_string();
        assert!(msg.contains("after 1 path(s)"));
        assert!(msg.contains("../escape.txt"));
    }

    #[test]
    fn download_status_includes_code() {
        let err = InstallerError::from(DownloadError::Status {
            url: "https://mirror.example/solr/8.5.1/solr-8.5.1.zip".to_owned(),
            status: 503,
        });
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn write_failed_includes_reason() {
        let source = std::io::Error::other("broken pipe");
        let err = InstallerError::WriteFailed { source };
        let msg = err.to_string();
        assert!(msg.contains("write"));
        // Verify the source error is preserved via the Error trait
        let source_err = std::error::Error::source(&err);
        assert!(source_err.is_some());
    }
}
