//! Artefact naming and download.
//!
//! Release archives live at `<base>/<version>/<product>-<version>.zip` on both
//! the mirrors and the canonical archive. [`HttpDownloader`] streams such an
//! archive into a temporary file next to the destination and renames it into
//! place only once the whole body has arrived. A failed or short transfer
//! leaves any earlier download untouched.

use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use url::Url;

use crate::listing::http_agent;
use crate::version::Version;

/// The fixed file extension for release archives.
const ARTEFACT_EXTENSION: &str = ".zip";

/// Errors arising from artefact downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The base URL cannot carry a path.
    #[error("invalid download URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested artefact was not found (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The server answered with a non-success status.
    #[error("download failed for {url}: HTTP status {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The local file could not be created.
    #[error("cannot create {path}: {source}")]
    CreateFile {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Copying the response body to disk failed.
    #[error("transfer from {url} failed: {source}")]
    Transfer {
        /// The URL being downloaded.
        url: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The body ended before the declared length.
    #[error("truncated download from {url}: expected {expected} bytes, received {actual}")]
    Truncated {
        /// The URL being downloaded.
        url: String,
        /// Declared `Content-Length`.
        expected: u64,
        /// Bytes actually written.
        actual: u64,
    },
}

/// Where a download landed and how large it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Local file the body was written to.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
}

/// A release archive name such as `solr-8.5.1.zip`.
///
/// # Examples
///
/// ```
/// use solr_installer::download::ArtefactName;
/// use solr_installer::version::Version;
///
/// let version = Version::from_user_input("8.5.1").expect("version");
/// let name = ArtefactName::new("solr", &version);
/// assert_eq!(name.filename(), "solr-8.5.1.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactName {
    product: String,
    version: String,
}

impl ArtefactName {
    /// Name the archive of `product` at `version`.
    #[must_use]
    pub fn new(product: &str, version: &Version) -> Self {
        Self {
            product: product.to_owned(),
            version: version.to_string(),
        }
    }

    /// Return the filename as a string without consuming the value.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }

    /// Build the download URL below `base_url`: `<base>/<version>/<filename>`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `base_url` is not an absolute
    /// URL with a path.
    pub fn url_under(&self, base_url: &str) -> Result<Url, DownloadError> {
        let invalid = |reason: String| DownloadError::InvalidUrl {
            url: base_url.to_owned(),
            reason,
        };
        let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("URL cannot have a path".to_owned()))?
            .pop_if_empty()
            .push(&self.version)
            .push(&self.filename());
        Ok(url)
    }
}

impl fmt::Display for ArtefactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}{ARTEFACT_EXTENSION}",
            self.product, self.version
        )
    }
}

/// Trait for downloading artefacts, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download `url` into `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// the file cannot be written, or the body is shorter than declared.
    /// `dest` is left as it was when any of these happen.
    fn download(&self, url: &str, dest: &Path) -> Result<DownloadResult, DownloadError>;
}

/// HTTP-based downloader using `ureq`.
///
/// Only the connection phase is timed out; release archives are large and
/// a whole-request limit would cut off slow mirrors.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    /// Create a downloader with the given connect timeout.
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self::with_agent(http_agent(connect_timeout, None))
    }

    /// Create a downloader around a preconfigured agent.
    #[must_use]
    pub const fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<DownloadResult, DownloadError> {
        info!("downloading {url}");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let expected = response.body().content_length();
        let mut body = response.into_body();

        let create_failed = |source: std::io::Error| DownloadError::CreateFile {
            path: dest.to_path_buf(),
            source,
        };
        let mut staged = NamedTempFile::new_in(staging_dir(dest)).map_err(create_failed)?;
        let copied = std::io::copy(&mut body.as_reader(), staged.as_file_mut());
        let bytes = match copied {
            Ok(bytes) => bytes,
            Err(source) => return Err(transfer_error(url, expected, &staged, source)),
        };

        staged
            .persist(dest)
            .map_err(|err| create_failed(err.error))?;
        debug!("wrote {bytes} bytes to {}", dest.display());
        Ok(DownloadResult {
            path: dest.to_path_buf(),
            bytes,
        })
    }
}

/// Directory that receives the staged body; it must share a filesystem with
/// `dest` for the final rename.
fn staging_dir(dest: &Path) -> &Path {
    dest.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Classify a failed body copy. A connection that closes before the declared
/// length is reported as [`DownloadError::Truncated`].
fn transfer_error(
    url: &str,
    expected: Option<u64>,
    staged: &NamedTempFile,
    source: std::io::Error,
) -> DownloadError {
    let actual = staged.as_file().metadata().map_or(0, |meta| meta.len());
    match expected {
        Some(expected) if actual < expected => DownloadError::Truncated {
            url: url.to_owned(),
            expected,
            actual,
        },
        _ => DownloadError::Transfer {
            url: url.to_owned(),
            source,
        },
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        ureq::Error::StatusCode(status) => DownloadError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => DownloadError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
