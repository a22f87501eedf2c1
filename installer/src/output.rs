//! Output formatting for the installer CLI.
//!
//! Progress and summaries go to stderr so that `list` output on stdout stays
//! clean for scripting.

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use crate::pipeline::InstallReport;

/// Write one line to `stderr`, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a success message after installation.
///
/// # Example
///
/// ```
/// use solr_installer::download::DownloadResult;
/// use solr_installer::output::success_message;
/// use solr_installer::pipeline::InstallReport;
/// use solr_installer::version::Version;
/// use std::path::{Path, PathBuf};
///
/// let report = InstallReport {
///     version: Version::from_user_input("8.5.1").expect("version"),
///     download: DownloadResult { path: PathBuf::from("solr-8.5.1.zip"), bytes: 10 },
///     extracted: vec![PathBuf::from("solr-installation/solr-8.5.1")],
/// };
/// let msg = success_message("solr", &report, Path::new("solr-installation"));
/// assert_eq!(msg, "Installed solr 8.5.1 (1 path) into solr-installation");
/// ```
#[must_use]
pub fn success_message(product: &str, report: &InstallReport, destination: &Path) -> String {
    let count = report.extracted.len();
    let plural = if count == 1 { "path" } else { "paths" };
    format!(
        "Installed {product} {} ({count} {plural}) into {}",
        report.version,
        destination.display()
    )
}
