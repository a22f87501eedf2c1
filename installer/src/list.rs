//! List command implementation.
//!
//! This module provides the `run_list` command handler, which resolves the
//! configured source and prints its versions.

use log::trace;
use std::io::Write;

use crate::cli::ListArgs;
use crate::config::InstallerConfig;
use crate::error::{InstallerError, Result};
use crate::list_output::{format_human, format_json};
use crate::listing::PageFetcher;
use crate::pipeline::list_versions;

/// Lists the versions available at the configured source.
///
/// In mirror mode a mirror is resolved first, so the listing always comes
/// from a mirror that has at least one version. In archive mode the archive
/// listing is printed as-is.
///
/// Output is written to stdout (human-readable by default, JSON with `--json`).
///
/// # Errors
///
/// Returns an error if:
/// - The source cannot be resolved or fetched
/// - Writing to stdout fails
pub fn run_list(
    args: &ListArgs,
    config: &InstallerConfig,
    fetcher: &dyn PageFetcher,
    stdout: &mut dyn Write,
) -> Result<()> {
    let source = list_versions(config, fetcher)?;
    trace!("formatting {} version(s)", source.catalog.len());

    let output = if args.json {
        format_json(&source)
    } else {
        format_human(&source)
    };

    writeln!(stdout, "{output}").map_err(|e| InstallerError::WriteFailed { source: e })?;

    Ok(())
}
