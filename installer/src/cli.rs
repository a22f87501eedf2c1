//! CLI argument definitions for the Solr installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};

use crate::catalog::{LATEST, VersionTarget};
use crate::config::Overrides;

/// Download and unpack Apache Solr releases.
#[derive(Parser, Debug)]
#[command(name = "solr-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download and unpack Apache Solr releases.\n\n",
    "By default a mirror is chosen through the Apache redirector; mirrors that ",
    "list no releases are skipped. Pass --mirror false to read the canonical ",
    "archive instead.\n\n",
    "Settings are read from ~/.solr-installer.toml (or --config), then ",
    "SOLR_INSTALLER_ARCHIVE_URL and SOLR_INSTALLER_REDIRECTOR_URL, then the ",
    "command line.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  List versions on a mirror:\n",
    "    $ solr-installer list\n\n",
    "  List archived versions as JSON:\n",
    "    $ solr-installer --mirror false list --json\n\n",
    "  Install the latest release:\n",
    "    $ solr-installer install\n\n",
    "  Install a specific release into /opt/solr:\n",
    "    $ solr-installer install 8.5.1 -d /opt/solr\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file [default: ~/.solr-installer.toml if present].
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Use a mirror (true) or the canonical archive (false) [default: true].
    #[arg(short, long, global = true, value_name = "BOOL", action = ArgAction::Set)]
    pub mirror: Option<bool>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List available versions.
    List(ListArgs),

    /// Download and extract a version.
    Install(InstallArgs),
}

/// Arguments for the list command.
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the install command.
#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    /// Version to install, or `latest` for the last listed version.
    #[arg(value_name = "VERSION", default_value = LATEST)]
    pub version: VersionTarget,

    /// Extraction directory [default: solr-installation].
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<Utf8PathBuf>,
}

impl Default for InstallArgs {
    /// Creates an `InstallArgs` selecting the latest version with no
    /// destination override.
    ///
    /// # Examples
    ///
    /// ```
    /// use solr_installer::catalog::VersionTarget;
    /// use solr_installer::cli::InstallArgs;
    ///
    /// let args = InstallArgs::default();
    /// assert_eq!(args.version, VersionTarget::Latest);
    /// assert!(args.destination.is_none());
    /// ```
    fn default() -> Self {
        Self {
            version: VersionTarget::Latest,
            destination: None,
        }
    }
}

impl Cli {
    /// Settings from the command line that take precedence over every
    /// configuration layer.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let destination = match &self.command {
            Command::Install(args) => args.destination.clone().map(Utf8PathBuf::into_std_path_buf),
            Command::List(_) => None,
        };
        Overrides {
            use_mirror: self.mirror,
            destination,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
