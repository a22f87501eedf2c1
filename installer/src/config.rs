//! Installer configuration.
//!
//! Settings are layered, lowest precedence first: built-in defaults, a TOML
//! file, environment variables, then command-line overrides. The assembled
//! [`InstallerConfig`] is validated once and passed by reference to every
//! operation; nothing reads global state after that point.
//!
//! A configuration file looks like this (every key is optional):
//!
//! ```toml
//! product = "solr"
//! archive_url = "http://archive.apache.org/dist/lucene/solr/"
//! use_mirror = false
//! destination = "/opt/solr"
//!
//! [selectors]
//! archive_listing = "body > pre:nth-child(4) > a"
//!
//! [network]
//! connect_timeout_secs = 10
//! max_mirror_attempts = 5
//! ```

use log::debug;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dirs::BaseDirs;
use crate::listing::{FetchError, FetchTimeouts, SelectionRule, validate_url};

/// Name of the optional configuration file in the home directory.
pub const CONFIG_FILE_NAME: &str = ".solr-installer.toml";

/// Environment variable overriding the canonical archive URL.
pub const ARCHIVE_URL_ENV: &str = "SOLR_INSTALLER_ARCHIVE_URL";

/// Environment variable overriding the mirror redirector URL.
pub const REDIRECTOR_URL_ENV: &str = "SOLR_INSTALLER_REDIRECTOR_URL";

const DEFAULT_PRODUCT: &str = "solr";
const DEFAULT_ARCHIVE_URL: &str = "http://archive.apache.org/dist/lucene/solr/";
const DEFAULT_REDIRECTOR_URL: &str = "https://www.apache.org/dyn/closer.lua/lucene/solr/";
const DEFAULT_DESTINATION: &str = "solr-installation";
const DEFAULT_DOWNLOAD_DIR: &str = ".";
const DEFAULT_MIRROR_LINK: &str = "body > div:nth-child(3) > p:nth-child(3) > a > strong";
const DEFAULT_MIRROR_LISTING: &str = "body > pre:nth-child(2) > a";
const DEFAULT_ARCHIVE_LISTING: &str = "body > pre:nth-child(4) > a";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LISTING_TIMEOUT_SECS: u64 = 60;

/// Errors arising while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A setting holds an unusable value.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A selector setting is not a valid CSS selector.
    #[error("invalid selector for {key}: {source}")]
    Selector {
        /// The offending key.
        key: &'static str,
        /// The parse failure.
        #[source]
        source: FetchError,
    },
}

/// On-disk configuration. Every key is optional; absent keys fall back to the
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Product name used in archive filenames.
    pub product: Option<String>,
    /// Canonical archive listing URL.
    pub archive_url: Option<String>,
    /// Mirror redirector URL.
    pub redirector_url: Option<String>,
    /// Whether to install from a mirror.
    pub use_mirror: Option<bool>,
    /// Extraction root.
    pub destination: Option<PathBuf>,
    /// Directory the archive is downloaded into.
    pub download_dir: Option<PathBuf>,
    /// Selection rule overrides.
    #[serde(default)]
    pub selectors: SelectorsFile,
    /// Network overrides.
    #[serde(default)]
    pub network: NetworkFile,
}

/// The `[selectors]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorsFile {
    /// Element holding the suggested mirror URL on the redirector page.
    pub mirror_link: Option<String>,
    /// Version anchors on a mirror listing.
    pub mirror_listing: Option<String>,
    /// Version anchors on the archive listing.
    pub archive_listing: Option<String>,
}

/// The `[network]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkFile {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout for listing pages in seconds.
    pub listing_timeout_secs: Option<u64>,
    /// Upper bound on redirector suggestions.
    pub max_mirror_attempts: Option<u32>,
}

/// Settings supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--mirror <bool>`.
    pub use_mirror: Option<bool>,
    /// `--destination <DIR>`.
    pub destination: Option<PathBuf>,
}

/// Compiled selection rules.
#[derive(Debug, Clone)]
pub struct Selectors {
    /// Element holding the suggested mirror URL on the redirector page.
    pub mirror_link: SelectionRule,
    /// Version anchors on a mirror listing.
    pub mirror_listing: SelectionRule,
    /// Version anchors on the archive listing.
    pub archive_listing: SelectionRule,
}

/// Validated network settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSettings {
    /// Connect and listing timeouts.
    pub timeouts: FetchTimeouts,
    /// Upper bound on redirector suggestions; `None` is unbounded.
    pub max_mirror_attempts: Option<NonZeroU32>,
}

/// Fully assembled, validated configuration.
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Product name used in archive filenames.
    pub product: String,
    /// Canonical archive listing URL.
    pub archive_url: String,
    /// Mirror redirector URL.
    pub redirector_url: String,
    /// Whether to install from a mirror.
    pub use_mirror: bool,
    /// Extraction root.
    pub destination: PathBuf,
    /// Directory the archive is downloaded into.
    pub download_dir: PathBuf,
    /// Compiled selection rules.
    pub selectors: Selectors,
    /// Timeouts and retry bound.
    pub network: NetworkSettings,
}

impl InstallerConfig {
    /// Built-in defaults with no file, environment, or overrides applied.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches [`Self::assemble`].
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::assemble(ConfigFile::default(), |_| None, &Overrides::default())
    }

    /// Layer `file`, the environment as seen through `env`, and `overrides`
    /// over the built-in defaults, then validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for empty products, relative URLs, or
    /// zero-valued limits, and [`ConfigError::Selector`] for bad selectors.
    pub fn assemble(
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let product = file.product.unwrap_or_else(|| DEFAULT_PRODUCT.to_owned());
        if product.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "product",
                reason: "must not be empty".to_owned(),
            });
        }

        let archive_url = env(ARCHIVE_URL_ENV)
            .or(file.archive_url)
            .unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_owned());
        check_url("archive_url", &archive_url)?;
        let redirector_url = env(REDIRECTOR_URL_ENV)
            .or(file.redirector_url)
            .unwrap_or_else(|| DEFAULT_REDIRECTOR_URL.to_owned());
        check_url("redirector_url", &redirector_url)?;

        let use_mirror = overrides.use_mirror.or(file.use_mirror).unwrap_or(true);
        let destination = overrides
            .destination
            .clone()
            .or(file.destination)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION));
        let download_dir = file
            .download_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

        Ok(Self {
            product,
            archive_url,
            redirector_url,
            use_mirror,
            destination,
            download_dir,
            selectors: compile_selectors(&file.selectors)?,
            network: network_settings(&file.network)?,
        })
    }
}

/// Read and parse a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read and
/// [`ConfigError::Parse`] if it is malformed or has unknown keys.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Locate and read the configuration file.
///
/// An explicit path must exist. Without one, `~/.solr-installer.toml` is read
/// when present and defaults are used otherwise.
///
/// # Errors
///
/// Propagates errors from [`read_config_file`].
pub fn find_config_file(
    explicit: Option<&Path>,
    dirs: &dyn BaseDirs,
) -> Result<ConfigFile, ConfigError> {
    if let Some(path) = explicit {
        debug!("reading config from {}", path.display());
        return read_config_file(path);
    }

    let Some(path) = dirs.home_dir().map(|home| home.join(CONFIG_FILE_NAME)) else {
        return Ok(ConfigFile::default());
    };
    if path.is_file() {
        debug!("reading config from {}", path.display());
        read_config_file(&path)
    } else {
        Ok(ConfigFile::default())
    }
}

/// Assemble configuration from every layer.
///
/// # Errors
///
/// Returns any [`ConfigError`] from reading or validation.
pub fn load(
    explicit: Option<&Path>,
    dirs: &dyn BaseDirs,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides,
) -> Result<InstallerConfig, ConfigError> {
    let file = find_config_file(explicit, dirs)?;
    InstallerConfig::assemble(file, env, overrides)
}

/// Environment lookup backed by the process environment.
#[must_use]
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn check_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    validate_url(value).map(drop).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn compile_selectors(file: &SelectorsFile) -> Result<Selectors, ConfigError> {
    let compile = |key: &'static str, value: Option<&String>, default: &str| {
        SelectionRule::parse(value.map_or(default, String::as_str))
            .map_err(|source| ConfigError::Selector { key, source })
    };
    Ok(Selectors {
        mirror_link: compile(
            "selectors.mirror_link",
            file.mirror_link.as_ref(),
            DEFAULT_MIRROR_LINK,
        )?,
        mirror_listing: compile(
            "selectors.mirror_listing",
            file.mirror_listing.as_ref(),
            DEFAULT_MIRROR_LISTING,
        )?,
        archive_listing: compile(
            "selectors.archive_listing",
            file.archive_listing.as_ref(),
            DEFAULT_ARCHIVE_LISTING,
        )?,
    })
}

fn network_settings(file: &NetworkFile) -> Result<NetworkSettings, ConfigError> {
    let seconds = |key: &'static str, value: Option<u64>, default: u64| {
        match value.unwrap_or(default) {
            0 => Err(ConfigError::Invalid {
                key,
                reason: "must be at least 1 second".to_owned(),
            }),
            secs => Ok(Duration::from_secs(secs)),
        }
    };
    let max_mirror_attempts = match file.max_mirror_attempts {
        None => None,
        Some(raw) => Some(NonZeroU32::new(raw).ok_or_else(|| ConfigError::Invalid {
            key: "network.max_mirror_attempts",
            reason: "must be at least 1".to_owned(),
        })?),
    };

    Ok(NetworkSettings {
        timeouts: FetchTimeouts {
            connect: seconds(
                "network.connect_timeout_secs",
                file.connect_timeout_secs,
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?,
            listing: seconds(
                "network.listing_timeout_secs",
                file.listing_timeout_secs,
                DEFAULT_LISTING_TIMEOUT_SECS,
            )?,
        },
        max_mirror_attempts,
    })
}
